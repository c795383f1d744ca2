use mystery_core::binding::{PokemonBinding, PrimaryPick, pokemon_meets_requirements};
use mystery_core::content::{ReferenceBattleEngine, default_catalog};
use mystery_core::requirements::{PokemonCriterion, PokemonPredicate, PokemonRequirement};
use mystery_core::seed::{SeededRng, wave_seed_offset};
use mystery_core::{
    AdvanceStopReason, BattleOutcome, Choice, Collaborators, EncounterSession, Interrupt,
    PartyMember, RunState, ScriptedUi, replay_session,
};
use proptest::{
    arbitrary::any,
    test_runner::{Config as ProptestConfig, TestCaseError, TestRunner},
};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};

const SPECIES: [&str; 6] = ["ABRA", "EEVEE", "MACHOP", "ZUBAT", "PIKACHU", "GEODUDE"];

fn choose<T: Clone>(rng: &mut ChaCha8Rng, slice: &[T]) -> T {
    let p = rng.next_u64() as usize % slice.len();
    slice[p].clone()
}

fn below(rng: &mut ChaCha8Rng, bound: u64) -> u64 {
    rng.next_u64() % bound
}

fn random_party_run(run_seed: u64, rng: &mut ChaCha8Rng) -> RunState {
    let wave = 10 + below(rng, 171) as u32;
    let mut run = RunState::new(run_seed, wave);
    run.money = below(rng, 3 * run.wave_money_amount(2.0) + 1);
    let size = 1 + below(rng, 6) as usize;
    for _ in 0..size {
        let mut member = PartyMember::new(choose(rng, &SPECIES), 5 + below(rng, 96) as u32);
        member.friendship = below(rng, 256) as u32;
        if below(rng, 5) == 0 {
            member.hp = 0;
        }
        run.party.add(member);
    }
    run
}

fn random_answers(rng: &mut ChaCha8Rng) -> Vec<Option<usize>> {
    (0..8).map(|_| if below(rng, 4) == 0 { None } else { Some(below(rng, 7) as usize) }).collect()
}

/// Plays every encounter the run qualifies for with random choices, then
/// replays each journal and compares hashes.
fn run_fuzz_session(run_seed: u64, choice_seed: u64, max_stops: u32) -> Result<(), String> {
    let catalog = default_catalog().map_err(|e| e.to_string())?;
    let mut rng = ChaCha8Rng::seed_from_u64(choice_seed);
    let run = random_party_run(run_seed, &mut rng);

    for mut encounter in catalog.eligible(&run) {
        if !encounter.meets_requirements(&run) {
            return Err(format!("eligible encounter failed requirements on run_seed {run_seed}"));
        }
        let encounter_type = encounter.encounter_type().clone();
        let ui = ScriptedUi::new(random_answers(&mut rng), random_answers(&mut rng));
        let collaborators = Collaborators::headless(Box::new(ReferenceBattleEngine::new()), Box::new(ui));
        let mut session = EncounterSession::new(run.clone(), encounter, collaborators);

        let mut finished = None;
        for _ in 0..max_stops {
            match session.advance().map_err(|e| format!("{encounter_type}: {e}"))? {
                AdvanceStopReason::Finished(outcome) => {
                    finished = Some(outcome);
                    break;
                }
                AdvanceStopReason::Interrupted(Interrupt::OptionSelect { prompt_id, options }) => {
                    let selectable: Vec<usize> =
                        options.iter().filter(|view| view.selectable).map(|view| view.index).collect();
                    if selectable.is_empty() {
                        return Err(format!("{encounter_type}: no selectable option on run_seed {run_seed}"));
                    }
                    let index = choose(&mut rng, &selectable);
                    session
                        .apply_choice(prompt_id, Choice::SelectOption(index))
                        .map_err(|e| format!("{encounter_type}: {e}"))?;
                }
                AdvanceStopReason::BattleStarted => {
                    let outcome = choose(&mut rng, &[BattleOutcome::Victory, BattleOutcome::Defeat]);
                    session.report_battle_outcome(outcome).map_err(|e| format!("{encounter_type}: {e}"))?;
                }
            }
        }
        let Some(outcome) = finished else {
            return Err(format!("{encounter_type}: did not finish within {max_stops} stops"));
        };

        let party = session.run().party.members();
        if party.iter().any(|member| member.hp > member.max_hp) {
            return Err(format!("{encounter_type}: hp above max_hp on run_seed {run_seed}"));
        }

        let replayed = replay_session(
            session.journal(),
            |encounter_type| catalog.build(encounter_type),
            Box::new(ReferenceBattleEngine::new()),
        )
        .map_err(|e| format!("{encounter_type}: replay failed: {e}"))?;
        if replayed.final_outcome != outcome || replayed.final_snapshot_hash != session.snapshot_hash() {
            return Err(format!("{encounter_type}: replay diverged on run_seed {run_seed}"));
        }
    }
    Ok(())
}

#[test]
fn test_fuzz_encounter_sessions() {
    let mut runner = TestRunner::new(ProptestConfig::with_cases(48));
    let seeds = (any::<u64>(), any::<u64>());

    runner
        .run(&seeds, |(run_seed, choice_seed)| {
            run_fuzz_session(run_seed, choice_seed, 64).map_err(TestCaseError::fail)?;
            Ok(())
        })
        .expect("random sessions should finish and replay identically");
}

#[test]
fn test_fuzz_inverted_query_is_complement() {
    let mut runner = TestRunner::new(ProptestConfig::with_cases(64));
    let inputs = (any::<u64>(), any::<u32>(), any::<u32>());

    runner
        .run(&inputs, |(seed, a, b)| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let run = random_party_run(seed, &mut rng);
            let party = run.party.members();
            let (low, high) = (1 + a % 100, 1 + b % 100);
            let range = low.min(high)..=low.max(high);

            let plain = PokemonPredicate::new(PokemonCriterion::Level(range.clone()))
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let inverted = PokemonRequirement::from(plain.clone().inverted());
            let plain = PokemonRequirement::from(plain);

            let matched = plain.query_party(&party);
            let unmatched = inverted.query_party(&party);
            if matched.len() + unmatched.len() != party.len()
                || matched.iter().any(|id| unmatched.contains(id))
            {
                return Err(TestCaseError::fail(format!("{range:?} did not partition the party")));
            }
            for member in &party {
                if range.contains(&member.level) != matched.contains(&member.id) {
                    return Err(TestCaseError::fail(format!("{} misclassified", member.name)));
                }
            }
            Ok(())
        })
        .expect("inverted predicates should query the complement");
}

fn random_requirement(rng: &mut ChaCha8Rng) -> Result<PokemonRequirement, TestCaseError> {
    let low = below(rng, 100) as u32;
    let criterion = match below(rng, 3) {
        0 => PokemonCriterion::Level(low + 1..=100),
        1 => PokemonCriterion::Friendship(low * 2..=255),
        _ => PokemonCriterion::Species(vec![choose(rng, &SPECIES).into(), choose(rng, &SPECIES).into()]),
    };
    let mut predicate = PokemonPredicate::new(criterion).map_err(|e| TestCaseError::fail(e.to_string()))?;
    if below(rng, 4) == 0 {
        predicate = predicate.inverted();
    }
    Ok(predicate.into())
}

#[test]
fn test_fuzz_composites_follow_their_parts() {
    let mut runner = TestRunner::new(ProptestConfig::with_cases(96));

    runner
        .run(&any::<u64>(), |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let run = random_party_run(seed, &mut rng);
            let count = below(&mut rng, 4) as usize;
            let subs = (0..count).map(|_| random_requirement(&mut rng)).collect::<Result<Vec<_>, _>>()?;
            let met: Vec<bool> = subs.iter().map(|sub| sub.meets_requirement(&run)).collect();

            let some = PokemonRequirement::Some(subs.clone());
            let every = PokemonRequirement::Every(subs.clone());
            if some.meets_requirement(&run) != met.iter().any(|m| *m) {
                return Err(TestCaseError::fail(format!("Some is not the OR of {count} parts")));
            }
            if every.meets_requirement(&run) != met.iter().all(|m| *m) {
                return Err(TestCaseError::fail(format!("Every is not the AND of {count} parts")));
            }

            let party = run.party.members();
            let both = every.query_party(&party);
            for sub in &subs {
                let matched = sub.query_party(&party);
                if both.iter().any(|id| !matched.contains(id)) {
                    return Err(TestCaseError::fail("Every query kept a member a part rejected"));
                }
            }
            if every.dialogue_token(&run, party.first().copied()).is_some() {
                return Err(TestCaseError::fail("Every reported a dialogue token"));
            }
            Ok(())
        })
        .expect("composite requirements should combine their parts");
}

#[test]
fn test_fuzz_binding_keeps_primary_out_of_secondary() {
    let mut runner = TestRunner::new(ProptestConfig::with_cases(96));

    runner
        .run(&any::<u64>(), |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let run = random_party_run(seed, &mut rng);
            let primary_reqs = vec![random_requirement(&mut rng)?];
            let secondary_reqs = vec![random_requirement(&mut rng)?];
            let mut draws = SeededRng::for_offset(run.seed, wave_seed_offset(run.wave_index));

            let mut binding = PokemonBinding::default();
            if !binding.bind_secondary(&run, &secondary_reqs) {
                if !binding.secondary.is_empty() {
                    return Err(TestCaseError::fail("failed secondary binding kept members"));
                }
                return Ok(());
            }
            for id in &binding.secondary {
                if !pokemon_meets_requirements(&run, &secondary_reqs, *id) {
                    return Err(TestCaseError::fail("secondary member does not qualify"));
                }
            }
            if binding.bind_primary(&run, &primary_reqs, true, PrimaryPick::FirstQualified, &mut draws) {
                let Some(primary) = binding.primary else {
                    return Err(TestCaseError::fail("successful binding without a primary"));
                };
                if binding.secondary.contains(&primary) {
                    return Err(TestCaseError::fail("primary is also bound as secondary"));
                }
                if !pokemon_meets_requirements(&run, &primary_reqs, primary) {
                    return Err(TestCaseError::fail("primary does not qualify"));
                }
            } else if binding.primary.is_some() {
                return Err(TestCaseError::fail("failed binding kept a primary"));
            }
            Ok(())
        })
        .expect("binding should keep the primary out of the secondary pool");
}
