use std::collections::VecDeque;

use super::*;
use crate::catalog::EncounterCatalog;
use crate::content::{ReferenceBattleEngine, default_catalog, keys};
use crate::state::{PartyMember, RunState};
use crate::types::{BattleOutcome, Choice, ChoicePromptId, EncounterType, Interrupt, StatusEffect};

const MAX_TEST_RUN_LOOP_COUNT: usize = 64;

struct Recorded {
    outcome: EncounterOutcome,
    snapshot_hash: u64,
    journal: InputJournal,
}

fn run_with_party(seed: u64, wave: u32) -> RunState {
    let mut run = RunState::new(seed, wave);
    run.money = run.wave_money_amount(2.0);
    run.party.add(PartyMember::new("ABRA", 12));
    run.party.add(PartyMember::new("EEVEE", 14));
    run
}

fn ui(options: &[Option<usize>], party_slots: &[Option<usize>]) -> ScriptedUi {
    ScriptedUi::new(options.iter().copied(), party_slots.iter().copied())
}

fn record(
    catalog: &EncounterCatalog,
    encounter_type: &str,
    run: RunState,
    ui: ScriptedUi,
    choices: &[usize],
    battles: &[BattleOutcome],
) -> Recorded {
    record_with(catalog, encounter_type, run, ui, choices, battles, |_, _| {})
}

/// Plays a session live, answering prompts from `choices` and battles from
/// `battles` in order. `aftermath` edits the party the way the battle left
/// it before each outcome is reported.
fn record_with(
    catalog: &EncounterCatalog,
    encounter_type: &str,
    run: RunState,
    ui: ScriptedUi,
    choices: &[usize],
    battles: &[BattleOutcome],
    mut aftermath: impl FnMut(&mut RunState, BattleOutcome),
) -> Recorded {
    let encounter = catalog.build(&EncounterType::from(encounter_type)).expect("registered encounter");
    let collaborators =
        Collaborators::headless(Box::new(ReferenceBattleEngine::new()), Box::new(ui));
    let mut session = EncounterSession::new(run, encounter, collaborators);
    let mut choices: VecDeque<usize> = choices.iter().copied().collect();
    let mut battles: VecDeque<BattleOutcome> = battles.iter().copied().collect();

    for _ in 0..MAX_TEST_RUN_LOOP_COUNT {
        match session.advance().expect("advance") {
            AdvanceStopReason::Finished(outcome) => {
                return Recorded {
                    outcome,
                    snapshot_hash: session.snapshot_hash(),
                    journal: session.journal().clone(),
                };
            }
            AdvanceStopReason::Interrupted(Interrupt::OptionSelect { prompt_id, .. }) => {
                let index = choices.pop_front().expect("scripted choice");
                session.apply_choice(prompt_id, Choice::SelectOption(index)).expect("choice accepted");
            }
            AdvanceStopReason::BattleStarted => {
                let outcome = battles.pop_front().expect("scripted battle outcome");
                aftermath(session.run_mut(), outcome);
                session.report_battle_outcome(outcome).expect("outcome accepted");
            }
        }
    }
    panic!("session did not finish within {MAX_TEST_RUN_LOOP_COUNT} stops");
}

fn replay(catalog: &EncounterCatalog, journal: &InputJournal) -> Result<ReplayResult, ReplayError> {
    replay_session(
        journal,
        |encounter_type| catalog.build(encounter_type),
        Box::new(ReferenceBattleEngine::new()),
    )
}

#[test]
fn replay_reproduces_battle_session() {
    let catalog = default_catalog().expect("reference catalog");
    let recorded = record(
        &catalog,
        keys::TRAINING_DOJO,
        run_with_party(777, 25),
        ScriptedUi::default(),
        &[0],
        &[BattleOutcome::Victory],
    );
    assert_eq!(recorded.outcome, EncounterOutcome::Completed);

    let result = replay(&catalog, &recorded.journal).expect("replay succeeds");
    assert_eq!(result.final_outcome, recorded.outcome);
    assert_eq!(result.final_snapshot_hash, recorded.snapshot_hash);
    assert_eq!(result.inputs_consumed, 2);
}

#[test]
fn replay_feeds_recorded_ui_answers_back() {
    let catalog = default_catalog().expect("reference catalog");
    let recorded = record(
        &catalog,
        keys::SHADY_MERCHANT,
        run_with_party(31, 30),
        ui(&[], &[None, Some(1)]),
        &[0, 0],
        &[],
    );
    assert_eq!(recorded.outcome, EncounterOutcome::Completed);
    assert_eq!(recorded.journal.inputs.len(), 4);

    let result = replay(&catalog, &recorded.journal).expect("replay succeeds");
    assert_eq!(result.final_snapshot_hash, recorded.snapshot_hash);
    assert_eq!(result.inputs_consumed, 2);
}

#[test]
fn replay_covers_continuous_encounters() {
    let catalog = default_catalog().expect("reference catalog");
    let recorded = record(
        &catalog,
        keys::WANDERING_SAGE,
        run_with_party(5, 45),
        ui(&[Some(2), None], &[]),
        &[0, 0, 1],
        &[],
    );
    assert_eq!(recorded.outcome, EncounterOutcome::Completed);

    let result = replay(&catalog, &recorded.journal).expect("replay succeeds");
    assert_eq!(result.final_snapshot_hash, recorded.snapshot_hash);
    assert_eq!(result.inputs_consumed, 3);
}

fn faint_everyone(run: &mut RunState, outcome: BattleOutcome) {
    if outcome != BattleOutcome::Defeat {
        return;
    }
    for id in run.party.ids().to_vec() {
        if let Some(member) = run.party.get_mut(id) {
            member.hp = 0;
            member.status = StatusEffect::Faint;
        }
    }
}

#[test]
fn replay_reproduces_a_wipe_out_as_game_over() {
    let catalog = default_catalog().expect("reference catalog");
    let recorded = record_with(
        &catalog,
        keys::TRAINING_DOJO,
        run_with_party(404, 25),
        ScriptedUi::default(),
        &[0],
        &[BattleOutcome::Defeat],
        faint_everyone,
    );
    assert_eq!(recorded.outcome, EncounterOutcome::GameOver);

    let result = replay(&catalog, &recorded.journal).expect("replay succeeds");
    assert_eq!(result.final_outcome, EncounterOutcome::GameOver);
    assert_eq!(result.final_snapshot_hash, recorded.snapshot_hash);
    assert_eq!(result.inputs_consumed, 2);
}

#[test]
fn replay_without_recorded_faints_survives_the_defeat() {
    let catalog = default_catalog().expect("reference catalog");
    let mut recorded = record_with(
        &catalog,
        keys::TRAINING_DOJO,
        run_with_party(404, 25),
        ScriptedUi::default(),
        &[0],
        &[BattleOutcome::Defeat],
        faint_everyone,
    );
    for record in &mut recorded.journal.inputs {
        if let InputPayload::BattleOutcome { party, .. } = &mut record.payload {
            party.clear();
        }
    }

    let result = replay(&catalog, &recorded.journal).expect("replay succeeds");
    assert_eq!(result.final_outcome, EncounterOutcome::Completed);
}

#[test]
fn unknown_encounter_is_rejected() {
    let catalog = default_catalog().expect("reference catalog");
    let journal = InputJournal::new(EncounterType::from("NOT_REGISTERED"), run_with_party(1, 20));
    assert!(matches!(replay(&catalog, &journal), Err(ReplayError::UnknownEncounter(_))));
}

#[test]
fn truncated_journal_reports_missing_input() {
    let catalog = default_catalog().expect("reference catalog");
    let mut recorded = record(
        &catalog,
        keys::TRAINING_DOJO,
        run_with_party(9, 25),
        ScriptedUi::default(),
        &[0],
        &[BattleOutcome::Victory],
    );
    recorded.journal.inputs.pop();
    assert!(matches!(replay(&catalog, &recorded.journal), Err(ReplayError::MissingInput)));
}

#[test]
fn mismatched_prompt_id_is_an_unexpected_interruption() {
    let catalog = default_catalog().expect("reference catalog");
    let mut journal = InputJournal::new(EncounterType::from(keys::TRAINING_DOJO), run_with_party(9, 25));
    journal.append_choice(ChoicePromptId(41), Choice::SelectOption(0), 0);
    assert!(matches!(
        replay(&catalog, &journal),
        Err(ReplayError::UnexpectedInterruption { seq: 0 })
    ));
}

#[test]
fn battle_outcome_at_a_prompt_is_an_unexpected_interruption() {
    let catalog = default_catalog().expect("reference catalog");
    let mut journal = InputJournal::new(EncounterType::from(keys::TRAINING_DOJO), run_with_party(9, 25));
    journal.append(InputPayload::BattleOutcome { outcome: BattleOutcome::Victory, party: Vec::new() }, 0);
    assert!(matches!(
        replay(&catalog, &journal),
        Err(ReplayError::UnexpectedInterruption { seq: 0 })
    ));
}
