use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mystery_core::content::{ReferenceBattleEngine, default_catalog};
use mystery_core::{
    AdvanceStopReason, BattleOutcome, Choice, Collaborators, EncounterConfig, EncounterOutcome,
    EncounterSession, Interrupt, PartyMember, RunState, ScriptedUi, SessionWriter, roll_spawn,
    roll_tier, spawn_rng,
};
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const MAX_STOPS_PER_ENCOUNTER: usize = 64;
const STARTER_PARTY: [(&str, u32); 3] = [("MACHOP", 12), ("EEVEE", 11), ("PIKACHU", 13)];

#[derive(Parser)]
#[command(author, version, about = "Simulate a run's mystery encounters headlessly", long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value_t = 10)]
    first_wave: u32,
    #[arg(long, default_value_t = 180)]
    last_wave: u32,
    /// Optional TOML file overriding spawn and tier tuning
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Write each encounter's session journal into this directory
    #[arg(short, long)]
    journals: Option<PathBuf>,
    /// Chance out of 100 that a battle is lost
    #[arg(long, default_value_t = 10)]
    defeat_percent: u64,
}

fn choose<T: Clone>(rng: &mut ChaCha8Rng, slice: &[T]) -> T {
    let p = rng.next_u64() as usize % slice.len();
    slice[p].clone()
}

fn scripted_ui(rng: &mut ChaCha8Rng) -> ScriptedUi {
    let mut answers =
        || -> Vec<Option<usize>> { (0..8).map(|_| Some(rng.next_u64() as usize % 4)).collect() };
    let options = answers();
    let party_slots = answers();
    ScriptedUi::new(options, party_slots)
}

fn play(
    session: &mut EncounterSession,
    rng: &mut ChaCha8Rng,
    defeat_percent: u64,
) -> Result<EncounterOutcome> {
    for _ in 0..MAX_STOPS_PER_ENCOUNTER {
        match session.advance()? {
            AdvanceStopReason::Finished(outcome) => return Ok(outcome),
            AdvanceStopReason::Interrupted(Interrupt::OptionSelect { prompt_id, options }) => {
                let selectable: Vec<usize> =
                    options.iter().filter(|view| view.selectable).map(|view| view.index).collect();
                if selectable.is_empty() {
                    bail!("no selectable option at prompt {prompt_id:?}");
                }
                session.apply_choice(prompt_id, Choice::SelectOption(choose(rng, &selectable)))?;
            }
            AdvanceStopReason::BattleStarted => {
                let outcome = if rng.next_u64() % 100 < defeat_percent {
                    BattleOutcome::Defeat
                } else {
                    BattleOutcome::Victory
                };
                session.report_battle_outcome(outcome)?;
            }
        }
    }
    bail!("encounter did not finish within {MAX_STOPS_PER_ENCOUNTER} stops")
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mystery_core=info,tools=info,simulate=info".into()),
        )
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EncounterConfig::load(path)?,
        None => EncounterConfig::default(),
    };
    let catalog = default_catalog().context("Failed to build the encounter catalog")?;
    let mut choices = ChaCha8Rng::seed_from_u64(args.seed);

    let mut run = RunState::new(args.seed, args.first_wave);
    for (species, level) in STARTER_PARTY {
        run.party.add(PartyMember::new(species, level));
    }

    tracing::info!(seed = args.seed, first = args.first_wave, last = args.last_wave, "simulation started");
    for wave in args.first_wave..=args.last_wave {
        run.wave_index = wave;
        run.money += run.wave_money_amount(1.0);
        for id in run.party.ids().to_vec() {
            if let Some(member) = run.party.get_mut(id) {
                member.level = member.level.max(wave * 9 / 10);
            }
        }

        let mut rng = spawn_rng(&run);
        if !roll_spawn(&mut run, &config, &mut rng) {
            continue;
        }
        let tier = roll_tier(&run, &config, &mut rng);
        let Some(encounter) = catalog.select_encounter(&run, tier, &mut rng) else {
            continue;
        };
        let encounter_type = encounter.encounter_type().clone();

        let ui = scripted_ui(&mut choices);
        let collaborators = Collaborators::headless(Box::new(ReferenceBattleEngine::new()), Box::new(ui));
        let mut session = EncounterSession::new(run, encounter, collaborators);
        let outcome = play(&mut session, &mut choices, args.defeat_percent)
            .with_context(|| format!("{encounter_type} at wave {wave}"))?;
        println!("wave {wave:>3}: {encounter_type} ({tier}) -> {outcome:?}");

        if let Some(dir) = &args.journals {
            let path = dir.join(format!("wave-{wave:03}-{encounter_type}.jsonl"));
            SessionWriter::write_journal(&path, session.journal())
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        run = session.into_run();
        if outcome == EncounterOutcome::GameOver {
            println!("Run ended at wave {wave}.");
            break;
        }
    }

    println!("Encounters: {}", run.history.events.len());
    println!("Money: {}", run.money);
    Ok(())
}
