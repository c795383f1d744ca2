use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use mystery_core::content::{ReferenceBattleEngine, default_catalog};
use mystery_core::{ReplayResult, load_session_from_file, replay_session};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSONL session file to replay
    #[arg(short, long)]
    journal: PathBuf,

    /// Print the final result as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "mystery_core=info,tools=info".into()))
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let loaded = load_session_from_file(&args.journal)
        .with_context(|| format!("Failed to load session file: {}", args.journal.display()))?;
    let catalog = default_catalog().context("Failed to build the encounter catalog")?;

    let result: ReplayResult = replay_session(
        &loaded.journal,
        |encounter_type| catalog.build(encounter_type),
        Box::new(ReferenceBattleEngine::new()),
    )
    .context("Replay failed during execution")?;

    if args.json {
        let summary = serde_json::json!({
            "encounter_type": loaded.journal.encounter_type.to_string(),
            "outcome": format!("{:?}", result.final_outcome),
            "inputs_consumed": result.inputs_consumed,
            "snapshot_hash": result.final_snapshot_hash,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Replay complete.");
    println!("Encounter: {}", loaded.journal.encounter_type);
    println!("Inputs consumed: {}", result.inputs_consumed);
    println!("Outcome: {:?}", result.final_outcome);
    println!("Snapshot Hash: {}", result.final_snapshot_hash);

    Ok(())
}
