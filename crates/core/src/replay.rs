//! Headless re-execution of a recorded session from its input journal.

use crate::collaborators::{BattleEngine, Collaborators, ScriptedUi};
use crate::encounter::Encounter;
use crate::error::EncounterError;
use crate::journal::{InputJournal, InputPayload, MemberCondition};
use crate::session::EncounterSession;
use crate::types::{AdvanceStopReason, EncounterOutcome, EncounterType};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("encounter {0} is not known to this build")]
    UnknownEncounter(EncounterType),

    #[error("recorded input does not fit the session at input {seq}")]
    UnexpectedInterruption { seq: u64 },

    #[error("journal ended before the session finished")]
    MissingInput,

    #[error(transparent)]
    Session(#[from] EncounterError),
}

#[derive(Debug, PartialEq)]
pub struct ReplayResult {
    pub final_outcome: EncounterOutcome,
    pub final_snapshot_hash: u64,
    pub inputs_consumed: usize,
}

/// Rebuilds the session from the journal's initial run state and feeds it
/// the recorded inputs. UI answers go through a scripted selection UI in the
/// order they were recorded. Party conditions recorded with a battle outcome
/// are restored before the outcome is reported.
pub fn replay_session(
    journal: &InputJournal,
    build: impl Fn(&EncounterType) -> Option<Encounter>,
    battle: Box<dyn BattleEngine>,
) -> Result<ReplayResult, ReplayError> {
    let encounter = build(&journal.encounter_type)
        .ok_or_else(|| ReplayError::UnknownEncounter(journal.encounter_type.clone()))?;

    let mut option_answers = Vec::new();
    let mut party_answers = Vec::new();
    for record in &journal.inputs {
        match record.payload {
            InputPayload::SubOption { index } => option_answers.push(index),
            InputPayload::PartySelection { slot } => party_answers.push(slot),
            _ => {}
        }
    }
    let ui = ScriptedUi::new(option_answers, party_answers);
    let collaborators = Collaborators::headless(battle, Box::new(ui));
    let mut session = EncounterSession::new(journal.initial_run.clone(), encounter, collaborators);

    let mut inputs = journal.inputs.iter().filter(|record| !record.payload.is_ui_answer());
    let mut consumed = 0;
    loop {
        match session.advance()? {
            AdvanceStopReason::Finished(outcome) => {
                tracing::debug!(outcome = ?outcome, consumed, "replay finished");
                return Ok(ReplayResult {
                    final_outcome: outcome,
                    final_snapshot_hash: session.snapshot_hash(),
                    inputs_consumed: consumed,
                });
            }
            AdvanceStopReason::Interrupted(_) => {
                let record = inputs.next().ok_or(ReplayError::MissingInput)?;
                let InputPayload::Choice { prompt_id, choice } = &record.payload else {
                    return Err(ReplayError::UnexpectedInterruption { seq: record.seq });
                };
                session
                    .apply_choice(*prompt_id, choice.clone())
                    .map_err(|error| match error {
                        EncounterError::PromptMismatch | EncounterError::InvalidChoice(_) => {
                            ReplayError::UnexpectedInterruption { seq: record.seq }
                        }
                        other => other.into(),
                    })?;
            }
            AdvanceStopReason::BattleStarted => {
                let record = inputs.next().ok_or(ReplayError::MissingInput)?;
                let InputPayload::BattleOutcome { outcome, party } = &record.payload else {
                    return Err(ReplayError::UnexpectedInterruption { seq: record.seq });
                };
                MemberCondition::restore(party, &mut session.run_mut().party);
                session.report_battle_outcome(*outcome)?;
            }
        }
        consumed += 1;
    }
}

#[cfg(test)]
mod tests;
