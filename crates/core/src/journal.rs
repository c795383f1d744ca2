use serde::{Deserialize, Serialize};

use crate::state::{Party, RunState};
use crate::types::{BattleOutcome, Choice, ChoicePromptId, EncounterType, StatusEffect};

/// Every external input a session consumed, in order, plus what is needed
/// to rebuild the session from scratch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputJournal {
    pub format_version: u16,
    pub build_id: String,
    pub encounter_type: EncounterType,
    pub initial_run: RunState,
    pub inputs: Vec<InputRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    pub seq: u64,
    pub payload: InputPayload,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputPayload {
    Choice { prompt_id: ChoicePromptId, choice: Choice },
    /// `party` holds each slot's hp and status as the battle left them.
    BattleOutcome {
        outcome: BattleOutcome,
        #[serde(default)]
        party: Vec<MemberCondition>,
    },
    /// Answer to a party member prompt, as a slot index; `None` is a cancel.
    PartySelection { slot: Option<usize> },
    SubOption { index: Option<usize> },
}

/// Hp and status of one party slot after a battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCondition {
    pub slot: usize,
    pub hp: u32,
    pub status: StatusEffect,
}

impl MemberCondition {
    pub fn capture(party: &Party) -> Vec<Self> {
        party
            .iter()
            .enumerate()
            .map(|(slot, member)| Self { slot, hp: member.hp, status: member.status })
            .collect()
    }

    /// Writes recorded conditions back; slots the party no longer has are
    /// skipped.
    pub fn restore(conditions: &[Self], party: &mut Party) {
        for condition in conditions {
            let Some(member) = party.at_slot(condition.slot).and_then(|id| party.get_mut(id)) else {
                continue;
            };
            member.hp = condition.hp;
            member.status = condition.status;
        }
    }
}

impl InputPayload {
    /// UI answers are replayed through the selection collaborator rather
    /// than at an interrupt.
    pub fn is_ui_answer(&self) -> bool {
        matches!(self, Self::PartySelection { .. } | Self::SubOption { .. })
    }
}

impl InputJournal {
    pub fn new(encounter_type: EncounterType, initial_run: RunState) -> Self {
        Self {
            format_version: 1,
            build_id: "dev".to_string(),
            encounter_type,
            initial_run,
            inputs: Vec::new(),
        }
    }

    pub fn append(&mut self, payload: InputPayload, seq: u64) {
        self.inputs.push(InputRecord { seq, payload });
    }

    pub fn append_choice(&mut self, prompt_id: ChoicePromptId, choice: Choice, seq: u64) {
        self.append(InputPayload::Choice { prompt_id, choice }, seq);
    }
}
