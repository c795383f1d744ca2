//! Per-encounter state that survives a save and reload.
//! Everything else about an encounter is rebuilt from its definition; the
//! snapshot only carries what phases wrote while it was in progress.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dialogue::DialogueTokens;
use crate::encounter::{Encounter, MiscSlot};
use crate::error::EncounterError;
use crate::types::EncounterType;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncounterSnapshot {
    pub encounter_type: EncounterType,
    pub dialogue_tokens: DialogueTokens,
    pub misc: MiscSlot,
    pub seed_offset: Option<u64>,
    pub selected_option: Option<usize>,
}

impl EncounterSnapshot {
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(path, json)
    }

    pub fn read_from(path: &Path) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(io::Error::other)
    }
}

impl Encounter {
    pub fn snapshot(&self) -> EncounterSnapshot {
        EncounterSnapshot {
            encounter_type: self.encounter_type.clone(),
            dialogue_tokens: self.dialogue_tokens.clone(),
            misc: self.misc.clone(),
            seed_offset: self.seed_offset,
            selected_option: self.selected_option,
        }
    }

    /// Reapplies a snapshot to a freshly built instance of the same encounter.
    pub fn restore_snapshot(&mut self, snapshot: EncounterSnapshot) -> Result<(), EncounterError> {
        if snapshot.encounter_type != self.encounter_type {
            return Err(EncounterError::SnapshotMismatch {
                expected: self.encounter_type.clone(),
                found: snapshot.encounter_type,
            });
        }
        self.dialogue_tokens = snapshot.dialogue_tokens;
        self.misc = snapshot.misc;
        self.seed_offset = snapshot.seed_offset;
        self.selected_option = snapshot.selected_option;
        Ok(())
    }
}
