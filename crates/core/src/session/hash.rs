//! Stable snapshot hashing for deterministic verification.
//! This module exists to keep hashing concerns separate from phase sequencing.
//! It does not own replay execution or journal persistence.

use std::hash::Hasher;

use super::*;
use xxhash_rust::xxh3::Xxh3;

impl EncounterSession {
    pub fn snapshot_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u64(self.run.seed);
        hasher.write_u32(self.run.wave_index);
        hasher.write_u64(self.run.money);
        hasher.write_u64(self.inputs.next_seq);
        hasher.write_u8(self.state as u8);
        hasher.write_u8(self.encounter.variant as u8);
        hasher.write_u64(self.encounter.seed_offset.unwrap_or(u64::MAX));
        hasher.write_u64(self.encounter.selected_option.map_or(u64::MAX, |index| index as u64));

        for (key, value) in self.encounter.dialogue_tokens.iter() {
            hasher.write(key.as_bytes());
            hasher.write_u8(0);
            hasher.write(value.as_bytes());
            hasher.write_u8(0);
        }
        if let Some(misc) = self.encounter.misc.raw() {
            hasher.write(misc.to_string().as_bytes());
        }

        for member in self.run.party.iter() {
            hasher.write_u32(member.level);
            hasher.write_u64(member.exp);
            hasher.write_u32(member.hp);
            hasher.write_u32(member.friendship);
            hasher.write_u8(member.status as u8);
            hasher.write_usize(member.held_items.len());
        }

        hasher.write_usize(self.run.history.events.len());
        hasher.write_u8(match self.finished_outcome {
            None => 0,
            Some(EncounterOutcome::Completed) => 1,
            Some(EncounterOutcome::GameOver) => 2,
            Some(EncounterOutcome::Aborted) => 3,
        });
        hasher.finish()
    }
}
