//! Reference encounter catalog and a reference battle engine.
//! The core never ships game data; these exist so the tools and tests can
//! drive full sessions end to end.

mod dojo;
mod merchant;
mod sage;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::blueprint::EnemyParty;
use crate::catalog::EncounterCatalog;
use crate::collaborators::BattleEngine;
use crate::dialogue::{DialogueLine, OptionDialogue};
use crate::error::{AssetLoadError, ConfigError};
use crate::seed::SeededRng;
use crate::types::{SpeciesKey, TextKey, TrainerKey};

pub use dojo::training_dojo;
pub use merchant::{MerchantDeal, shady_merchant};
pub use sage::wandering_sage;

pub mod keys {
    pub const TRAINING_DOJO: &str = "TRAINING_DOJO";
    pub const SHADY_MERCHANT: &str = "SHADY_MERCHANT";
    pub const WANDERING_SAGE: &str = "WANDERING_SAGE";

    pub const TRAINER_BLACK_BELT: &str = "BLACK_BELT";

    pub const SPECIES_MACHOP: &str = "MACHOP";
    pub const SPECIES_HITMONLEE: &str = "HITMONLEE";
    pub const SPECIES_MIMIKYU: &str = "MIMIKYU";

    pub const ITEM_RARE_CANDY: &str = "RARE_CANDY";
    pub const ITEM_LUCKY_EGG: &str = "LUCKY_EGG";
    pub const ITEM_SOOTHE_BELL: &str = "SOOTHE_BELL";

    pub const MOVE_SPITE: &str = "SPITE";
}

const WILD_POOL: [&str; 6] = ["RATTATA", "PIDGEY", "ZUBAT", "GEODUDE", "ODDISH", "PSYDUCK"];

pub(crate) fn option_dialogue(label: &str) -> OptionDialogue {
    OptionDialogue {
        label: Some(TextKey::new(format!("{label}.label"))),
        tooltip: Some(TextKey::new(format!("{label}.tooltip"))),
        disabled_tooltip: Some(TextKey::new(format!("{label}.disabled"))),
        selected: vec![DialogueLine::new(TextKey::new(format!("{label}.selected")))],
    }
}

/// Every reference encounter, registered.
pub fn default_catalog() -> Result<EncounterCatalog, ConfigError> {
    let mut catalog = EncounterCatalog::new();
    catalog.register(training_dojo)?;
    catalog.register(shady_merchant)?;
    catalog.register(wandering_sage)?;
    Ok(catalog)
}

/// Deterministic stand-in for the battle engine.
///
/// Started parties are appended to a shared log so a caller that boxed the
/// engine into a session can still inspect them.
#[derive(Clone, Debug, Default)]
pub struct ReferenceBattleEngine {
    missing_assets: BTreeSet<SpeciesKey>,
    started: Rc<RefCell<Vec<EnemyParty>>>,
}

impl ReferenceBattleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asset loads fail for any party that contains `species`.
    pub fn with_missing_asset(mut self, species: impl Into<SpeciesKey>) -> Self {
        self.missing_assets.insert(species.into());
        self
    }

    pub fn started_battles(&self) -> Rc<RefCell<Vec<EnemyParty>>> {
        Rc::clone(&self.started)
    }
}

impl BattleEngine for ReferenceBattleEngine {
    fn level_for_wave(&self, wave_index: u32) -> u32 {
        (wave_index * 9 / 10).max(1)
    }

    fn trainer_party_levels(&self, _trainer: &TrainerKey, wave_index: u32) -> Vec<u32> {
        let level = self.level_for_wave(wave_index);
        vec![level.saturating_sub(2).max(1), level]
    }

    fn boss_segments(&self, _wave_index: u32, level: u32, _species: &SpeciesKey) -> u32 {
        2 + level / 50
    }

    fn wild_species(&self, _wave_index: u32, _level: u32, rng: &mut SeededRng) -> SpeciesKey {
        rng.pick(&WILD_POOL).map_or_else(|| SpeciesKey::from(WILD_POOL[0]), |name| SpeciesKey::from(*name))
    }

    fn load_assets(&mut self, party: &EnemyParty) -> Result<(), AssetLoadError> {
        match party.members.iter().find(|member| self.missing_assets.contains(&member.species)) {
            Some(member) => Err(AssetLoadError {
                asset: format!("pokemon/{}", member.species),
                reason: "not found".to_string(),
            }),
            None => Ok(()),
        }
    }

    fn start_battle(&mut self, party: EnemyParty) {
        self.started.borrow_mut().push(party);
    }
}
