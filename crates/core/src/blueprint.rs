//! Enemy party blueprints and the materialized party handed to the battle engine.

use std::fmt;
use std::rc::Rc;

use crate::types::{
    BattlerTagKey, EncounterVariant, Gender, ItemKey, MoveKey, NatureKey, SpeciesKey, StatusEffect,
    TrainerKey,
};

/// Sleep without an explicit cure turn wakes after this many turns.
pub const DEFAULT_SLEEP_TURNS: u32 = 3;

/// Invoked by the battle engine when the enemy is summoned.
#[derive(Clone)]
pub struct SummonCallback(pub Rc<dyn Fn(&mut EnemyPokemon)>);

impl SummonCallback {
    pub fn new(callback: impl Fn(&mut EnemyPokemon) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    pub fn invoke(&self, pokemon: &mut EnemyPokemon) {
        (self.0)(pokemon);
    }
}

impl fmt::Debug for SummonCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SummonCallback")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainerConfig {
    pub trainer_type: TrainerKey,
    /// Drawn from the encounter rng when unset.
    pub female: Option<bool>,
    pub double: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusConfig {
    pub effect: StatusEffect,
    pub cure_turn: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeldItemGrant {
    pub item: ItemKey,
    pub stack: u32,
    pub transferable: bool,
}

#[derive(Clone, Debug, Default)]
pub struct EnemyPokemonConfig {
    /// Drawn by the battle engine when unset.
    pub species: Option<SpeciesKey>,
    pub is_boss: bool,
    pub boss_segments: Option<u32>,
    pub boss_segment_modifier: i32,
    /// Used as is; the wave level additive only applies to derived levels.
    pub level: Option<u32>,
    pub nickname: Option<String>,
    pub form_index: Option<u32>,
    pub shiny: Option<bool>,
    pub variant: Option<u8>,
    pub passive: bool,
    pub nature: Option<NatureKey>,
    pub ivs: Option<[u8; 6]>,
    pub status: Option<StatusConfig>,
    pub ability_index: Option<u8>,
    pub gender: Option<Gender>,
    pub move_set: Option<Vec<MoveKey>>,
    pub tags: Vec<BattlerTagKey>,
    pub held_items: Vec<HeldItemGrant>,
    pub on_summon: Option<SummonCallback>,
}

impl EnemyPokemonConfig {
    pub fn species(species: impl Into<SpeciesKey>) -> Self {
        Self { species: Some(species.into()), ..Self::default() }
    }

    pub fn boss(species: impl Into<SpeciesKey>) -> Self {
        Self { is_boss: true, ..Self::species(species) }
    }
}

#[derive(Clone, Debug)]
pub struct EnemyPartyConfig {
    /// Level bonus per ten waves; zero disables scaling.
    pub level_additive_multiplier: f64,
    pub double_battle: bool,
    pub trainer: Option<TrainerConfig>,
    pub pokemon: Vec<EnemyPokemonConfig>,
    pub disable_switch: bool,
    /// Marks the enemies as seen in the dex when the battle starts.
    pub count_as_seen: bool,
}

impl Default for EnemyPartyConfig {
    fn default() -> Self {
        Self {
            level_additive_multiplier: 0.0,
            double_battle: false,
            trainer: None,
            pokemon: Vec::new(),
            disable_switch: false,
            count_as_seen: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTrainer {
    pub trainer_type: TrainerKey,
    pub female: bool,
    pub double: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedStatus {
    pub effect: StatusEffect,
    pub cure_turns: Option<u32>,
}

impl From<StatusConfig> for ResolvedStatus {
    fn from(config: StatusConfig) -> Self {
        let cure_turns = match (config.effect, config.cure_turn) {
            (StatusEffect::Sleep, None) => Some(DEFAULT_SLEEP_TURNS),
            (_, cure_turn) => cure_turn,
        };
        Self { effect: config.effect, cure_turns }
    }
}

#[derive(Clone, Debug)]
pub struct EnemyPokemon {
    pub species: SpeciesKey,
    pub level: u32,
    /// Zero for non-boss enemies.
    pub boss_segments: u32,
    pub nickname: Option<String>,
    pub form_index: Option<u32>,
    pub shiny: Option<bool>,
    pub variant: Option<u8>,
    pub passive: bool,
    pub nature: Option<NatureKey>,
    pub ivs: Option<[u8; 6]>,
    pub status: Option<ResolvedStatus>,
    pub ability_index: Option<u8>,
    pub gender: Option<Gender>,
    pub moveset: Option<Vec<MoveKey>>,
    pub tags: Vec<BattlerTagKey>,
    pub held_items: Vec<HeldItemGrant>,
    pub on_summon: Option<SummonCallback>,
}

impl EnemyPokemon {
    pub fn is_boss(&self) -> bool {
        self.boss_segments > 0
    }
}

/// Move forced at the start of the battle, before the first turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartOfBattleEffect {
    pub source_enemy: usize,
    pub move_key: MoveKey,
    pub ignore_pp: bool,
}

/// What the battle engine instantiates.
#[derive(Clone, Debug)]
pub struct EnemyParty {
    pub variant: EncounterVariant,
    pub double_battle: bool,
    pub trainer: Option<ResolvedTrainer>,
    pub members: Vec<EnemyPokemon>,
    pub disable_switch: bool,
    pub count_as_seen: bool,
    pub exp_multiplier: f64,
    pub catch_allowed: bool,
    pub flee_allowed: bool,
    pub start_of_battle_effects: Vec<StartOfBattleEffect>,
}

/// `max(round(wave / 10 * multiplier), 0)`
pub fn wave_level_additive(wave_index: u32, multiplier: f64) -> u32 {
    (f64::from(wave_index) / 10.0 * multiplier).round().max(0.0) as u32
}
