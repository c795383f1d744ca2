use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct PokemonId;
}

/// Opaque string keys for reference data the core only compares and reports.
macro_rules! content_key {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(pub String);

            impl $name {
                pub fn new(key: impl Into<String>) -> Self {
                    Self(key.into())
                }

                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl From<&str> for $name {
                fn from(key: &str) -> Self {
                    Self(key.to_string())
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

content_key!(
    /// Discriminant of an encounter definition.
    EncounterType,
    SpeciesKey,
    NatureKey,
    MoveKey,
    AbilityKey,
    ItemKey,
    TrainerKey,
    BattlerTagKey,
    /// Localization key; the core never renders text.
    TextKey,
);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EncounterTier {
    Common,
    Great,
    Ultra,
    Rogue,
    Master,
}

impl EncounterTier {
    pub const SPAWNABLE: [EncounterTier; 4] =
        [EncounterTier::Common, EncounterTier::Great, EncounterTier::Ultra, EncounterTier::Rogue];

    pub fn default_max_allowed_encounters(self) -> u32 {
        match self {
            EncounterTier::Rogue => 1,
            _ => 2,
        }
    }
}

/// How an option renders when its requirements fail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionMode {
    #[default]
    Default,
    DisabledOrDefault,
    DefaultOrSpecial,
    DisabledOrSpecial,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionPresentation {
    Default,
    Special,
    Disabled,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncounterVariant {
    #[default]
    Default,
    TrainerBattle,
    WildBattle,
    BossBattle,
    NoBattle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Normal,
    Fighting,
    Flying,
    Poison,
    Ground,
    Rock,
    Bug,
    Ghost,
    Steel,
    Fire,
    Water,
    Grass,
    Electric,
    Psychic,
    Ice,
    Dragon,
    Dark,
    Fairy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEffect {
    #[default]
    None,
    Poison,
    Toxic,
    Paralysis,
    Sleep,
    Freeze,
    Burn,
    Faint,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    Dawn,
    #[default]
    Day,
    Dusk,
    Night,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    #[default]
    Clear,
    Sunny,
    Rain,
    Sandstorm,
    Hail,
    Snow,
    Fog,
    HeavyRain,
    HarshSun,
    StrongWinds,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Genderless,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Hp,
    Attack,
    Defense,
    SpAttack,
    SpDefense,
    Speed,
}

impl Stat {
    pub fn index(self) -> usize {
        self as usize
    }
}

macro_rules! debug_display {
    ($($name:ident),*) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    fmt::Debug::fmt(self, f)
                }
            }
        )*
    };
}

debug_display!(EncounterTier, ElementType, StatusEffect, TimeOfDay, Weather);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChoicePromptId(pub u64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    SelectOption(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleOutcome {
    Victory,
    Defeat,
}

/// One row of the option-selection prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionView {
    pub index: usize,
    pub presentation: OptionPresentation,
    pub selectable: bool,
    pub primary: Option<PokemonId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interrupt {
    OptionSelect { prompt_id: ChoicePromptId, options: Vec<OptionView> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncounterState {
    Uninitialized,
    Init,
    VisualsShown,
    AwaitingOptionSelection,
    OptionResolving,
    BattleHandoff,
    NoBattleRewards,
    Terminated,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EncounterOutcome {
    Completed,
    GameOver,
    /// Asset loading failed; the run returns to the map.
    Aborted,
}

#[derive(Clone, Debug)]
pub enum AdvanceStopReason {
    Interrupted(Interrupt),
    BattleStarted,
    Finished(EncounterOutcome),
}

#[derive(Clone, Debug, PartialEq)]
pub enum LogEvent {
    StateChanged { from: EncounterState, to: EncounterState },
    OptionSelected { index: usize, seed_offset: u64 },
    PreOptionAborted { index: usize },
    BattleQueued { variant: EncounterVariant, enemies: usize },
    BattleStarted,
    BattleEnded { outcome: BattleOutcome },
    AssetLoadFailed { asset: String },
    ExpGranted { pokemon: PokemonId, exp: u64 },
    RewardsResolved { items: usize, shop: bool, heal: bool },
    EggsLapsed,
    LeftWithoutBattle { add_heal: bool },
    GameOver,
}
