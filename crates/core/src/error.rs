//! Error types for encounter construction and session flow.
//! Binding failure is deliberately absent: it is a `false` from
//! `meets_requirements`, never an error.

use crate::types::{EncounterState, EncounterType};

/// Raised while building requirements, options, encounters or the catalog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{requirement} requirement needs at least one target")]
    EmptyTargets { requirement: &'static str },

    #[error("{requirement} requirement has an empty range {min}..={max}")]
    EmptyRange { requirement: &'static str, min: String, max: String },

    #[error("{requirement} requirement must require at least one pokemon")]
    ZeroMinimum { requirement: &'static str },

    #[error("wave modulus must be non-zero")]
    ZeroModulus,

    #[error("encounter {encounter_type} has {count} options, expected 2 to 4")]
    OptionCount { encounter_type: EncounterType, count: usize },

    #[error("option has no option phase")]
    MissingOptionPhase,

    #[error("encounter is missing its encounter type")]
    MissingEncounterType,

    #[error("encounter {0} is missing its tier")]
    MissingTier(EncounterType),

    #[error("encounter {0} is already registered")]
    DuplicateEncounter(EncounterType),

    #[error("invalid encounter config: {0}")]
    Parse(String),
}

/// The battle collaborator could not load an asset for the enemy party.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to load {asset}: {reason}")]
pub struct AssetLoadError {
    pub asset: String,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EncounterError {
    #[error("prompt id does not match the pending prompt")]
    PromptMismatch,

    #[error("option {0} cannot be selected")]
    InvalidChoice(usize),

    #[error("session is in state {0:?}, which does not accept this action")]
    WrongState(EncounterState),

    #[error("party member is not in the party")]
    UnknownPokemon,

    #[error("snapshot belongs to {found}, not {expected}")]
    SnapshotMismatch { expected: EncounterType, found: EncounterType },

    #[error("encounter has no enemy party config at index {0}")]
    MissingEnemyConfig(usize),

    #[error(transparent)]
    AssetLoad(#[from] AssetLoadError),

    #[error("misc payload could not be encoded: {0}")]
    Misc(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Raised by encounter content from inside a phase callback.
    #[error("{0}")]
    Phase(String),
}
