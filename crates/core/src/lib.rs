pub mod binding;
pub mod blueprint;
pub mod catalog;
pub mod collaborators;
pub mod config;
pub mod content;
pub mod dialogue;
pub mod encounter;
pub mod error;
pub mod journal;
pub mod option;
pub mod party_utils;
pub mod replay;
pub mod requirements;
pub mod rewards;
pub mod seed;
pub mod session;
pub mod session_file;
pub mod snapshot;
pub mod state;
pub mod types;

pub use catalog::{EncounterCatalog, roll_spawn, roll_tier, spawn_rng};
pub use collaborators::{BattleEngine, Collaborators, ScriptedUi, SelectionUi, Visuals};
pub use config::EncounterConfig;
pub use encounter::{Encounter, EncounterBuilder};
pub use error::{AssetLoadError, ConfigError, EncounterError};
pub use journal::{InputJournal, InputPayload, InputRecord};
pub use option::{EncounterOption, PreOptionSignal};
pub use replay::*;
pub use session::{EncounterSession, PhaseScope};
pub use session_file::{LoadedSession, SessionLoadError, SessionWriter, load_session_from_file};
pub use snapshot::EncounterSnapshot;
pub use state::{Party, PartyMember, RunState};
pub use types::*;
