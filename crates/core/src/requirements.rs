//! Composable predicates over run state and party members.
//! This module exists to gate encounters and options and to report the
//! dialogue tokens of satisfied predicates.
//! It does not own binding policy; see `binding`.

mod pokemon;
mod scene;

pub use pokemon::{PokemonCriterion, PokemonPredicate, PokemonRequirement};
pub use scene::SceneRequirement;

use std::fmt::Display;
use std::ops::RangeInclusive;

use crate::error::ConfigError;

/// A `(key, value)` pair for text interpolation.
pub type DialogueToken = (String, String);

fn token(key: &str, value: impl Display) -> DialogueToken {
    (key.to_string(), value.to_string())
}

fn non_empty<T>(requirement: &'static str, targets: Vec<T>) -> Result<Vec<T>, ConfigError> {
    if targets.is_empty() {
        return Err(ConfigError::EmptyTargets { requirement });
    }
    Ok(targets)
}

fn non_empty_range<T: PartialOrd + Display>(
    requirement: &'static str,
    range: RangeInclusive<T>,
) -> Result<RangeInclusive<T>, ConfigError> {
    if range.start() > range.end() {
        return Err(ConfigError::EmptyRange {
            requirement,
            min: range.start().to_string(),
            max: range.end().to_string(),
        });
    }
    Ok(range)
}
