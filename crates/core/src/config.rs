//! Spawn and tier tuning, loadable from TOML.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    pub spawn: SpawnConfig,
    pub tiers: TierWeights,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Chance out of 256 for a wave to roll an encounter.
    pub base_weight: u32,
    pub weight_increment_on_miss: u32,
    /// No encounter may spawn within this many waves of the previous one.
    pub min_waves_between: u32,
    pub average_per_run_target: f64,
    pub first_wave: u32,
    pub last_wave: u32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            base_weight: 3,
            weight_increment_on_miss: 3,
            min_waves_between: 3,
            average_per_run_target: 12.0,
            first_wave: 10,
            last_wave: 180,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierWeights {
    pub common: u32,
    pub great: u32,
    pub ultra: u32,
    pub rogue: u32,
    /// Subtracted from `common` per common encounter already seen this run.
    pub common_pity: u32,
    pub great_pity: u32,
}

impl Default for TierWeights {
    fn default() -> Self {
        Self { common: 66, great: 40, ultra: 19, rogue: 3, common_pity: 6, great_pity: 4 }
    }
}

impl EncounterConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|error| ConfigError::Parse(error.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = fs::read_to_string(path)
            .map_err(|error| ConfigError::Parse(format!("{}: {error}", path.display())))?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = EncounterConfig::from_toml_str("").expect("empty config parses");
        assert_eq!(config, EncounterConfig::default());
        assert_eq!(config.tiers.common, 66);
        assert_eq!(config.spawn.min_waves_between, 3);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config = EncounterConfig::from_toml_str(
            "[spawn]\nbase_weight = 20\n\n[tiers]\nrogue = 10\n",
        )
        .expect("partial config parses");
        assert_eq!(config.spawn.base_weight, 20);
        assert_eq!(config.spawn.weight_increment_on_miss, 3);
        assert_eq!(config.tiers.rogue, 10);
        assert_eq!(config.tiers.great, 40);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let result = EncounterConfig::from_toml_str("[spawn\nbase_weight = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("encounters.toml");
        fs::write(&path, "[spawn]\nmin_waves_between = 5\n").expect("write config");
        let config = EncounterConfig::load(&path).expect("config loads");
        assert_eq!(config.spawn.min_waves_between, 5);
    }
}
