use std::ops::RangeInclusive;

use super::{DialogueToken, non_empty, non_empty_range, token};
use crate::error::ConfigError;
use crate::state::RunState;
use crate::types::{EncounterType, ItemKey, TimeOfDay, Weather};

/// A predicate over run state. Built only through the validating constructors.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneRequirement {
    kind: SceneKind,
}

#[derive(Clone, Debug, PartialEq)]
enum SceneKind {
    WaveRange(RangeInclusive<u32>),
    WaveModulus { moduli: Vec<u32>, modulus: u32 },
    TimeOfDay(Vec<TimeOfDay>),
    Weather(Vec<Weather>),
    PartySize { range: RangeInclusive<usize>, exclude_fainted: bool },
    PersistentModifier { items: Vec<ItemKey>, min_count: u32 },
    Money { required: u64, scaling_multiplier: f64 },
    PreviousEncounter(EncounterType),
    Some(Vec<SceneRequirement>),
    Every(Vec<SceneRequirement>),
}

impl SceneRequirement {
    pub fn wave_range(range: RangeInclusive<u32>) -> Result<Self, ConfigError> {
        Ok(Self { kind: SceneKind::WaveRange(non_empty_range("wave range", range)?) })
    }

    /// Met when `wave % modulus` is one of `moduli`.
    pub fn wave_modulus(moduli: Vec<u32>, modulus: u32) -> Result<Self, ConfigError> {
        if modulus == 0 {
            return Err(ConfigError::ZeroModulus);
        }
        Ok(Self {
            kind: SceneKind::WaveModulus { moduli: non_empty("wave modulus", moduli)?, modulus },
        })
    }

    pub fn time_of_day(times: Vec<TimeOfDay>) -> Result<Self, ConfigError> {
        Ok(Self { kind: SceneKind::TimeOfDay(non_empty("time of day", times)?) })
    }

    pub fn weather(weather: Vec<Weather>) -> Result<Self, ConfigError> {
        Ok(Self { kind: SceneKind::Weather(non_empty("weather", weather)?) })
    }

    pub fn party_size(
        range: RangeInclusive<usize>,
        exclude_fainted: bool,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            kind: SceneKind::PartySize {
                range: non_empty_range("party size", range)?,
                exclude_fainted,
            },
        })
    }

    /// Met when the summed stack count of `items` reaches `min_count`.
    pub fn persistent_modifier(items: Vec<ItemKey>, min_count: u32) -> Result<Self, ConfigError> {
        if min_count == 0 {
            return Err(ConfigError::ZeroMinimum { requirement: "persistent modifier" });
        }
        Ok(Self {
            kind: SceneKind::PersistentModifier {
                items: non_empty("persistent modifier", items)?,
                min_count,
            },
        })
    }

    /// With a positive `scaling_multiplier` the threshold tracks the wave money
    /// amount and is recomputed on every check; `required` is used otherwise.
    pub fn money(required: u64, scaling_multiplier: f64) -> Self {
        Self { kind: SceneKind::Money { required, scaling_multiplier } }
    }

    pub fn previous_encounter(encounter_type: impl Into<EncounterType>) -> Self {
        Self { kind: SceneKind::PreviousEncounter(encounter_type.into()) }
    }

    /// OR composite. Never met when empty.
    pub fn some(requirements: Vec<SceneRequirement>) -> Self {
        Self { kind: SceneKind::Some(requirements) }
    }

    /// AND composite. Always met when empty.
    pub fn every(requirements: Vec<SceneRequirement>) -> Self {
        Self { kind: SceneKind::Every(requirements) }
    }

    pub fn meets_requirement(&self, run: &RunState) -> bool {
        match &self.kind {
            SceneKind::WaveRange(range) => range.contains(&run.wave_index),
            SceneKind::WaveModulus { moduli, modulus } => {
                moduli.contains(&(run.wave_index % modulus))
            }
            SceneKind::TimeOfDay(times) => times.contains(&run.time_of_day),
            SceneKind::Weather(weather) => weather.contains(&run.weather),
            SceneKind::PartySize { range, exclude_fainted } => {
                range.contains(&party_count(run, *exclude_fainted))
            }
            SceneKind::PersistentModifier { items, min_count } => {
                let total: u32 = items.iter().map(|item| run.modifiers.stack_count(item)).sum();
                total >= *min_count
            }
            SceneKind::Money { required, scaling_multiplier } => {
                let threshold = money_threshold(run, *required, *scaling_multiplier);
                threshold == 0 || run.money >= threshold
            }
            SceneKind::PreviousEncounter(encounter_type) => run.history.contains(encounter_type),
            SceneKind::Some(requirements) => {
                requirements.iter().any(|requirement| requirement.meets_requirement(run))
            }
            SceneKind::Every(requirements) => {
                requirements.iter().all(|requirement| requirement.meets_requirement(run))
            }
        }
    }

    pub fn dialogue_token(&self, run: &RunState) -> Option<DialogueToken> {
        match &self.kind {
            SceneKind::WaveRange(_) | SceneKind::WaveModulus { .. } => {
                Some(token("waveIndex", run.wave_index))
            }
            SceneKind::TimeOfDay(_) => Some(token("timeOfDay", run.time_of_day)),
            SceneKind::Weather(_) => Some(token("weather", run.weather)),
            SceneKind::PartySize { exclude_fainted, .. } => {
                Some(token("partySize", party_count(run, *exclude_fainted)))
            }
            SceneKind::PersistentModifier { items, .. } => {
                items.first().map(|item| token("requiredItem", item))
            }
            SceneKind::Money { required, scaling_multiplier } => {
                Some(token("money", money_threshold(run, *required, *scaling_multiplier)))
            }
            SceneKind::PreviousEncounter(encounter_type) => {
                Some(token("previousEncounter", encounter_type))
            }
            SceneKind::Some(requirements) => requirements
                .iter()
                .find(|requirement| requirement.meets_requirement(run))
                .or_else(|| requirements.first())
                .and_then(|requirement| requirement.dialogue_token(run)),
            SceneKind::Every(_) => None,
        }
    }
}

fn party_count(run: &RunState, exclude_fainted: bool) -> usize {
    run.party.iter().filter(|member| !exclude_fainted || !member.is_fainted()).count()
}

fn money_threshold(run: &RunState, required: u64, scaling_multiplier: f64) -> u64 {
    if scaling_multiplier > 0.0 { run.wave_money_amount(scaling_multiplier) } else { required }
}
