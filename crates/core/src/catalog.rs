//! Encounter registry and the per-wave spawn decision.
//! This module exists to decide whether a wave hosts an encounter, which tier
//! it rolls and which eligible encounter fills it.
//! It does not own what happens once an encounter starts; see `session`.

use std::collections::BTreeMap;
use std::iter;

use crate::config::EncounterConfig;
use crate::encounter::Encounter;
use crate::error::ConfigError;
use crate::seed::{SPAWN_STREAM, SeededRng};
use crate::state::RunState;
use crate::types::{EncounterTier, EncounterType};

pub type EncounterFactory = fn() -> Result<Encounter, ConfigError>;

const SPAWN_ROLL_RANGE: usize = 256;
const ANTI_VARIANCE_WEIGHT: f64 = 15.0;

/// Random stream for spawn and tier rolls of the run's current wave.
pub fn spawn_rng(run: &RunState) -> SeededRng {
    SeededRng::for_offset(run.seed, SPAWN_STREAM ^ u64::from(run.wave_index))
}

#[derive(Default)]
pub struct EncounterCatalog {
    factories: BTreeMap<EncounterType, (EncounterTier, EncounterFactory)>,
}

impl EncounterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the encounter once to validate it and learn its type and tier.
    pub fn register(&mut self, factory: EncounterFactory) -> Result<(), ConfigError> {
        let encounter = factory()?;
        let encounter_type = encounter.encounter_type().clone();
        if self.factories.contains_key(&encounter_type) {
            return Err(ConfigError::DuplicateEncounter(encounter_type));
        }
        self.factories.insert(encounter_type, (encounter.tier(), factory));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn encounter_types(&self) -> impl Iterator<Item = &EncounterType> {
        self.factories.keys()
    }

    /// A fresh instance; `None` for unregistered types.
    pub fn build(&self, encounter_type: &EncounterType) -> Option<Encounter> {
        let (_, factory) = self.factories.get(encounter_type)?;
        match factory() {
            Ok(encounter) => Some(encounter),
            Err(error) => {
                tracing::warn!(%encounter_type, %error, "registered encounter failed to build");
                None
            }
        }
    }

    /// Fresh instances that are under their repeat limit and whose
    /// requirements hold, with their bindings made.
    pub fn eligible(&self, run: &RunState) -> Vec<Encounter> {
        self.factories
            .keys()
            .filter_map(|encounter_type| self.build(encounter_type))
            .filter_map(|mut encounter| {
                let seen = run.history.count_of(encounter.encounter_type());
                if seen >= encounter.max_allowed_encounters() {
                    tracing::debug!(encounter = %encounter.encounter_type(), seen, "repeat limit reached");
                    return None;
                }
                if !encounter.meets_requirements(run) {
                    tracing::debug!(encounter = %encounter.encounter_type(), "requirements not met");
                    return None;
                }
                Some(encounter)
            })
            .collect()
    }

    /// Picks among eligible encounters of `tier`, falling back through the
    /// remaining tiers from common to rogue. `None` means a normal wave.
    pub fn select_encounter(
        &self,
        run: &RunState,
        tier: EncounterTier,
        rng: &mut SeededRng,
    ) -> Option<Encounter> {
        let mut eligible = self.eligible(run);
        let fallback = EncounterTier::SPAWNABLE.into_iter().filter(|candidate| *candidate != tier);
        for candidate_tier in iter::once(tier).chain(fallback) {
            let indices: Vec<usize> = eligible
                .iter()
                .enumerate()
                .filter(|(_, encounter)| encounter.tier() == candidate_tier)
                .map(|(index, _)| index)
                .collect();
            if let Some(index) = rng.pick(&indices) {
                let encounter = eligible.swap_remove(*index);
                tracing::info!(
                    encounter = %encounter.encounter_type(),
                    rolled = %tier,
                    tier = %candidate_tier,
                    "encounter selected"
                );
                return Some(encounter);
            }
        }
        tracing::debug!(wave = run.wave_index, "no eligible encounter");
        None
    }
}

/// Rolls whether the current wave hosts an encounter and updates the
/// run's stored spawn weight.
pub fn roll_spawn(run: &mut RunState, config: &EncounterConfig, rng: &mut SeededRng) -> bool {
    let spawn = &config.spawn;
    let wave_index = run.wave_index;
    if wave_index < spawn.first_wave || wave_index > spawn.last_wave {
        return false;
    }

    let can_spawn = run
        .history
        .last_wave()
        .is_none_or(|last| wave_index.saturating_sub(last) > spawn.min_waves_between);
    let span = f64::from(spawn.last_wave.saturating_sub(spawn.first_wave).max(1));
    let expected = spawn.average_per_run_target / span * f64::from(wave_index - spawn.first_wave);
    let actual = run.history.events.len() as f64;
    let favored_weight = f64::from(run.history.spawn_weight) + (expected - actual) * ANTI_VARIANCE_WEIGHT;

    let roll = rng.below(SPAWN_ROLL_RANGE) as f64;
    let hit = can_spawn && roll < favored_weight;
    if hit {
        run.history.spawn_weight = spawn.base_weight;
    } else {
        run.history.spawn_weight += spawn.weight_increment_on_miss;
    }
    tracing::debug!(wave = wave_index, roll, favored_weight, hit, "encounter spawn roll");
    hit
}

/// Weighted tier roll; common and great weights shrink with each encounter
/// of that tier already seen this run.
pub fn roll_tier(run: &RunState, config: &EncounterConfig, rng: &mut SeededRng) -> EncounterTier {
    let tiers = &config.tiers;
    let common =
        tiers.common.saturating_sub(tiers.common_pity * run.history.count_of_tier(EncounterTier::Common));
    let great =
        tiers.great.saturating_sub(tiers.great_pity * run.history.count_of_tier(EncounterTier::Great));
    let total = common + great + tiers.ultra + tiers.rogue;
    if total == 0 {
        return EncounterTier::Common;
    }

    let value = rng.below(total as usize) as u32;
    let common_threshold = total - common;
    let great_threshold = common_threshold - great;
    let ultra_threshold = great_threshold - tiers.ultra;
    if value >= common_threshold {
        EncounterTier::Common
    } else if value >= great_threshold {
        EncounterTier::Great
    } else if value >= ultra_threshold {
        EncounterTier::Ultra
    } else {
        EncounterTier::Rogue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::OptionDialogue;
    use crate::state::{EncounteredEvent, PartyMember};

    fn two_options(encounter_type: &str, tier: EncounterTier) -> Result<Encounter, ConfigError> {
        Encounter::builder()
            .with_encounter_type(encounter_type)
            .with_encounter_tier(tier)
            .with_simple_option(OptionDialogue::default(), |_| Ok(()))
            .with_simple_option(OptionDialogue::default(), |_| Ok(()))
            .build()
    }

    fn common_event() -> Result<Encounter, ConfigError> {
        two_options("COMMON_EVENT", EncounterTier::Common)
    }

    fn rogue_event() -> Result<Encounter, ConfigError> {
        two_options("ROGUE_EVENT", EncounterTier::Rogue)
    }

    fn late_event() -> Result<Encounter, ConfigError> {
        Encounter::builder()
            .with_encounter_type("LATE_EVENT")
            .with_encounter_tier(EncounterTier::Great)
            .with_scene_wave_range_requirement(100..=180)
            .with_simple_option(OptionDialogue::default(), |_| Ok(()))
            .with_simple_option(OptionDialogue::default(), |_| Ok(()))
            .build()
    }

    fn run_at(wave_index: u32) -> RunState {
        let mut run = RunState::new(77, wave_index);
        run.party.add(PartyMember::new("PIKACHU", 20));
        run
    }

    fn seen(run: &mut RunState, encounter_type: &str, tier: EncounterTier, wave_index: u32) {
        run.history.record(EncounteredEvent {
            encounter_type: EncounterType::from(encounter_type),
            tier,
            wave_index,
            selected_option: Some(0),
        });
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut catalog = EncounterCatalog::new();
        catalog.register(common_event).expect("first registration");
        let result = catalog.register(common_event);
        assert!(matches!(result, Err(ConfigError::DuplicateEncounter(_))));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn eligible_filters_requirements_and_repeat_limit() {
        let mut catalog = EncounterCatalog::new();
        catalog.register(common_event).expect("register common");
        catalog.register(rogue_event).expect("register rogue");
        catalog.register(late_event).expect("register late");

        let mut run = run_at(40);
        let types: Vec<_> =
            catalog.eligible(&run).iter().map(|encounter| encounter.encounter_type().clone()).collect();
        assert_eq!(types, vec![EncounterType::from("COMMON_EVENT"), EncounterType::from("ROGUE_EVENT")]);

        seen(&mut run, "ROGUE_EVENT", EncounterTier::Rogue, 20);
        seen(&mut run, "COMMON_EVENT", EncounterTier::Common, 25);
        let types: Vec<_> =
            catalog.eligible(&run).iter().map(|encounter| encounter.encounter_type().clone()).collect();
        assert_eq!(types, vec![EncounterType::from("COMMON_EVENT")]);
    }

    #[test]
    fn selection_falls_back_to_other_tiers() {
        let mut catalog = EncounterCatalog::new();
        catalog.register(rogue_event).expect("register rogue");
        let run = run_at(40);
        let mut rng = spawn_rng(&run);
        let selected = catalog.select_encounter(&run, EncounterTier::Common, &mut rng);
        assert_eq!(
            selected.map(|encounter| encounter.encounter_type().clone()),
            Some(EncounterType::from("ROGUE_EVENT"))
        );

        let empty = EncounterCatalog::new();
        assert!(empty.select_encounter(&run, EncounterTier::Common, &mut rng).is_none());
    }

    #[test]
    fn no_spawn_within_min_waves_of_last_encounter() {
        let config = EncounterConfig::default();
        let mut run = run_at(42);
        seen(&mut run, "COMMON_EVENT", EncounterTier::Common, 40);
        run.history.spawn_weight = 256;
        let before = run.history.spawn_weight;
        let mut rng = spawn_rng(&run);
        assert!(!roll_spawn(&mut run, &config, &mut rng));
        assert_eq!(run.history.spawn_weight, before + config.spawn.weight_increment_on_miss);
    }

    #[test]
    fn spawn_hit_resets_weight() {
        let config = EncounterConfig::default();
        let mut run = run_at(60);
        run.history.spawn_weight = 1_000;
        let mut rng = spawn_rng(&run);
        assert!(roll_spawn(&mut run, &config, &mut rng));
        assert_eq!(run.history.spawn_weight, config.spawn.base_weight);
    }

    #[test]
    fn waves_outside_window_never_spawn() {
        let config = EncounterConfig::default();
        let mut run = run_at(5);
        run.history.spawn_weight = 1_000;
        let mut rng = spawn_rng(&run);
        assert!(!roll_spawn(&mut run, &config, &mut rng));
    }

    #[test]
    fn tier_pity_removes_exhausted_tiers() {
        let mut config = EncounterConfig::default();
        config.tiers.ultra = 0;
        config.tiers.rogue = 0;
        config.tiers.common = 12;
        config.tiers.common_pity = 6;
        let mut run = run_at(60);
        seen(&mut run, "A", EncounterTier::Common, 20);
        seen(&mut run, "B", EncounterTier::Common, 30);
        for offset in 0..32 {
            let mut rng = SeededRng::for_offset(run.seed, offset);
            assert_eq!(roll_tier(&run, &config, &mut rng), EncounterTier::Great);
        }
    }

    #[test]
    fn tier_roll_is_deterministic_per_wave() {
        let config = EncounterConfig::default();
        let run = run_at(33);
        let first = roll_tier(&run, &config, &mut spawn_rng(&run));
        let second = roll_tier(&run, &config, &mut spawn_rng(&run));
        assert_eq!(first, second);
    }
}
