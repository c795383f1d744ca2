//! The encounter aggregate: options, eligibility requirements, enemy party
//! slots, lifecycle hooks and the per-instance seed offset.
//! This module exists to answer "may this encounter spawn" and "which options
//! are selectable" for a given run state.
//! It does not own phase sequencing; see `session`.

mod builder;

pub use builder::EncounterBuilder;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::binding::{PokemonBinding, PrimaryPick};
use crate::blueprint::{EnemyPartyConfig, StartOfBattleEffect};
use crate::collaborators::SpriteConfig;
use crate::dialogue::{DialogueTokens, EncounterDialogue, namespaced};
use crate::option::{EncounterOption, PhaseFn};
use crate::requirements::{PokemonRequirement, SceneRequirement};
use crate::rewards::{ExpHook, RewardHook};
use crate::seed::{SEED_OFFSET_STEP, SeededRng, wave_seed_offset};
use crate::state::{PartyMember, RunState};
use crate::types::{EncounterTier, EncounterType, EncounterVariant, OptionView, PokemonId};

/// Serialized scratch payload shared by the phases of the selected option.
/// Each encounter stores its own struct; the slot only sees JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MiscSlot(Option<serde_json::Value>);

impl MiscSlot {
    pub fn store<T: Serialize>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        self.0 = Some(serde_json::to_value(value)?);
        Ok(())
    }

    /// `Ok(None)` when nothing has been stored.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, serde_json::Error> {
        self.0.clone().map(serde_json::from_value).transpose()
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub(crate) fn raw(&self) -> Option<&serde_json::Value> {
        self.0.as_ref()
    }
}

/// Battle framing flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncounterFlags {
    pub catch_allowed: bool,
    pub flee_allowed: bool,
    pub hide_battle_intro_message: bool,
    pub auto_hide_intro_visuals: bool,
    /// The encounter loops back to option selection until its content leaves.
    pub continuous_encounter: bool,
    pub skip_to_fight_input: bool,
    pub skip_enemy_battle_turns: bool,
    pub prevent_game_stats_updates: bool,
    pub lock_encounter_reward_tiers: bool,
    pub has_battle_animations_without_targets: bool,
}

impl Default for EncounterFlags {
    fn default() -> Self {
        Self {
            catch_allowed: false,
            flee_allowed: true,
            hide_battle_intro_message: false,
            auto_hide_intro_visuals: true,
            continuous_encounter: false,
            skip_to_fight_input: false,
            skip_enemy_battle_turns: false,
            prevent_game_stats_updates: false,
            lock_encounter_reward_tiers: true,
            has_battle_animations_without_targets: false,
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct EncounterHooks {
    pub(crate) on_init: Option<PhaseFn>,
    pub(crate) on_visuals_start: Option<PhaseFn>,
    pub(crate) on_rewards: Option<PhaseFn>,
    pub(crate) on_game_over: Option<PhaseFn>,
    pub(crate) on_turn_start: Option<PhaseFn>,
}

pub struct Encounter {
    pub(crate) encounter_type: EncounterType,
    pub(crate) tier: EncounterTier,
    pub(crate) options: Vec<EncounterOption>,
    pub(crate) sprite_configs: Vec<SpriteConfig>,
    pub(crate) dialogue: EncounterDialogue,
    pub(crate) scene_requirements: Vec<SceneRequirement>,
    pub(crate) primary_requirements: Vec<PokemonRequirement>,
    pub(crate) secondary_requirements: Vec<PokemonRequirement>,
    pub(crate) exclude_primary_from_secondary: bool,
    pub(crate) hooks: EncounterHooks,
    pub(crate) max_allowed_encounters: u32,
    pub flags: EncounterFlags,
    pub variant: EncounterVariant,
    pub dialogue_tokens: DialogueTokens,
    pub enemy_party_configs: Vec<EnemyPartyConfig>,
    pub start_of_battle_effects: Vec<StartOfBattleEffect>,
    pub exp_multiplier: f64,
    pub misc: MiscSlot,
    pub(crate) selected_option: Option<usize>,
    pub(crate) seed_offset: Option<u64>,
    pub(crate) binding: PokemonBinding,
    pub(crate) reward_hook: Option<RewardHook>,
    pub(crate) exp_hook: Option<ExpHook>,
}

impl fmt::Debug for Encounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encounter")
            .field("encounter_type", &self.encounter_type)
            .field("tier", &self.tier)
            .field("options", &self.options)
            .field("variant", &self.variant)
            .field("selected_option", &self.selected_option)
            .field("seed_offset", &self.seed_offset)
            .finish_non_exhaustive()
    }
}

impl Encounter {
    pub fn builder() -> EncounterBuilder {
        EncounterBuilder::default()
    }

    pub fn encounter_type(&self) -> &EncounterType {
        &self.encounter_type
    }

    pub fn tier(&self) -> EncounterTier {
        self.tier
    }

    pub fn options(&self) -> &[EncounterOption] {
        &self.options
    }

    pub fn option(&self, index: usize) -> Option<&EncounterOption> {
        self.options.get(index)
    }

    pub fn sprite_configs(&self) -> &[SpriteConfig] {
        &self.sprite_configs
    }

    pub fn dialogue(&self) -> &EncounterDialogue {
        &self.dialogue
    }

    pub fn max_allowed_encounters(&self) -> u32 {
        self.max_allowed_encounters
    }

    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    pub fn primary_pokemon(&self) -> Option<PokemonId> {
        self.binding.primary
    }

    pub fn secondary_pokemon(&self) -> &[PokemonId] {
        &self.binding.secondary
    }

    pub fn has_reward_hook(&self) -> bool {
        self.reward_hook.is_some()
    }

    pub fn exp_hook(&self) -> Option<&ExpHook> {
        self.exp_hook.as_ref()
    }

    /// Current offset, or the wave offset before the first option selection.
    pub fn seed_offset(&self, wave_index: u32) -> u64 {
        self.seed_offset.unwrap_or_else(|| wave_seed_offset(wave_index))
    }

    /// First call yields the wave offset; each later call adds 512.
    pub fn update_seed_offset(&mut self, wave_index: u32) -> u64 {
        let next = match self.seed_offset {
            None => wave_seed_offset(wave_index),
            Some(offset) => offset + SEED_OFFSET_STEP,
        };
        self.seed_offset = Some(next);
        next
    }

    pub(crate) fn scoped_rng(&self, run: &RunState) -> SeededRng {
        SeededRng::for_offset(run.seed, self.seed_offset(run.wave_index))
    }

    /// Spawn gate: scene requirements, then secondary, then primary binding.
    pub fn meets_requirements(&mut self, run: &RunState) -> bool {
        if !self.scene_requirements.iter().all(|requirement| requirement.meets_requirement(run)) {
            self.binding.clear();
            return false;
        }
        if !self.binding.bind_secondary(run, &self.secondary_requirements) {
            self.binding.primary = None;
            return false;
        }
        let mut rng = self.scoped_rng(run);
        self.binding.bind_primary(
            run,
            &self.primary_requirements,
            self.exclude_primary_from_secondary,
            PrimaryPick::Random,
            &mut rng,
        )
    }

    /// Re-evaluates every option and reports how each one renders.
    pub fn evaluate_options(&mut self, run: &RunState) -> Vec<OptionView> {
        let mut rng = self.scoped_rng(run);
        self.options
            .iter_mut()
            .enumerate()
            .map(|(index, option)| {
                let meets = option.meets_requirements(run, &mut rng);
                OptionView {
                    index,
                    presentation: option.presentation(meets),
                    selectable: option.is_selectable(meets),
                    primary: option.primary_pokemon(),
                }
            })
            .collect()
    }

    /// Stores the tokens of every satisfied, non-inverted requirement under
    /// namespaced keys such as `primaryName` or `option1PrimaryMove`.
    pub fn populate_dialogue_tokens_from_requirements(&mut self, run: &RunState) {
        let mut rng = self.scoped_rng(run);
        self.meets_requirements(run);

        store_scene_tokens(&mut self.dialogue_tokens, run, "", &self.scene_requirements);
        store_pokemon_tokens(
            &mut self.dialogue_tokens,
            run,
            "primary",
            self.binding.primary,
            &self.primary_requirements,
        );
        store_pokemon_tokens(
            &mut self.dialogue_tokens,
            run,
            "secondary",
            self.binding.secondary.first().copied(),
            &self.secondary_requirements,
        );

        for (index, option) in self.options.iter_mut().enumerate() {
            let prefix = format!("option{}", index + 1);
            option.meets_requirements(run, &mut rng);
            store_scene_tokens(&mut self.dialogue_tokens, run, &prefix, option.scene_requirements());
            store_pokemon_tokens(
                &mut self.dialogue_tokens,
                run,
                &format!("{prefix}Primary"),
                option.primary_pokemon(),
                option.primary_requirements(),
            );
            store_pokemon_tokens(
                &mut self.dialogue_tokens,
                run,
                &format!("{prefix}Secondary"),
                option.secondary_pokemon().first().copied(),
                option.secondary_requirements(),
            );
        }
    }

    pub(crate) fn on_turn_start_hook(&self) -> Option<PhaseFn> {
        self.hooks.on_turn_start.clone()
    }
}

fn store_scene_tokens(
    tokens: &mut DialogueTokens,
    run: &RunState,
    prefix: &str,
    requirements: &[SceneRequirement],
) {
    for requirement in requirements.iter().filter(|requirement| requirement.meets_requirement(run)) {
        if let Some((key, value)) = requirement.dialogue_token(run) {
            tokens.set(namespaced(prefix, &key), value);
        }
    }
}

fn store_pokemon_tokens(
    tokens: &mut DialogueTokens,
    run: &RunState,
    prefix: &str,
    pokemon: Option<PokemonId>,
    requirements: &[PokemonRequirement],
) {
    if requirements.is_empty() {
        return;
    }
    let Some(member): Option<&PartyMember> = pokemon.and_then(|id| run.party.get(id)) else {
        return;
    };
    tokens.set(format!("{prefix}Name"), member.name.clone());
    for requirement in requirements.iter().filter(|requirement| !requirement.is_inverted()) {
        if let Some((key, value)) = requirement.dialogue_token(run, Some(member)) {
            tokens.set(namespaced(prefix, &key), value);
        }
    }
}
