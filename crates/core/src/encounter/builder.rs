use std::ops::RangeInclusive;
use std::rc::Rc;

use super::{Encounter, EncounterFlags, EncounterHooks, MiscSlot};
use crate::binding::PokemonBinding;
use crate::blueprint::{EnemyPartyConfig, StartOfBattleEffect};
use crate::collaborators::SpriteConfig;
use crate::dialogue::{DialogueLine, DialogueTokens, EncounterDialogue, OptionDialogue};
use crate::error::{ConfigError, EncounterError};
use crate::option::EncounterOption;
use crate::requirements::{PokemonRequirement, SceneRequirement};
use crate::session::PhaseScope;
use crate::types::{EncounterTier, EncounterType, EncounterVariant, ItemKey, TextKey};

const MIN_OPTIONS: usize = 2;
const MAX_OPTIONS: usize = 4;

/// Append-only encounter builder. `build` checks the encounter type, the
/// tier and the option count.
#[derive(Default)]
pub struct EncounterBuilder {
    encounter_type: Option<EncounterType>,
    tier: Option<EncounterTier>,
    options: Vec<EncounterOption>,
    sprite_configs: Vec<SpriteConfig>,
    dialogue: EncounterDialogue,
    scene_requirements: Vec<SceneRequirement>,
    primary_requirements: Vec<PokemonRequirement>,
    secondary_requirements: Vec<PokemonRequirement>,
    exclude_primary_from_secondary: bool,
    hooks: EncounterHooks,
    flags: EncounterFlags,
    max_allowed_encounters: Option<u32>,
    enemy_party_configs: Vec<EnemyPartyConfig>,
    start_of_battle_effects: Vec<StartOfBattleEffect>,
    error: Option<ConfigError>,
}

impl EncounterBuilder {
    fn record_scene(mut self, requirement: Result<SceneRequirement, ConfigError>) -> Self {
        match requirement {
            Ok(requirement) => self.scene_requirements.push(requirement),
            Err(error) => {
                self.error.get_or_insert(error);
            }
        }
        self
    }

    pub fn with_encounter_type(mut self, encounter_type: impl Into<EncounterType>) -> Self {
        self.encounter_type = Some(encounter_type.into());
        self
    }

    pub fn with_encounter_tier(mut self, tier: EncounterTier) -> Self {
        self.tier = Some(tier);
        self
    }

    pub fn with_option(mut self, option: EncounterOption) -> Self {
        self.options.push(option);
        self
    }

    /// Appends a default-mode option whose only phase is the option phase.
    pub fn with_simple_option(
        self,
        dialogue: OptionDialogue,
        phase: impl Fn(&mut PhaseScope<'_>) -> Result<(), EncounterError> + 'static,
    ) -> Self {
        self.with_option(EncounterOption::simple(dialogue, phase))
    }

    pub fn with_sprite_configs(mut self, sprites: Vec<SpriteConfig>) -> Self {
        self.sprite_configs.extend(sprites);
        self
    }

    pub fn with_intro_dialogue(mut self, lines: Vec<DialogueLine>) -> Self {
        self.dialogue.intro.extend(lines);
        self
    }

    pub fn with_title(mut self, key: impl Into<TextKey>) -> Self {
        self.dialogue.title = Some(key.into());
        self
    }

    pub fn with_description(mut self, key: impl Into<TextKey>) -> Self {
        self.dialogue.description = Some(key.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<TextKey>) -> Self {
        self.dialogue.query = Some(key.into());
        self
    }

    pub fn with_outro_dialogue(mut self, lines: Vec<DialogueLine>) -> Self {
        self.dialogue.outro.extend(lines);
        self
    }

    pub fn with_scene_requirement(mut self, requirement: SceneRequirement) -> Self {
        self.scene_requirements.push(requirement);
        self
    }

    pub fn with_scene_wave_range_requirement(self, waves: RangeInclusive<u32>) -> Self {
        self.record_scene(SceneRequirement::wave_range(waves))
    }

    pub fn with_scene_party_size_requirement(
        self,
        size: RangeInclusive<usize>,
        exclude_fainted: bool,
    ) -> Self {
        self.record_scene(SceneRequirement::party_size(size, exclude_fainted))
    }

    pub fn with_scene_money_requirement(self, required: u64, scaling_multiplier: f64) -> Self {
        self.with_scene_requirement(SceneRequirement::money(required, scaling_multiplier))
    }

    pub fn with_scene_persistent_modifier_requirement(
        self,
        items: Vec<ItemKey>,
        min_count: u32,
    ) -> Self {
        self.record_scene(SceneRequirement::persistent_modifier(items, min_count))
    }

    pub fn with_primary_pokemon_requirement(
        mut self,
        requirement: impl Into<PokemonRequirement>,
    ) -> Self {
        self.primary_requirements.push(requirement.into());
        self
    }

    pub fn with_secondary_pokemon_requirement(
        mut self,
        requirement: impl Into<PokemonRequirement>,
        exclude_primary: bool,
    ) -> Self {
        self.secondary_requirements.push(requirement.into());
        self.exclude_primary_from_secondary = exclude_primary;
        self
    }

    pub fn with_enemy_party_config(mut self, config: EnemyPartyConfig) -> Self {
        self.enemy_party_configs.push(config);
        self
    }

    pub fn with_start_of_battle_effects(mut self, effects: Vec<StartOfBattleEffect>) -> Self {
        self.start_of_battle_effects.extend(effects);
        self
    }

    pub fn with_max_allowed_encounters(mut self, max_allowed: u32) -> Self {
        self.max_allowed_encounters = Some(max_allowed);
        self
    }

    pub fn with_catch_allowed(mut self, catch_allowed: bool) -> Self {
        self.flags.catch_allowed = catch_allowed;
        self
    }

    pub fn with_flee_allowed(mut self, flee_allowed: bool) -> Self {
        self.flags.flee_allowed = flee_allowed;
        self
    }

    pub fn with_hide_battle_intro_message(mut self, hide: bool) -> Self {
        self.flags.hide_battle_intro_message = hide;
        self
    }

    pub fn with_auto_hide_intro_visuals(mut self, auto_hide: bool) -> Self {
        self.flags.auto_hide_intro_visuals = auto_hide;
        self
    }

    pub fn with_continuous_encounter(mut self, continuous: bool) -> Self {
        self.flags.continuous_encounter = continuous;
        self
    }

    pub fn with_skip_to_fight_input(mut self, skip: bool) -> Self {
        self.flags.skip_to_fight_input = skip;
        self
    }

    pub fn with_skip_enemy_battle_turns(mut self, skip: bool) -> Self {
        self.flags.skip_enemy_battle_turns = skip;
        self
    }

    pub fn with_prevent_game_stats_updates(mut self, prevent: bool) -> Self {
        self.flags.prevent_game_stats_updates = prevent;
        self
    }

    pub fn with_lock_encounter_reward_tiers(mut self, lock: bool) -> Self {
        self.flags.lock_encounter_reward_tiers = lock;
        self
    }

    pub fn with_battle_animations_without_targets(mut self, enabled: bool) -> Self {
        self.flags.has_battle_animations_without_targets = enabled;
        self
    }

    pub fn with_on_init(
        mut self,
        hook: impl Fn(&mut PhaseScope<'_>) -> Result<(), EncounterError> + 'static,
    ) -> Self {
        self.hooks.on_init = Some(Rc::new(hook));
        self
    }

    pub fn with_on_visuals_start(
        mut self,
        hook: impl Fn(&mut PhaseScope<'_>) -> Result<(), EncounterError> + 'static,
    ) -> Self {
        self.hooks.on_visuals_start = Some(Rc::new(hook));
        self
    }

    pub fn with_on_rewards(
        mut self,
        hook: impl Fn(&mut PhaseScope<'_>) -> Result<(), EncounterError> + 'static,
    ) -> Self {
        self.hooks.on_rewards = Some(Rc::new(hook));
        self
    }

    pub fn with_on_game_over(
        mut self,
        hook: impl Fn(&mut PhaseScope<'_>) -> Result<(), EncounterError> + 'static,
    ) -> Self {
        self.hooks.on_game_over = Some(Rc::new(hook));
        self
    }

    pub fn with_on_turn_start(
        mut self,
        hook: impl Fn(&mut PhaseScope<'_>) -> Result<(), EncounterError> + 'static,
    ) -> Self {
        self.hooks.on_turn_start = Some(Rc::new(hook));
        self
    }

    pub fn build(self) -> Result<Encounter, ConfigError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let encounter_type = self.encounter_type.ok_or(ConfigError::MissingEncounterType)?;
        let tier = self.tier.ok_or_else(|| ConfigError::MissingTier(encounter_type.clone()))?;
        let count = self.options.len();
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&count) {
            return Err(ConfigError::OptionCount { encounter_type, count });
        }
        Ok(Encounter {
            encounter_type,
            tier,
            options: self.options,
            sprite_configs: self.sprite_configs,
            dialogue: self.dialogue,
            scene_requirements: self.scene_requirements,
            primary_requirements: self.primary_requirements,
            secondary_requirements: self.secondary_requirements,
            exclude_primary_from_secondary: self.exclude_primary_from_secondary,
            hooks: self.hooks,
            max_allowed_encounters: self
                .max_allowed_encounters
                .unwrap_or_else(|| tier.default_max_allowed_encounters()),
            flags: self.flags,
            variant: EncounterVariant::Default,
            dialogue_tokens: DialogueTokens::default(),
            enemy_party_configs: self.enemy_party_configs,
            start_of_battle_effects: self.start_of_battle_effects,
            exp_multiplier: 1.0,
            misc: MiscSlot::default(),
            selected_option: None,
            seed_offset: None,
            binding: PokemonBinding::default(),
            reward_hook: None,
            exp_hook: None,
        })
    }
}
