//! Battle handoff and the no-battle exit.
//! This module exists to materialize an enemy party config into the party
//! the battle engine instantiates and to queue what follows a battle.
//! It does not own battle simulation; the engine does.

use super::*;
use crate::blueprint::{
    EnemyPartyConfig, EnemyPokemon, EnemyPokemonConfig, ResolvedStatus, ResolvedTrainer,
    wave_level_additive,
};
use crate::option::PhaseFn;
use crate::rewards::{EggReward, ExpHook, RewardHook, ShopRewards};

/// Marks the encounter as battle-free and queues its rewards in place of
/// anything the option had queued.
pub(super) fn leave_without_battle(
    run: &RunState,
    encounter: &mut Encounter,
    queue: &mut PhaseQueue,
    log: &mut Vec<LogEvent>,
    add_heal: bool,
) {
    encounter.variant = EncounterVariant::NoBattle;
    queue.clear();
    log.push(LogEvent::LeftWithoutBattle { add_heal });
    queue_victory_phases(run, encounter, queue, add_heal);
}

pub(super) fn queue_victory_phases(
    run: &RunState,
    encounter: &Encounter,
    queue: &mut PhaseQueue,
    add_heal: bool,
) {
    if run.party.allowed_in_battle().is_empty() {
        queue.push(Phase::GameOver);
        return;
    }
    if encounter.flags.continuous_encounter {
        return;
    }
    queue.push(Phase::Rewards { add_heal });
    if encounter.variant == EncounterVariant::NoBattle {
        queue.push(Phase::EggLapse);
    }
}

/// A lost battle still pays out when someone is left standing. Continuous
/// encounters queue nothing.
pub(super) fn queue_defeat_phases(run: &RunState, encounter: &Encounter, queue: &mut PhaseQueue) {
    if run.party.allowed_in_battle().is_empty() {
        queue.push(Phase::GameOver);
        return;
    }
    if encounter.flags.continuous_encounter {
        return;
    }
    queue.push(Phase::Rewards { add_heal: false });
    queue.push(Phase::EggLapse);
}

impl PhaseScope<'_> {
    /// Builds the enemy party from `enemy_party_configs[index]`, loads its
    /// assets and queues the battle. Nothing is queued when loading fails.
    pub fn init_battle_with_enemy_config(&mut self, index: usize) -> Result<(), EncounterError> {
        let config = self
            .encounter
            .enemy_party_configs
            .get(index)
            .cloned()
            .ok_or(EncounterError::MissingEnemyConfig(index))?;
        let party = self.materialize_party(&config);

        if let Err(error) = self.collaborators.battle.load_assets(&party) {
            tracing::warn!(%error, "enemy party assets failed to load");
            self.log.push(LogEvent::AssetLoadFailed { asset: error.asset.clone() });
            return Err(error.into());
        }

        tracing::debug!(variant = ?party.variant, enemies = party.members.len(), "battle queued");
        self.encounter.variant = party.variant;
        self.log.push(LogEvent::BattleQueued { variant: party.variant, enemies: party.members.len() });
        self.queue.push(Phase::Battle(Box::new(party)));
        Ok(())
    }

    fn materialize_party(&mut self, config: &EnemyPartyConfig) -> EnemyParty {
        let wave_index = self.run.wave_index;
        let trainer = config.trainer.as_ref().map(|trainer| ResolvedTrainer {
            trainer_type: trainer.trainer_type.clone(),
            female: trainer.female.unwrap_or_else(|| self.rng.coin_flip()),
            double: trainer.double || config.double_battle,
        });
        let trainer_levels = trainer
            .as_ref()
            .map(|trainer| self.collaborators.battle.trainer_party_levels(&trainer.trainer_type, wave_index))
            .unwrap_or_default();

        let variant = if trainer.is_some() {
            EncounterVariant::TrainerBattle
        } else if config.pokemon.iter().any(|pokemon| pokemon.is_boss) {
            EncounterVariant::BossBattle
        } else {
            EncounterVariant::WildBattle
        };

        // Trainers field at least their own party size; a wild party with no
        // blueprints fields one enemy per battle slot.
        let count = if trainer.is_some() {
            config.pokemon.len().max(trainer_levels.len()).max(1)
        } else if config.pokemon.is_empty() {
            if config.double_battle { 2 } else { 1 }
        } else {
            config.pokemon.len()
        };
        let additive = wave_level_additive(wave_index, config.level_additive_multiplier);
        let members = (0..count)
            .map(|slot| {
                let blueprint = config.pokemon.get(slot).cloned().unwrap_or_default();
                let level = match blueprint.level {
                    Some(level) => level,
                    None => {
                        let base = trainer_levels
                            .get(slot)
                            .copied()
                            .unwrap_or_else(|| self.collaborators.battle.level_for_wave(wave_index));
                        base + additive
                    }
                };
                self.materialize_pokemon(blueprint, level)
            })
            .collect();

        EnemyParty {
            variant,
            double_battle: config.double_battle || trainer.as_ref().is_some_and(|trainer| trainer.double),
            trainer,
            members,
            disable_switch: config.disable_switch,
            count_as_seen: config.count_as_seen,
            exp_multiplier: self.encounter.exp_multiplier,
            catch_allowed: self.encounter.flags.catch_allowed,
            flee_allowed: self.encounter.flags.flee_allowed,
            start_of_battle_effects: self.encounter.start_of_battle_effects.clone(),
        }
    }

    fn materialize_pokemon(&mut self, blueprint: EnemyPokemonConfig, level: u32) -> EnemyPokemon {
        let wave_index = self.run.wave_index;
        let species = match blueprint.species {
            Some(species) => species,
            None => self.collaborators.battle.wild_species(wave_index, level, &mut self.rng),
        };
        let boss_segments = if blueprint.is_boss {
            let segments = blueprint
                .boss_segments
                .unwrap_or_else(|| self.collaborators.battle.boss_segments(wave_index, level, &species));
            (i64::from(segments) + i64::from(blueprint.boss_segment_modifier)).max(1) as u32
        } else {
            0
        };
        EnemyPokemon {
            species,
            level,
            boss_segments,
            nickname: blueprint.nickname,
            form_index: blueprint.form_index,
            shiny: blueprint.shiny,
            variant: blueprint.variant,
            passive: blueprint.passive,
            nature: blueprint.nature,
            ivs: blueprint.ivs,
            status: blueprint.status.map(ResolvedStatus::from),
            ability_index: blueprint.ability_index,
            gender: blueprint.gender,
            moveset: blueprint.move_set,
            tags: blueprint.tags,
            held_items: blueprint.held_items,
            on_summon: blueprint.on_summon,
        }
    }

    /// Replaces any reward hook installed earlier in this encounter.
    pub fn set_encounter_rewards(
        &mut self,
        shop: Option<ShopRewards>,
        items: Vec<ItemKey>,
        eggs: Vec<EggReward>,
        pre_callback: Option<PhaseFn>,
    ) {
        self.encounter.reward_hook = Some(RewardHook { shop, items, eggs, pre_callback });
    }

    /// Replaces any experience hook installed earlier in this encounter.
    pub fn set_encounter_exp(&mut self, participants: Vec<PokemonId>, base_exp: u32, use_wave_index: bool) {
        self.encounter.exp_hook = Some(ExpHook { participants, base_exp, use_wave_index });
    }

    pub fn leave_encounter_without_battle(&mut self, add_heal: bool) {
        leave_without_battle(self.run, self.encounter, self.queue, self.log, add_heal);
    }
}
