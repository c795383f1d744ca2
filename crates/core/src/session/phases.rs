//! Option resolution and the phases queued after it.
//! This module exists to run the pre, main and post option phases at their
//! seed offsets and to resolve battle outcomes into rewards or a game over.
//! It does not own enemy party construction; see `handoff`.

use super::handoff::{leave_without_battle, queue_defeat_phases, queue_victory_phases};
use super::*;
use crate::journal::MemberCondition;
use crate::option::PreOptionSignal;
use crate::rewards::{ShopRewards, apply_exp};
use crate::seed::{OPTION_PHASE_OFFSET_FACTOR, POST_OPTION_PHASE_OFFSET_FACTOR};
use crate::state::EncounteredEvent;

impl EncounterSession {
    pub(super) fn resolve_option(
        &mut self,
        index: usize,
        subsequent: bool,
    ) -> Result<(), EncounterError> {
        let wave_index = self.run.wave_index;
        let offset = self.encounter.seed_offset(wave_index);
        if !subsequent {
            self.record_history(index);
        }
        self.encounter.selected_option = Some(index);
        self.log.push(LogEvent::OptionSelected { index, seed_offset: offset });
        tracing::info!(option = index, offset, "option selected");
        self.transition(EncounterState::OptionResolving);

        self.encounter.populate_dialogue_tokens_from_requirements(&self.run);
        let Some(option) = self.encounter.option(index) else {
            return Err(EncounterError::InvalidChoice(index));
        };
        let pre_option = option.pre_option_phase();
        let option_phase = option.option_phase();

        if let Some(pre_option) = pre_option {
            let signal = self.run_phase(offset, |scope| pre_option(scope))?;
            if signal == PreOptionSignal::Abort {
                tracing::debug!(option = index, "pre-option phase aborted");
                self.log.push(LogEvent::PreOptionAborted { index });
                self.issue_option_prompt(subsequent);
                return Ok(());
            }
        }

        if self.encounter.flags.auto_hide_intro_visuals {
            self.collaborators.visuals.hide_intro();
        }

        let result = self.run_phase(offset * OPTION_PHASE_OFFSET_FACTOR, |scope| option_phase(scope));
        match result {
            Err(EncounterError::AssetLoad(error)) => {
                tracing::warn!(%error, "battle assets failed to load, returning to map");
                self.queue.clear();
                self.finish(EncounterOutcome::Aborted);
                return Ok(());
            }
            other => other?,
        }

        if self.queue.is_empty() && !self.encounter.flags.continuous_encounter {
            leave_without_battle(
                &self.run,
                &mut self.encounter,
                &mut self.queue,
                &mut self.log,
                false,
            );
        }
        Ok(())
    }

    /// The first selection of an encounter adds it to the run history; a
    /// reselection after an aborted pre-option phase only updates the choice.
    fn record_history(&mut self, index: usize) {
        if self.history_recorded {
            if let Some(event) = self.run.history.events.last_mut() {
                event.selected_option = Some(index);
            }
            return;
        }
        self.run.history.record(EncounteredEvent {
            encounter_type: self.encounter.encounter_type().clone(),
            tier: self.encounter.tier(),
            wave_index: self.run.wave_index,
            selected_option: Some(index),
        });
        self.history_recorded = true;
    }

    pub(super) fn begin_battle(&mut self, party: EnemyParty) -> AdvanceStopReason {
        self.transition(EncounterState::BattleHandoff);
        tracing::info!(variant = ?party.variant, enemies = party.members.len(), "battle started");
        self.collaborators.battle.start_battle(party);
        self.log.push(LogEvent::BattleStarted);
        self.battle_in_progress = true;
        AdvanceStopReason::BattleStarted
    }

    pub fn report_battle_outcome(&mut self, outcome: BattleOutcome) -> Result<(), EncounterError> {
        if !self.battle_in_progress {
            return Err(EncounterError::WrongState(self.state));
        }
        self.battle_in_progress = false;
        let party = MemberCondition::capture(&self.run.party);
        self.inputs.record(InputPayload::BattleOutcome { outcome, party });
        self.log.push(LogEvent::BattleEnded { outcome });

        match outcome {
            BattleOutcome::Victory => {
                queue_victory_phases(&self.run, &self.encounter, &mut self.queue, false);
            }
            BattleOutcome::Defeat => queue_defeat_phases(&self.run, &self.encounter, &mut self.queue),
        }
        Ok(())
    }

    pub(super) fn resolve_rewards(&mut self, add_heal: bool) -> Result<(), EncounterError> {
        if self.encounter.variant == EncounterVariant::NoBattle {
            self.transition(EncounterState::NoBattleRewards);
        }
        let offset = wave_seed_offset(self.run.wave_index);
        if let Some(hook) = self.encounter.hooks.on_rewards.clone() {
            self.run_phase(offset, |scope| hook(scope))?;
        }

        if let Some(exp_hook) = self.encounter.exp_hook.clone() {
            for grant in apply_exp(&mut self.run, &exp_hook, self.encounter.variant) {
                self.log.push(LogEvent::ExpGranted { pokemon: grant.pokemon, exp: grant.exp });
            }
        }

        let lock_reward_tiers = self.encounter.flags.lock_encounter_reward_tiers;
        let resolution = match self.encounter.reward_hook.clone() {
            Some(hook) => {
                if let Some(pre_callback) = hook.pre_callback {
                    self.run_phase(offset, |scope| pre_callback(scope))?;
                }
                RewardResolution {
                    shop: hook.shop,
                    items: hook.items,
                    eggs: hook.eggs,
                    heal: add_heal,
                    lock_reward_tiers,
                }
            }
            None => RewardResolution {
                shop: (!add_heal).then(ShopRewards::standard),
                heal: add_heal,
                lock_reward_tiers,
                ..RewardResolution::default()
            },
        };

        tracing::info!(
            items = resolution.items.len(),
            eggs = resolution.eggs.len(),
            shop = resolution.shop.is_some(),
            heal = resolution.heal,
            "encounter rewards resolved"
        );
        self.log.push(LogEvent::RewardsResolved {
            items: resolution.items.len(),
            shop: resolution.shop.is_some(),
            heal: resolution.heal,
        });
        self.rewards = Some(resolution);
        self.queue.push(Phase::PostOption);
        Ok(())
    }

    pub(super) fn run_post_option(&mut self) -> Result<(), EncounterError> {
        let offset = self.encounter.seed_offset(self.run.wave_index);
        let post_option = self
            .encounter
            .selected_option
            .and_then(|index| self.encounter.option(index))
            .and_then(|option| option.post_option_phase());
        if let Some(post_option) = post_option {
            self.run_phase(offset * POST_OPTION_PHASE_OFFSET_FACTOR, |scope| post_option(scope))?;
        }
        Ok(())
    }

    pub(super) fn run_game_over(&mut self) -> Result<EncounterOutcome, EncounterError> {
        let offset = self.encounter.seed_offset(self.run.wave_index);
        if let Some(hook) = self.encounter.hooks.on_game_over.clone() {
            self.run_phase(offset, |scope| hook(scope))?;
        }
        self.log.push(LogEvent::GameOver);
        Ok(self.finish(EncounterOutcome::GameOver))
    }
}
