//! Encounter session state machine and the phase queue it drains.
//! This module exists to sequence an encounter's hooks and option phases
//! around the interrupt/choice protocol and to record every external input.
//! It does not own eligibility or binding rules; see `encounter` and `option`.

use std::collections::VecDeque;

use crate::blueprint::EnemyParty;
use crate::collaborators::Collaborators;
use crate::encounter::Encounter;
use crate::error::EncounterError;
use crate::journal::{InputJournal, InputPayload};
use crate::party_utils::random_player_pokemon;
use crate::rewards::RewardResolution;
use crate::seed::{SeededRng, wave_seed_offset};
use crate::state::{PartyMember, RunState};
use crate::types::*;

mod handoff;
mod hash;
mod phases;
mod prompts;


use prompts::PendingPrompt;

#[derive(Debug)]
pub(crate) enum Phase {
    /// `subsequent` marks a follow-up selection inside the same encounter.
    OptionSelect { subsequent: bool },
    Battle(Box<EnemyParty>),
    Rewards { add_heal: bool },
    PostOption,
    EggLapse,
    GameOver,
}

#[derive(Debug, Default)]
pub(crate) struct PhaseQueue {
    phases: VecDeque<Phase>,
}

impl PhaseQueue {
    pub(crate) fn push(&mut self, phase: Phase) {
        self.phases.push_back(phase);
    }

    fn pop(&mut self) -> Option<Phase> {
        self.phases.pop_front()
    }

    pub(crate) fn clear(&mut self) {
        self.phases.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

#[derive(Debug)]
struct InputLog {
    journal: InputJournal,
    next_seq: u64,
}

impl InputLog {
    fn record(&mut self, payload: InputPayload) {
        self.journal.append(payload, self.next_seq);
        self.next_seq += 1;
    }
}

/// Context handed to every encounter callback.
///
/// Random draws made through [`PhaseScope::rng`] are scoped to the seed
/// offset of the phase being run, so a replayed session repeats them.
pub struct PhaseScope<'a> {
    pub run: &'a mut RunState,
    pub encounter: &'a mut Encounter,
    rng: SeededRng,
    queue: &'a mut PhaseQueue,
    collaborators: &'a mut Collaborators,
    log: &'a mut Vec<LogEvent>,
    inputs: &'a mut InputLog,
}

impl PhaseScope<'_> {
    pub fn rng(&mut self) -> &mut SeededRng {
        &mut self.rng
    }

    pub fn party_member(&self, pokemon: PokemonId) -> Result<&PartyMember, EncounterError> {
        self.run.party.get(pokemon).ok_or(EncounterError::UnknownPokemon)
    }

    pub fn party_member_mut(&mut self, pokemon: PokemonId) -> Result<&mut PartyMember, EncounterError> {
        self.run.party.get_mut(pokemon).ok_or(EncounterError::UnknownPokemon)
    }

    /// Random member drawn with this phase's rng; see
    /// [`random_player_pokemon`] for the pool rules.
    pub fn random_party_member(
        &mut self,
        allowed_only: bool,
        include_fainted: bool,
        do_not_return_last_allowed: bool,
    ) -> Option<PokemonId> {
        random_player_pokemon(
            &self.run.party,
            &mut self.rng,
            allowed_only,
            include_fainted,
            do_not_return_last_allowed,
        )
    }

    /// Asks the selection UI for a member passing `filter`. `None` is a cancel.
    pub fn select_party_member(
        &mut self,
        filter: impl Fn(&PartyMember) -> bool,
    ) -> Option<PokemonId> {
        let chosen = self.collaborators.ui.select_party_member(&self.run.party, &filter);
        let slot = chosen
            .filter(|id| self.run.party.get(*id).is_some_and(&filter))
            .and_then(|id| self.run.party.slot_of(id));
        self.inputs.record(InputPayload::PartySelection { slot });
        slot.and_then(|slot| self.run.party.at_slot(slot))
    }

    /// Asks the selection UI for one of `count` sub-options. `None` is a cancel.
    pub fn select_option(&mut self, count: usize) -> Option<usize> {
        let index = self.collaborators.ui.select_option(count).filter(|index| *index < count);
        self.inputs.record(InputPayload::SubOption { index });
        index
    }

    pub fn set_dialogue_token(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.encounter.dialogue_tokens.set(key, value);
    }

    /// Queues another option prompt for the same encounter instance.
    pub fn init_subsequent_option_select(&mut self) {
        self.queue.push(Phase::OptionSelect { subsequent: true });
    }
}

/// One encounter from spawn to its terminal outcome.
pub struct EncounterSession {
    run: RunState,
    encounter: Encounter,
    collaborators: Collaborators,
    queue: PhaseQueue,
    state: EncounterState,
    log: Vec<LogEvent>,
    inputs: InputLog,
    pending_prompt: Option<PendingPrompt>,
    battle_in_progress: bool,
    history_recorded: bool,
    rewards: Option<RewardResolution>,
    finished_outcome: Option<EncounterOutcome>,
}

impl EncounterSession {
    pub fn new(run: RunState, encounter: Encounter, collaborators: Collaborators) -> Self {
        let journal = InputJournal::new(encounter.encounter_type().clone(), run.clone());
        Self {
            run,
            encounter,
            collaborators,
            queue: PhaseQueue::default(),
            state: EncounterState::Uninitialized,
            log: Vec::new(),
            inputs: InputLog { journal, next_seq: 0 },
            pending_prompt: None,
            battle_in_progress: false,
            history_recorded: false,
            rewards: None,
            finished_outcome: None,
        }
    }

    /// Runs `on_init`, presents the intro visuals and queues the first prompt.
    /// `advance` calls this on its own for a fresh session.
    pub fn start(&mut self) -> Result<(), EncounterError> {
        if self.state != EncounterState::Uninitialized {
            return Err(EncounterError::WrongState(self.state));
        }
        tracing::info!(
            encounter = %self.encounter.encounter_type(),
            wave = self.run.wave_index,
            "encounter started"
        );
        self.transition(EncounterState::Init);
        self.encounter.populate_dialogue_tokens_from_requirements(&self.run);

        let offset = wave_seed_offset(self.run.wave_index);
        if let Some(hook) = self.encounter.hooks.on_init.clone() {
            self.run_phase(offset, |scope| hook(scope))?;
        }

        self.collaborators.visuals.show_intro(self.encounter.sprite_configs());
        self.transition(EncounterState::VisualsShown);
        if let Some(hook) = self.encounter.hooks.on_visuals_start.clone() {
            self.run_phase(offset, |scope| hook(scope))?;
        }

        self.queue.push(Phase::OptionSelect { subsequent: false });
        Ok(())
    }

    pub fn advance(&mut self) -> Result<AdvanceStopReason, EncounterError> {
        if let Some(outcome) = &self.finished_outcome {
            return Ok(AdvanceStopReason::Finished(outcome.clone()));
        }
        if let Some(prompt) = &self.pending_prompt {
            return Ok(AdvanceStopReason::Interrupted(prompt.to_interrupt()));
        }
        if self.battle_in_progress {
            return Ok(AdvanceStopReason::BattleStarted);
        }
        if self.state == EncounterState::Uninitialized {
            self.start()?;
        }

        while let Some(phase) = self.queue.pop() {
            match phase {
                Phase::OptionSelect { subsequent } => {
                    return Ok(self.interrupt_option_select(subsequent));
                }
                Phase::Battle(party) => return Ok(self.begin_battle(*party)),
                Phase::Rewards { add_heal } => self.resolve_rewards(add_heal)?,
                Phase::PostOption => self.run_post_option()?,
                Phase::EggLapse => self.log.push(LogEvent::EggsLapsed),
                Phase::GameOver => {
                    let outcome = self.run_game_over()?;
                    return Ok(AdvanceStopReason::Finished(outcome));
                }
            }
            if let Some(outcome) = &self.finished_outcome {
                return Ok(AdvanceStopReason::Finished(outcome.clone()));
            }
        }
        Ok(AdvanceStopReason::Finished(self.finish(EncounterOutcome::Completed)))
    }

    /// Runs the encounter's turn-start hook while a battle is in progress.
    pub fn on_turn_start(&mut self) -> Result<(), EncounterError> {
        if !self.battle_in_progress {
            return Err(EncounterError::WrongState(self.state));
        }
        let offset = self.encounter.seed_offset(self.run.wave_index);
        if let Some(hook) = self.encounter.on_turn_start_hook() {
            self.run_phase(offset, |scope| hook(scope))?;
        }
        Ok(())
    }

    pub fn state(&self) -> EncounterState {
        self.state
    }

    pub fn run(&self) -> &RunState {
        &self.run
    }

    /// Host access for battle results such as fainted members.
    pub fn run_mut(&mut self) -> &mut RunState {
        &mut self.run
    }

    pub fn encounter(&self) -> &Encounter {
        &self.encounter
    }

    pub fn log(&self) -> &[LogEvent] {
        &self.log
    }

    pub fn journal(&self) -> &InputJournal {
        &self.inputs.journal
    }

    pub fn rewards(&self) -> Option<&RewardResolution> {
        self.rewards.as_ref()
    }

    pub fn outcome(&self) -> Option<&EncounterOutcome> {
        self.finished_outcome.as_ref()
    }

    pub fn into_run(self) -> RunState {
        self.run
    }

    fn transition(&mut self, to: EncounterState) {
        if self.state == to {
            return;
        }
        tracing::debug!(from = ?self.state, to = ?to, "encounter state changed");
        self.log.push(LogEvent::StateChanged { from: self.state, to });
        self.state = to;
    }

    fn finish(&mut self, outcome: EncounterOutcome) -> EncounterOutcome {
        self.transition(EncounterState::Terminated);
        tracing::info!(
            encounter = %self.encounter.encounter_type(),
            outcome = ?outcome,
            "encounter finished"
        );
        self.finished_outcome = Some(outcome.clone());
        outcome
    }

    fn run_phase<T>(
        &mut self,
        offset: u64,
        phase: impl FnOnce(&mut PhaseScope<'_>) -> Result<T, EncounterError>,
    ) -> Result<T, EncounterError> {
        let rng = SeededRng::for_offset(self.run.seed, offset);
        let mut scope = PhaseScope {
            run: &mut self.run,
            encounter: &mut self.encounter,
            rng,
            queue: &mut self.queue,
            collaborators: &mut self.collaborators,
            log: &mut self.log,
            inputs: &mut self.inputs,
        };
        phase(&mut scope)
    }
}
