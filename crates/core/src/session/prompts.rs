//! Option prompt state and interrupt conversion.
//! This module exists to isolate prompt lifecycle and ID stability logic.
//! It does not own what a selected option does once accepted.

use super::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct PendingPrompt {
    pub(super) id: ChoicePromptId,
    pub(super) subsequent: bool,
    pub(super) options: Vec<OptionView>,
}

impl PendingPrompt {
    pub(super) fn to_interrupt(&self) -> Interrupt {
        Interrupt::OptionSelect { prompt_id: self.id, options: self.options.clone() }
    }
}

impl EncounterSession {
    pub(super) fn interrupt_option_select(&mut self, subsequent: bool) -> AdvanceStopReason {
        let offset = self.encounter.update_seed_offset(self.run.wave_index);
        tracing::debug!(offset, subsequent, "option selection opened");
        self.issue_option_prompt(subsequent)
    }

    /// Re-evaluates the options at the current offset without advancing it.
    pub(super) fn issue_option_prompt(&mut self, subsequent: bool) -> AdvanceStopReason {
        let options = self.encounter.evaluate_options(&self.run);
        self.transition(EncounterState::AwaitingOptionSelection);
        let prompt = PendingPrompt { id: ChoicePromptId(self.inputs.next_seq), subsequent, options };
        let interrupt = prompt.to_interrupt();
        self.pending_prompt = Some(prompt);
        AdvanceStopReason::Interrupted(interrupt)
    }

    pub fn apply_choice(
        &mut self,
        prompt_id: ChoicePromptId,
        choice: Choice,
    ) -> Result<(), EncounterError> {
        let Some(prompt) = self.pending_prompt.clone() else {
            return Err(EncounterError::PromptMismatch);
        };
        if prompt.id != prompt_id {
            return Err(EncounterError::PromptMismatch);
        }

        let Choice::SelectOption(index) = choice;
        let selectable = prompt.options.get(index).is_some_and(|view| view.selectable);
        if !selectable {
            return Err(EncounterError::InvalidChoice(index));
        }

        self.pending_prompt = None;
        self.inputs.record(InputPayload::Choice { prompt_id, choice });
        self.resolve_option(index, prompt.subsequent)
    }
}
