//! A single selectable branch of an encounter.

use std::fmt;
use std::rc::Rc;

use crate::binding::{PokemonBinding, PrimaryPick, pokemon_meets_requirements};
use crate::dialogue::OptionDialogue;
use crate::error::{ConfigError, EncounterError};
use crate::requirements::{PokemonCriterion, PokemonPredicate, PokemonRequirement, SceneRequirement};
use crate::seed::SeededRng;
use crate::session::PhaseScope;
use crate::state::RunState;
use crate::types::{ElementType, MoveKey, OptionMode, OptionPresentation, PokemonId};

/// Result of a pre-option phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreOptionSignal {
    Proceed,
    /// Return to option selection without running the option phase.
    Abort,
}

impl From<bool> for PreOptionSignal {
    fn from(proceed: bool) -> Self {
        if proceed { Self::Proceed } else { Self::Abort }
    }
}

pub type PhaseFn = Rc<dyn Fn(&mut PhaseScope<'_>) -> Result<(), EncounterError>>;
pub type PreOptionFn = Rc<dyn Fn(&mut PhaseScope<'_>) -> Result<PreOptionSignal, EncounterError>>;

#[derive(Clone)]
pub struct EncounterOption {
    mode: OptionMode,
    has_dex_progress: bool,
    scene_requirements: Vec<SceneRequirement>,
    primary_requirements: Vec<PokemonRequirement>,
    secondary_requirements: Vec<PokemonRequirement>,
    exclude_primary_from_secondary: bool,
    dialogue: OptionDialogue,
    pre_option: Option<PreOptionFn>,
    option_phase: PhaseFn,
    post_option: Option<PhaseFn>,
    binding: PokemonBinding,
}

impl fmt::Debug for EncounterOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncounterOption")
            .field("mode", &self.mode)
            .field("scene_requirements", &self.scene_requirements.len())
            .field("primary_requirements", &self.primary_requirements.len())
            .field("secondary_requirements", &self.secondary_requirements.len())
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

impl EncounterOption {
    pub fn builder(mode: OptionMode) -> OptionBuilder {
        OptionBuilder::new(mode)
    }

    /// A default-mode option whose only phase is the option phase.
    pub fn simple(
        dialogue: OptionDialogue,
        phase: impl Fn(&mut PhaseScope<'_>) -> Result<(), EncounterError> + 'static,
    ) -> Self {
        Self {
            mode: OptionMode::Default,
            has_dex_progress: false,
            scene_requirements: Vec::new(),
            primary_requirements: Vec::new(),
            secondary_requirements: Vec::new(),
            exclude_primary_from_secondary: false,
            dialogue,
            pre_option: None,
            option_phase: Rc::new(phase),
            post_option: None,
            binding: PokemonBinding::default(),
        }
    }

    pub fn mode(&self) -> OptionMode {
        self.mode
    }

    pub fn dialogue(&self) -> &OptionDialogue {
        &self.dialogue
    }

    pub fn has_dex_progress(&self) -> bool {
        self.has_dex_progress
    }

    pub fn scene_requirements(&self) -> &[SceneRequirement] {
        &self.scene_requirements
    }

    pub fn primary_requirements(&self) -> &[PokemonRequirement] {
        &self.primary_requirements
    }

    pub fn secondary_requirements(&self) -> &[PokemonRequirement] {
        &self.secondary_requirements
    }

    pub fn has_requirements(&self) -> bool {
        !self.scene_requirements.is_empty()
            || !self.primary_requirements.is_empty()
            || !self.secondary_requirements.is_empty()
    }

    /// Scene requirements, then secondary binding, then primary binding.
    pub fn meets_requirements(&mut self, run: &RunState, rng: &mut SeededRng) -> bool {
        if !self.scene_requirements.iter().all(|requirement| requirement.meets_requirement(run)) {
            self.binding.clear();
            return false;
        }
        if !self.meets_secondary_requirement_and_secondary_pokemon_selected(run) {
            self.binding.primary = None;
            return false;
        }
        self.meets_primary_requirement_and_primary_pokemon_selected(run, rng)
    }

    pub fn meets_primary_requirement_and_primary_pokemon_selected(
        &mut self,
        run: &RunState,
        rng: &mut SeededRng,
    ) -> bool {
        self.binding.bind_primary(
            run,
            &self.primary_requirements,
            self.exclude_primary_from_secondary,
            PrimaryPick::FirstQualified,
            rng,
        )
    }

    pub fn meets_secondary_requirement_and_secondary_pokemon_selected(
        &mut self,
        run: &RunState,
    ) -> bool {
        self.binding.bind_secondary(run, &self.secondary_requirements)
    }

    /// Narrow check for one member, without touching the cached binding.
    pub fn pokemon_meets_primary_requirements(&self, run: &RunState, pokemon: PokemonId) -> bool {
        pokemon_meets_requirements(run, &self.primary_requirements, pokemon)
    }

    pub fn primary_pokemon(&self) -> Option<PokemonId> {
        self.binding.primary
    }

    pub fn secondary_pokemon(&self) -> &[PokemonId] {
        &self.binding.secondary
    }

    pub fn presentation(&self, meets_requirements: bool) -> OptionPresentation {
        match (self.mode, meets_requirements) {
            (OptionMode::Default, _) => OptionPresentation::Default,
            (OptionMode::DisabledOrDefault, true) => OptionPresentation::Default,
            (OptionMode::DefaultOrSpecial, true) | (OptionMode::DisabledOrSpecial, true) => {
                OptionPresentation::Special
            }
            (OptionMode::DefaultOrSpecial, false) => OptionPresentation::Default,
            (OptionMode::DisabledOrDefault, false) | (OptionMode::DisabledOrSpecial, false) => {
                OptionPresentation::Disabled
            }
        }
    }

    pub fn is_selectable(&self, meets_requirements: bool) -> bool {
        self.presentation(meets_requirements) != OptionPresentation::Disabled
    }

    pub(crate) fn pre_option_phase(&self) -> Option<PreOptionFn> {
        self.pre_option.clone()
    }

    pub(crate) fn option_phase(&self) -> PhaseFn {
        Rc::clone(&self.option_phase)
    }

    pub(crate) fn post_option_phase(&self) -> Option<PhaseFn> {
        self.post_option.clone()
    }
}

/// Append-only builder. Requirement helpers that fail keep the first error
/// and report it from `build`.
pub struct OptionBuilder {
    mode: OptionMode,
    has_dex_progress: bool,
    scene_requirements: Vec<SceneRequirement>,
    primary_requirements: Vec<PokemonRequirement>,
    secondary_requirements: Vec<PokemonRequirement>,
    exclude_primary_from_secondary: bool,
    dialogue: OptionDialogue,
    pre_option: Option<PreOptionFn>,
    option_phase: Option<PhaseFn>,
    post_option: Option<PhaseFn>,
    error: Option<ConfigError>,
}

impl OptionBuilder {
    fn new(mode: OptionMode) -> Self {
        Self {
            mode,
            has_dex_progress: false,
            scene_requirements: Vec::new(),
            primary_requirements: Vec::new(),
            secondary_requirements: Vec::new(),
            exclude_primary_from_secondary: false,
            dialogue: OptionDialogue::default(),
            pre_option: None,
            option_phase: None,
            post_option: None,
            error: None,
        }
    }

    fn record(&mut self, result: Result<PokemonRequirement, ConfigError>) -> Option<PokemonRequirement> {
        match result {
            Ok(requirement) => Some(requirement),
            Err(error) => {
                self.error.get_or_insert(error);
                None
            }
        }
    }

    pub fn with_has_dex_progress(mut self, has_dex_progress: bool) -> Self {
        self.has_dex_progress = has_dex_progress;
        self
    }

    pub fn with_scene_requirement(mut self, requirement: SceneRequirement) -> Self {
        self.scene_requirements.push(requirement);
        self
    }

    pub fn with_scene_money_requirement(self, required: u64, scaling_multiplier: f64) -> Self {
        self.with_scene_requirement(SceneRequirement::money(required, scaling_multiplier))
    }

    pub fn with_primary_pokemon_requirement(
        mut self,
        requirement: impl Into<PokemonRequirement>,
    ) -> Self {
        self.primary_requirements.push(requirement.into());
        self
    }

    pub fn with_pokemon_type_requirement(
        mut self,
        types: Vec<ElementType>,
        exclude_fainted: bool,
        min_pokemon: usize,
    ) -> Self {
        let requirement = PokemonPredicate::new(PokemonCriterion::Type(types))
            .and_then(|predicate| predicate.with_min_pokemon(min_pokemon))
            .map(|predicate| PokemonRequirement::from(predicate.excluding_fainted(exclude_fainted)));
        if let Some(requirement) = self.record(requirement) {
            self.primary_requirements.push(requirement);
        }
        self
    }

    pub fn with_pokemon_can_learn_move_requirement(mut self, moves: Vec<MoveKey>) -> Self {
        let requirement = PokemonRequirement::new(PokemonCriterion::CompatibleMove(moves));
        if let Some(requirement) = self.record(requirement) {
            self.primary_requirements.push(requirement);
        }
        self
    }

    /// With `exclude_primary` set, primary binding avoids (or borrows from)
    /// the secondary pool.
    pub fn with_secondary_pokemon_requirement(
        mut self,
        requirement: impl Into<PokemonRequirement>,
        exclude_primary: bool,
    ) -> Self {
        self.secondary_requirements.push(requirement.into());
        self.exclude_primary_from_secondary = exclude_primary;
        self
    }

    pub fn with_dialogue(mut self, dialogue: OptionDialogue) -> Self {
        self.dialogue = dialogue;
        self
    }

    pub fn with_pre_option_phase(
        mut self,
        phase: impl Fn(&mut PhaseScope<'_>) -> Result<PreOptionSignal, EncounterError> + 'static,
    ) -> Self {
        self.pre_option = Some(Rc::new(phase));
        self
    }

    pub fn with_option_phase(
        mut self,
        phase: impl Fn(&mut PhaseScope<'_>) -> Result<(), EncounterError> + 'static,
    ) -> Self {
        self.option_phase = Some(Rc::new(phase));
        self
    }

    pub fn with_post_option_phase(
        mut self,
        phase: impl Fn(&mut PhaseScope<'_>) -> Result<(), EncounterError> + 'static,
    ) -> Self {
        self.post_option = Some(Rc::new(phase));
        self
    }

    pub fn build(self) -> Result<EncounterOption, ConfigError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let option_phase = self.option_phase.ok_or(ConfigError::MissingOptionPhase)?;
        Ok(EncounterOption {
            mode: self.mode,
            has_dex_progress: self.has_dex_progress,
            scene_requirements: self.scene_requirements,
            primary_requirements: self.primary_requirements,
            secondary_requirements: self.secondary_requirements,
            exclude_primary_from_secondary: self.exclude_primary_from_secondary,
            dialogue: self.dialogue,
            pre_option: self.pre_option,
            option_phase,
            post_option: self.post_option,
            binding: PokemonBinding::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PartyMember;
    use crate::types::SpeciesKey;

    fn noop(_: &mut PhaseScope<'_>) -> Result<(), EncounterError> {
        Ok(())
    }

    fn species(names: &[&str]) -> PokemonRequirement {
        PokemonRequirement::new(PokemonCriterion::Species(
            names.iter().map(|name| SpeciesKey::from(*name)).collect(),
        ))
        .expect("valid requirement")
    }

    #[test]
    fn build_requires_option_phase() {
        let result = EncounterOption::builder(OptionMode::Default).build();
        assert!(matches!(result, Err(ConfigError::MissingOptionPhase)));
    }

    #[test]
    fn failing_helper_surfaces_at_build() {
        let result = EncounterOption::builder(OptionMode::Default)
            .with_pokemon_can_learn_move_requirement(Vec::new())
            .with_option_phase(noop)
            .build();
        assert!(matches!(result, Err(ConfigError::EmptyTargets { .. })));
    }

    #[test]
    fn option_without_primary_requirements_binds_first_allowed_member() {
        let mut run = RunState::new(5, 10);
        let mut fainted = PartyMember::new("A", 10);
        fainted.hp = 0;
        run.party.add(fainted);
        let healthy = run.party.add(PartyMember::new("B", 10));

        let mut option = EncounterOption::simple(OptionDialogue::default(), noop);
        let mut rng = SeededRng::for_offset(run.seed, 10_000);
        assert!(!option.has_requirements());
        assert!(option.meets_primary_requirement_and_primary_pokemon_selected(&run, &mut rng));
        assert_eq!(option.primary_pokemon(), Some(healthy));
    }

    #[test]
    fn secondary_is_bound_before_primary() {
        let mut run = RunState::new(5, 10);
        let a = run.party.add(PartyMember::new("A", 10));
        let b = run.party.add(PartyMember::new("B", 10));
        let c = run.party.add(PartyMember::new("C", 10));

        let mut option = EncounterOption::builder(OptionMode::Default)
            .with_primary_pokemon_requirement(species(&["A", "B"]))
            .with_secondary_pokemon_requirement(species(&["B", "C"]), true)
            .with_option_phase(noop)
            .build()
            .expect("valid option");
        let mut rng = SeededRng::for_offset(run.seed, 10_000);

        assert!(option.meets_requirements(&run, &mut rng));
        assert_eq!(option.primary_pokemon(), Some(a));
        assert_eq!(option.secondary_pokemon(), &[b, c]);
        assert!(option.pokemon_meets_primary_requirements(&run, b));
        assert!(!option.pokemon_meets_primary_requirements(&run, c));
    }

    #[test]
    fn failed_scene_requirement_clears_stale_binding() {
        let mut run = RunState::new(5, 10);
        run.party.add(PartyMember::new("A", 10));
        let mut option = EncounterOption::builder(OptionMode::DisabledOrDefault)
            .with_scene_money_requirement(1_000, 0.0)
            .with_option_phase(noop)
            .build()
            .expect("valid option");
        let mut rng = SeededRng::for_offset(run.seed, 10_000);

        run.money = 1_000;
        assert!(option.meets_requirements(&run, &mut rng));
        assert!(option.primary_pokemon().is_some());

        run.money = 0;
        assert!(!option.meets_requirements(&run, &mut rng));
        assert_eq!(option.primary_pokemon(), None);
    }

    #[test]
    fn presentation_follows_mode() {
        let build = |mode| {
            EncounterOption::builder(mode).with_option_phase(noop).build().expect("valid option")
        };
        let disabled_or_default = build(OptionMode::DisabledOrDefault);
        assert!(!disabled_or_default.is_selectable(false));
        assert_eq!(disabled_or_default.presentation(true), OptionPresentation::Default);

        let default_or_special = build(OptionMode::DefaultOrSpecial);
        assert!(default_or_special.is_selectable(false));
        assert_eq!(default_or_special.presentation(true), OptionPresentation::Special);

        let disabled_or_special = build(OptionMode::DisabledOrSpecial);
        assert_eq!(disabled_or_special.presentation(false), OptionPresentation::Disabled);
        assert!(build(OptionMode::Default).is_selectable(false));
    }
}
