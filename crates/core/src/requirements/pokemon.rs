use std::ops::RangeInclusive;

use super::{DialogueToken, non_empty, non_empty_range, token};
use crate::error::ConfigError;
use crate::state::{PartyMember, RunState};
use crate::types::{
    AbilityKey, ElementType, ItemKey, MoveKey, NatureKey, PokemonId, SpeciesKey, StatusEffect,
};

/// What a single party member is tested for.
#[derive(Clone, Debug, PartialEq)]
pub enum PokemonCriterion {
    Species(Vec<SpeciesKey>),
    Nature(Vec<NatureKey>),
    Type(Vec<ElementType>),
    Move(Vec<MoveKey>),
    /// Learnable by TM and not already known. Egg moves never count.
    CompatibleMove(Vec<MoveKey>),
    Ability(Vec<AbilityKey>),
    /// `StatusEffect::None` matches members without a status.
    Status(Vec<StatusEffect>),
    /// Items that trigger a form change. The generic form-change enabler
    /// modifier is a persistent-modifier requirement, not this one.
    FormChangeItem(Vec<ItemKey>),
    EvolutionItem(Vec<ItemKey>),
    HeldItem(Vec<ItemKey>),
    AttackTypeBooster(Vec<ElementType>),
    Level(RangeInclusive<u32>),
    Friendship(RangeInclusive<u32>),
    HealthRatio(RangeInclusive<f64>),
    Weight(RangeInclusive<f64>),
}

impl PokemonCriterion {
    fn name(&self) -> &'static str {
        match self {
            Self::Species(_) => "species",
            Self::Nature(_) => "nature",
            Self::Type(_) => "type",
            Self::Move(_) => "move",
            Self::CompatibleMove(_) => "compatible move",
            Self::Ability(_) => "ability",
            Self::Status(_) => "status",
            Self::FormChangeItem(_) => "form change item",
            Self::EvolutionItem(_) => "evolution item",
            Self::HeldItem(_) => "held item",
            Self::AttackTypeBooster(_) => "attack type booster",
            Self::Level(_) => "level",
            Self::Friendship(_) => "friendship",
            Self::HealthRatio(_) => "health ratio",
            Self::Weight(_) => "weight",
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        let name = self.name();
        Ok(match self {
            Self::Species(targets) => Self::Species(non_empty(name, targets)?),
            Self::Nature(targets) => Self::Nature(non_empty(name, targets)?),
            Self::Type(targets) => Self::Type(non_empty(name, targets)?),
            Self::Move(targets) => Self::Move(non_empty(name, targets)?),
            Self::CompatibleMove(targets) => Self::CompatibleMove(non_empty(name, targets)?),
            Self::Ability(targets) => Self::Ability(non_empty(name, targets)?),
            Self::Status(targets) => Self::Status(non_empty(name, targets)?),
            Self::FormChangeItem(targets) => Self::FormChangeItem(non_empty(name, targets)?),
            Self::EvolutionItem(targets) => Self::EvolutionItem(non_empty(name, targets)?),
            Self::HeldItem(targets) => Self::HeldItem(non_empty(name, targets)?),
            Self::AttackTypeBooster(targets) => Self::AttackTypeBooster(non_empty(name, targets)?),
            Self::Level(range) => Self::Level(non_empty_range(name, range)?),
            Self::Friendship(range) => Self::Friendship(non_empty_range(name, range)?),
            Self::HealthRatio(range) => Self::HealthRatio(non_empty_range(name, range)?),
            Self::Weight(range) => Self::Weight(non_empty_range(name, range)?),
        })
    }

    fn matches(&self, member: &PartyMember) -> bool {
        match self {
            Self::Species(targets) => targets.contains(&member.species),
            Self::Nature(targets) => targets.contains(&member.nature),
            Self::Type(targets) => member.types.iter().any(|kind| targets.contains(kind)),
            Self::Move(targets) => member.moveset.iter().any(|known| targets.contains(known)),
            Self::CompatibleMove(targets) => {
                first_learnable_move(targets, member).is_some()
            }
            Self::Ability(targets) => targets.contains(&member.ability),
            Self::Status(targets) => targets.contains(&member.status),
            Self::FormChangeItem(targets) => {
                member.form_change_items.iter().any(|item| targets.contains(item))
            }
            Self::EvolutionItem(targets) => {
                member.evolution_items.iter().any(|item| targets.contains(item))
            }
            Self::HeldItem(targets) => {
                member.held_items.iter().any(|held| targets.contains(&held.item))
            }
            Self::AttackTypeBooster(targets) => member
                .held_items
                .iter()
                .any(|held| held.boosted_type.is_some_and(|kind| targets.contains(&kind))),
            Self::Level(range) => range.contains(&member.level),
            Self::Friendship(range) => range.contains(&member.friendship),
            Self::HealthRatio(range) => range.contains(&member.health_ratio()),
            Self::Weight(range) => range.contains(&member.weight),
        }
    }

    /// Token for a member that positively matches; `None` otherwise.
    fn token_for(&self, member: &PartyMember) -> Option<DialogueToken> {
        if !self.matches(member) {
            return None;
        }
        match self {
            Self::Species(_) => Some(token("species", &member.species)),
            Self::Nature(_) => Some(token("nature", &member.nature)),
            Self::Type(targets) => member
                .types
                .iter()
                .find(|kind| targets.contains(kind))
                .map(|kind| token("type", kind)),
            Self::Move(targets) => member
                .moveset
                .iter()
                .find(|known| targets.contains(known))
                .map(|known| token("move", known)),
            Self::CompatibleMove(targets) => {
                first_learnable_move(targets, member).map(|learnable| token("compatibleMove", learnable))
            }
            Self::Ability(_) => Some(token("ability", &member.ability)),
            Self::Status(_) => Some(token("status", member.status)),
            Self::FormChangeItem(targets) => member
                .form_change_items
                .iter()
                .find(|item| targets.contains(item))
                .map(|item| token("formChangeItem", item)),
            Self::EvolutionItem(targets) => member
                .evolution_items
                .iter()
                .find(|item| targets.contains(item))
                .map(|item| token("evolutionItem", item)),
            Self::HeldItem(targets) => member
                .held_items
                .iter()
                .find(|held| targets.contains(&held.item))
                .map(|held| token("heldItem", &held.item)),
            Self::AttackTypeBooster(targets) => member
                .held_items
                .iter()
                .find(|held| held.boosted_type.is_some_and(|kind| targets.contains(&kind)))
                .map(|held| token("heldItem", &held.item)),
            Self::Level(_) => Some(token("level", member.level)),
            Self::Friendship(_) => Some(token("friendship", member.friendship)),
            Self::HealthRatio(_) => {
                let percent = (member.health_ratio() * 100.0).floor() as u32;
                Some(token("healthRatio", format!("{percent}%")))
            }
            Self::Weight(_) => Some(token("weight", member.weight)),
        }
    }
}

fn first_learnable_move<'a>(targets: &'a [MoveKey], member: &PartyMember) -> Option<&'a MoveKey> {
    targets
        .iter()
        .find(|target| member.compatible_tms.contains(target) && !member.moveset.contains(target))
}

/// A single criterion with its party-level count and inversion settings.
#[derive(Clone, Debug, PartialEq)]
pub struct PokemonPredicate {
    criterion: PokemonCriterion,
    min_pokemon: usize,
    invert: bool,
    exclude_fainted: bool,
}

impl PokemonPredicate {
    /// Fails on an empty target list or an empty range.
    pub fn new(criterion: PokemonCriterion) -> Result<Self, ConfigError> {
        let criterion = criterion.validate()?;
        let exclude_fainted = matches!(criterion, PokemonCriterion::Type(_));
        Ok(Self { criterion, min_pokemon: 1, invert: false, exclude_fainted })
    }

    pub fn with_min_pokemon(mut self, min_pokemon: usize) -> Result<Self, ConfigError> {
        if min_pokemon == 0 {
            return Err(ConfigError::ZeroMinimum { requirement: self.criterion.name() });
        }
        self.min_pokemon = min_pokemon;
        Ok(self)
    }

    /// Query the complement: members that do not match.
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// Whether fainted members are dropped before counting against the minimum.
    pub fn excluding_fainted(mut self, exclude_fainted: bool) -> Self {
        self.exclude_fainted = exclude_fainted;
        self
    }

    pub fn criterion(&self) -> &PokemonCriterion {
        &self.criterion
    }

    fn query(&self, party: &[&PartyMember]) -> Vec<PokemonId> {
        party
            .iter()
            .filter(|member| self.criterion.matches(member) != self.invert)
            .map(|member| member.id)
            .collect()
    }

    fn meets(&self, run: &RunState) -> bool {
        let pool: Vec<&PartyMember> = run
            .party
            .iter()
            .filter(|member| !self.exclude_fainted || !member.is_fainted())
            .collect();
        self.query(&pool).len() >= self.min_pokemon
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PokemonRequirement {
    Predicate(PokemonPredicate),
    /// OR: met when any sub-requirement is met.
    Some(Vec<PokemonRequirement>),
    /// AND: met when every sub-requirement is met.
    Every(Vec<PokemonRequirement>),
}

impl From<PokemonPredicate> for PokemonRequirement {
    fn from(predicate: PokemonPredicate) -> Self {
        Self::Predicate(predicate)
    }
}

impl PokemonRequirement {
    pub fn new(criterion: PokemonCriterion) -> Result<Self, ConfigError> {
        PokemonPredicate::new(criterion).map(Self::Predicate)
    }

    pub fn meets_requirement(&self, run: &RunState) -> bool {
        match self {
            Self::Predicate(predicate) => predicate.meets(run),
            Self::Some(requirements) => {
                requirements.iter().any(|requirement| requirement.meets_requirement(run))
            }
            Self::Every(requirements) => {
                requirements.iter().all(|requirement| requirement.meets_requirement(run))
            }
        }
    }

    /// Pure filter over `party`, preserving its order.
    pub fn query_party(&self, party: &[&PartyMember]) -> Vec<PokemonId> {
        match self {
            Self::Predicate(predicate) => predicate.query(party),
            Self::Some(requirements) => requirements
                .iter()
                .map(|requirement| requirement.query_party(party))
                .find(|matched| !matched.is_empty())
                .unwrap_or_default(),
            Self::Every(requirements) => {
                let mut matched: Vec<PokemonId> = party.iter().map(|member| member.id).collect();
                for requirement in requirements {
                    let sub = requirement.query_party(party);
                    matched.retain(|id| sub.contains(id));
                }
                matched
            }
        }
    }

    /// `Every` reports no token; that composite has no single value to report.
    pub fn dialogue_token(
        &self,
        run: &RunState,
        pokemon: Option<&PartyMember>,
    ) -> Option<DialogueToken> {
        match self {
            Self::Predicate(predicate) => pokemon.and_then(|member| predicate.criterion.token_for(member)),
            Self::Some(requirements) => requirements
                .iter()
                .find(|requirement| requirement.meets_requirement(run))
                .or_else(|| requirements.first())
                .and_then(|requirement| requirement.dialogue_token(run, pokemon)),
            Self::Every(_) => None,
        }
    }

    pub fn is_inverted(&self) -> bool {
        matches!(self, Self::Predicate(predicate) if predicate.invert)
    }

    pub fn min_pokemon(&self) -> usize {
        match self {
            Self::Predicate(predicate) => predicate.min_pokemon,
            Self::Some(_) | Self::Every(_) => 1,
        }
    }
}
