//! Primary and secondary pokemon binding shared by options and encounters.
//! Secondary is always bound before primary so primary selection can avoid
//! or borrow from the secondary pool.

use crate::requirements::PokemonRequirement;
use crate::seed::SeededRng;
use crate::state::RunState;
use crate::types::PokemonId;

/// How a primary is chosen when overlap exclusion does not apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimaryPick {
    FirstQualified,
    Random,
}

/// Transient result of the last eligibility evaluation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PokemonBinding {
    pub primary: Option<PokemonId>,
    pub secondary: Vec<PokemonId>,
}

impl PokemonBinding {
    /// Binds every member that satisfies all secondary requirements. Fails
    /// only when a requirement is unmet; an empty pool is still a success.
    pub fn bind_secondary(&mut self, run: &RunState, requirements: &[PokemonRequirement]) -> bool {
        self.secondary.clear();
        if requirements.is_empty() {
            return true;
        }
        let Some(qualified) = qualify(run, requirements) else {
            return false;
        };
        self.secondary = qualified;
        true
    }

    pub fn bind_primary(
        &mut self,
        run: &RunState,
        requirements: &[PokemonRequirement],
        exclude_primary_from_secondary: bool,
        pick: PrimaryPick,
        rng: &mut SeededRng,
    ) -> bool {
        self.primary = None;
        if requirements.is_empty() {
            self.primary = run.party.first_active_or_allowed();
            return true;
        }

        let Some(qualified) = qualify(run, requirements) else {
            return false;
        };
        if qualified.is_empty() {
            return false;
        }

        if !exclude_primary_from_secondary || self.secondary.is_empty() {
            let chosen = match pick {
                PrimaryPick::FirstQualified => qualified[0],
                PrimaryPick::Random => qualified[rng.below(qualified.len())],
            };
            self.primary = Some(chosen);
            return true;
        }

        let (overlap, true_pool): (Vec<PokemonId>, Vec<PokemonId>) =
            qualified.into_iter().partition(|id| self.secondary.contains(id));

        if !true_pool.is_empty() {
            self.primary = Some(true_pool[rng.below(true_pool.len())]);
            return true;
        }

        if overlap.len() > 1 || self.secondary.len() > overlap.len() {
            let borrowed = overlap[rng.below(overlap.len())];
            self.secondary.retain(|id| *id != borrowed);
            self.primary = Some(borrowed);
            return true;
        }

        tracing::debug!(
            overlap = overlap.len(),
            secondary = self.secondary.len(),
            "primary pool fully overlaps a single-member secondary pool"
        );
        false
    }

    pub fn clear(&mut self) {
        self.primary = None;
        self.secondary.clear();
    }
}

/// Intersection of every requirement's party query, or `None` when any
/// requirement's aggregate precondition fails.
fn qualify(run: &RunState, requirements: &[PokemonRequirement]) -> Option<Vec<PokemonId>> {
    let party = run.party.members();
    let mut qualified: Vec<PokemonId> = run.party.ids().to_vec();
    for requirement in requirements {
        if !requirement.meets_requirement(run) {
            return None;
        }
        let matched = requirement.query_party(&party);
        qualified.retain(|id| matched.contains(id));
    }
    Some(qualified)
}

/// True when `pokemon` is in every requirement's party query.
pub fn pokemon_meets_requirements(
    run: &RunState,
    requirements: &[PokemonRequirement],
    pokemon: PokemonId,
) -> bool {
    let party = run.party.members();
    requirements.iter().all(|requirement| requirement.query_party(&party).contains(&pokemon))
}
