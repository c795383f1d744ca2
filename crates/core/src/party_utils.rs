//! Party helpers encounter content reaches for inside its phases.
//! Lookups return ids rather than references so callers can go on to
//! mutate the run. Ties always resolve to the member closer to the front.

use crate::blueprint::wave_level_additive;
use crate::seed::SeededRng;
use crate::state::{Party, PartyMember, RunState};
use crate::types::{PokemonId, Stat, StatusEffect, TextKey};

pub const CANT_BE_USED_KEY: &str = "partyUiHandler:cantBeUsed";

fn passes(member: &PartyMember, allowed_only: bool, include_fainted: bool) -> bool {
    (!allowed_only || member.allowed) && (include_fainted || !member.is_fainted())
}

/// Random member, drawn from the legal pool when there is one.
///
/// With `do_not_return_last_allowed` set and a single legal member left, the
/// draw is made among the fainted members instead, so an option that costs a
/// member never takes the last one able to fight.
pub fn random_player_pokemon(
    party: &Party,
    rng: &mut SeededRng,
    allowed_only: bool,
    include_fainted: bool,
    do_not_return_last_allowed: bool,
) -> Option<PokemonId> {
    let legal: Vec<PokemonId> = party
        .iter()
        .filter(|member| passes(member, allowed_only, include_fainted))
        .map(|member| member.id)
        .collect();

    if do_not_return_last_allowed && legal.len() == 1 {
        let fainted: Vec<PokemonId> = party
            .iter()
            .filter(|member| (!allowed_only || member.allowed) && member.is_fainted())
            .map(|member| member.id)
            .collect();
        if let Some(id) = rng.pick(&fainted) {
            return Some(*id);
        }
    }
    if let Some(id) = rng.pick(&legal) {
        return Some(*id);
    }
    if allowed_only {
        let allowed: Vec<PokemonId> =
            party.iter().filter(|member| member.allowed).map(|member| member.id).collect();
        if let Some(id) = rng.pick(&allowed) {
            return Some(*id);
        }
    }
    rng.pick(party.ids()).copied()
}

/// First member in slot order whose key is strictly better than every
/// earlier candidate's.
fn best_by<K: PartialOrd>(
    party: &Party,
    allowed_only: bool,
    include_fainted: bool,
    key: impl Fn(&PartyMember) -> K,
    better: impl Fn(&K, &K) -> bool,
) -> Option<PokemonId> {
    let mut best: Option<(&PartyMember, K)> = None;
    for member in party.iter().filter(|member| passes(member, allowed_only, include_fainted)) {
        let value = key(member);
        if best.as_ref().is_none_or(|(_, current)| better(&value, current)) {
            best = Some((member, value));
        }
    }
    best.map(|(member, _)| member.id)
}

pub fn highest_level_player_pokemon(
    party: &Party,
    allowed_only: bool,
    include_fainted: bool,
) -> Option<PokemonId> {
    best_by(party, allowed_only, include_fainted, |member| member.level, |a, b| a > b)
}

pub fn lowest_level_player_pokemon(
    party: &Party,
    allowed_only: bool,
    include_fainted: bool,
) -> Option<PokemonId> {
    best_by(party, allowed_only, include_fainted, |member| member.level, |a, b| a < b)
}

pub fn highest_stat_player_pokemon(
    party: &Party,
    stat: Stat,
    allowed_only: bool,
    include_fainted: bool,
) -> Option<PokemonId> {
    best_by(party, allowed_only, include_fainted, |member| member.stats[stat.index()], |a, b| a > b)
}

pub fn highest_stat_total_player_pokemon(
    party: &Party,
    allowed_only: bool,
    include_fainted: bool,
) -> Option<PokemonId> {
    best_by(party, allowed_only, include_fainted, PartyMember::stat_total, |a, b| a > b)
}

pub fn ko_player_pokemon(member: &mut PartyMember) {
    tracing::debug!(pokemon = %member.name, "party member fainted");
    member.hp = 0;
    member.status = StatusEffect::Faint;
}

fn apply_hp_change(member: &mut PartyMember, value: f64) {
    let next = (f64::from(member.hp) + value).round().clamp(0.0, f64::from(member.max_hp));
    if next == 0.0 {
        ko_player_pokemon(member);
    } else {
        member.hp = next as u32;
    }
}

pub fn apply_damage_to_pokemon(member: &mut PartyMember, damage: f64) {
    if damage <= 0.0 {
        tracing::warn!(damage, "non-positive damage applied; use apply_heal_to_pokemon to heal");
    }
    apply_hp_change(member, -damage);
}

pub fn apply_heal_to_pokemon(member: &mut PartyMember, heal: f64) {
    if heal <= 0.0 {
        tracing::warn!(heal, "non-positive heal applied; use apply_damage_to_pokemon to damage");
    }
    apply_hp_change(member, heal);
}

/// `base_level + max(round(wave / 10 * additive_multiplier), 0)`
pub fn encounter_pokemon_level_for_wave(
    run: &RunState,
    base_level: u32,
    additive_multiplier: f64,
) -> u32 {
    base_level + wave_level_additive(run.wave_index, additive_multiplier)
}

/// `None` when the member may be picked; otherwise the text key explaining why not.
pub fn is_pokemon_valid_for_encounter_option_selection(
    member: &PartyMember,
    invalid_selection_key: &TextKey,
) -> Option<TextKey> {
    if !member.allowed {
        return Some(TextKey::from(CANT_BE_USED_KEY));
    }
    if !member.is_allowed_in_battle() {
        return Some(invalid_selection_key.clone());
    }
    None
}

/// Adds `delta` to the run's money, never going below zero.
pub fn update_player_money(run: &mut RunState, delta: i64) -> u64 {
    run.money = run.money.saturating_add_signed(delta);
    run.money
}
