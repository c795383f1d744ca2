//! Reward and experience hooks installed by option phases.

use crate::option::PhaseFn;
use crate::state::{MAX_FRIENDSHIP, RunState};
use crate::types::{EncounterTier, EncounterVariant, ItemKey, PokemonId, SpeciesKey};

pub mod modifier_keys {
    pub const EXP_SHARE: &str = "EXP_SHARE";
    pub const MULTI_PARTICIPANT_EXP_BONUS: &str = "EXP_BONUS";
    pub const EXP_BALANCE: &str = "EXP_BALANCE";
}

const PARTICIPANT_FRIENDSHIP: u32 = 2;
const STACK_SHARE: f64 = 0.2;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShopRewards {
    pub guaranteed_items: Vec<ItemKey>,
    /// Fill the remaining shop slots with random rewards.
    pub fill_remaining: bool,
}

impl ShopRewards {
    /// The shop a wave offers when the encounter customizes nothing.
    pub fn standard() -> Self {
        Self { guaranteed_items: Vec::new(), fill_remaining: true }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EggReward {
    pub tier: EncounterTier,
    pub species: Option<SpeciesKey>,
    pub hatch_waves: u32,
}

/// Installed by `set_encounter_rewards`; the last installation wins.
#[derive(Clone, Default)]
pub struct RewardHook {
    pub shop: Option<ShopRewards>,
    pub items: Vec<ItemKey>,
    pub eggs: Vec<EggReward>,
    pub pre_callback: Option<PhaseFn>,
}

/// What the host presents once the encounter's rewards are resolved.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RewardResolution {
    pub shop: Option<ShopRewards>,
    pub items: Vec<ItemKey>,
    pub eggs: Vec<EggReward>,
    pub heal: bool,
    pub lock_reward_tiers: bool,
}

/// Installed by `set_encounter_exp`; the last installation wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpHook {
    pub participants: Vec<PokemonId>,
    pub base_exp: u32,
    pub use_wave_index: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExpGrant {
    pub pokemon: PokemonId,
    pub exp: u64,
}

/// Base value before per-member multipliers.
pub fn encounter_exp_value(hook: &ExpHook, wave_index: u32, variant: EncounterVariant) -> f64 {
    let base = f64::from(hook.base_exp);
    let mut value =
        if hook.use_wave_index { (base * f64::from(wave_index) / 5.0 + 1.0).floor() } else { base };
    if variant == EncounterVariant::TrainerBattle {
        value = (value * 1.5).floor();
    }
    value
}

/// Experience per non-fainted member, in party order. Pure; see `apply_exp`.
pub fn compute_exp_grants(run: &RunState, hook: &ExpHook, variant: EncounterVariant) -> Vec<ExpGrant> {
    let exp_value = encounter_exp_value(hook, run.wave_index, variant);
    let share_stacks = stacks(run, modifier_keys::EXP_SHARE);
    let bonus_stacks = stacks(run, modifier_keys::MULTI_PARTICIPANT_EXP_BONUS);
    let balance_stacks = stacks(run, modifier_keys::EXP_BALANCE);
    let participant_count = hook.participants.len().max(1) as f64;

    let members: Vec<_> = run.party.iter().filter(|member| !member.is_fainted()).collect();
    let mut grants: Vec<ExpGrant> = members
        .iter()
        .map(|member| {
            if member.level >= run.max_level {
                return ExpGrant { pokemon: member.id, exp: 0 };
            }
            let participated = hook.participants.contains(&member.id);
            let mut multiplier = if participated {
                let mut share = 1.0 / participant_count;
                if hook.participants.len() > 1 {
                    share += STACK_SHARE * bonus_stacks;
                }
                share
            } else if share_stacks > 0.0 {
                STACK_SHARE * share_stacks / participant_count
            } else {
                0.0
            };
            if member.pokerus {
                multiplier *= 1.5;
            }
            ExpGrant { pokemon: member.id, exp: (exp_value * multiplier).floor() as u64 }
        })
        .collect();

    if balance_stacks > 0.0 && !members.is_empty() {
        let total_level: u64 = members.iter().map(|member| u64::from(member.level)).sum();
        let median_level = total_level / members.len() as u64;
        let recipients: Vec<bool> =
            members.iter().map(|member| u64::from(member.level) <= median_level).collect();
        let recipient_count = recipients.iter().filter(|is_recipient| **is_recipient).count() as u64;
        let total_exp: u64 = grants.iter().map(|grant| grant.exp).sum();
        let split = if recipient_count == 0 { 0 } else { total_exp / recipient_count };
        let weight = (STACK_SHARE * balance_stacks).min(1.0);
        for (grant, is_recipient) in grants.iter_mut().zip(recipients) {
            let target = if is_recipient { split as f64 } else { 0.0 };
            let current = grant.exp as f64;
            grant.exp = (current + (target - current) * weight).floor() as u64;
        }
    }

    grants
}

/// Grants experience and participant friendship, returning what was granted.
pub fn apply_exp(run: &mut RunState, hook: &ExpHook, variant: EncounterVariant) -> Vec<ExpGrant> {
    let grants = compute_exp_grants(run, hook, variant);
    for participant in &hook.participants {
        if let Some(member) = run.party.get_mut(*participant)
            && !member.is_fainted()
        {
            member.friendship = (member.friendship + PARTICIPANT_FRIENDSHIP).min(MAX_FRIENDSHIP);
        }
    }
    for grant in &grants {
        if let Some(member) = run.party.get_mut(grant.pokemon) {
            member.exp += grant.exp;
        }
    }
    grants
}

fn stacks(run: &RunState, key: &str) -> f64 {
    f64::from(run.modifiers.stack_count(&ItemKey::from(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PartyMember;

    fn hook(participants: Vec<PokemonId>) -> ExpHook {
        ExpHook { participants, base_exp: 100, use_wave_index: true }
    }

    #[test]
    fn single_participant_gets_full_wave_scaled_exp() {
        let mut run = RunState::new(1, 50);
        let solo = run.party.add(PartyMember::new("A", 30));
        let grants = compute_exp_grants(&run, &hook(vec![solo]), EncounterVariant::WildBattle);
        assert_eq!(grants, vec![ExpGrant { pokemon: solo, exp: 1001 }]);
    }

    #[test]
    fn trainer_battles_multiply_after_flooring() {
        let mut run = RunState::new(1, 50);
        let solo = run.party.add(PartyMember::new("A", 30));
        let grants = compute_exp_grants(&run, &hook(vec![solo]), EncounterVariant::TrainerBattle);
        // floor(1001 * 1.5)
        assert_eq!(grants[0].exp, 1501);
    }

    #[test]
    fn non_participants_need_exp_share() {
        let mut run = RunState::new(1, 50);
        let fighter = run.party.add(PartyMember::new("A", 30));
        let bench = run.party.add(PartyMember::new("B", 30));
        let without_share =
            compute_exp_grants(&run, &hook(vec![fighter]), EncounterVariant::WildBattle);
        assert_eq!(without_share[1], ExpGrant { pokemon: bench, exp: 0 });

        run.modifiers.add(modifier_keys::EXP_SHARE, 2);
        let with_share = compute_exp_grants(&run, &hook(vec![fighter]), EncounterVariant::WildBattle);
        // 1001 * 0.4
        assert_eq!(with_share[1].exp, 400);
    }

    #[test]
    fn multiple_participants_split_with_bonus() {
        let mut run = RunState::new(1, 50);
        let a = run.party.add(PartyMember::new("A", 30));
        let b = run.party.add(PartyMember::new("B", 30));
        let split = compute_exp_grants(&run, &hook(vec![a, b]), EncounterVariant::WildBattle);
        assert_eq!(split[0].exp, 500);

        run.modifiers.add(modifier_keys::MULTI_PARTICIPANT_EXP_BONUS, 1);
        let boosted = compute_exp_grants(&run, &hook(vec![a, b]), EncounterVariant::WildBattle);
        // 1001 * (0.5 + 0.2)
        assert_eq!(boosted[1].exp, 700);
    }

    #[test]
    fn pokerus_and_level_cap_apply_per_member() {
        let mut run = RunState::new(1, 50);
        let mut infected = PartyMember::new("A", 30);
        infected.pokerus = true;
        let infected = run.party.add(infected);
        let capped = run.party.add(PartyMember::new("B", 200));
        let grants =
            compute_exp_grants(&run, &hook(vec![infected, capped]), EncounterVariant::WildBattle);
        // floor(1001 * 0.5 * 1.5)
        assert_eq!(grants[0].exp, 750);
        assert_eq!(grants[1].exp, 0);
    }

    #[test]
    fn exp_balance_moves_exp_toward_low_levels() {
        let mut run = RunState::new(1, 10);
        let high = run.party.add(PartyMember::new("A", 50));
        let low = run.party.add(PartyMember::new("B", 10));
        run.modifiers.add(modifier_keys::EXP_BALANCE, 1);
        let exp_hook = ExpHook { participants: vec![high], base_exp: 100, use_wave_index: false };
        let grants = compute_exp_grants(&run, &exp_hook, EncounterVariant::WildBattle);
        // median 30: only B is a recipient, split = 100; lerp by 0.2
        assert_eq!(grants[0], ExpGrant { pokemon: high, exp: 80 });
        assert_eq!(grants[1], ExpGrant { pokemon: low, exp: 20 });
    }

    #[test]
    fn apply_exp_raises_participant_friendship() {
        let mut run = RunState::new(1, 50);
        let fighter = run.party.add(PartyMember::new("A", 30));
        let bench = run.party.add(PartyMember::new("B", 30));
        apply_exp(&mut run, &hook(vec![fighter]), EncounterVariant::WildBattle);
        let fighter = run.party.get(fighter).expect("member");
        assert_eq!(fighter.friendship, 72);
        assert_eq!(fighter.exp, 1001);
        assert_eq!(run.party.get(bench).expect("member").friendship, 70);
    }
}
