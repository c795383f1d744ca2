//! A shady merchant sells a held item to one party member, or can be
//! threatened into a fight with its guardian.

use serde::{Deserialize, Serialize};

use super::{keys, option_dialogue};
use crate::blueprint::{EnemyPartyConfig, EnemyPokemonConfig, StartOfBattleEffect, StatusConfig};
use crate::encounter::Encounter;
use crate::error::{ConfigError, EncounterError};
use crate::option::{EncounterOption, PreOptionSignal};
use crate::party_utils::update_player_money;
use crate::session::PhaseScope;
use crate::state::{HeldItem, PartyMember};
use crate::types::{EncounterTier, ItemKey, MoveKey, OptionMode, PokemonId, StatusEffect};

/// Money multiplier of the item price, relative to the wave's money amount.
pub const PRICE_MULTIPLIER: f64 = 2.0;

/// Carried from the pre-option phase to the option phase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantDeal {
    pub buyer: PokemonId,
    pub price: u64,
}

fn choose_buyer(scope: &mut PhaseScope<'_>) -> Result<PreOptionSignal, EncounterError> {
    let Some(buyer) = scope.select_party_member(PartyMember::is_allowed_in_battle) else {
        return Ok(PreOptionSignal::Abort);
    };
    let price = scope.run.wave_money_amount(PRICE_MULTIPLIER);
    scope.encounter.misc.store(&MerchantDeal { buyer, price })?;
    let name = scope.party_member(buyer)?.name.clone();
    scope.set_dialogue_token("buyerName", name);
    Ok(PreOptionSignal::Proceed)
}

fn buy(scope: &mut PhaseScope<'_>) -> Result<(), EncounterError> {
    let deal: MerchantDeal = scope
        .encounter
        .misc
        .load()?
        .ok_or_else(|| EncounterError::Phase("merchant deal was not prepared".to_string()))?;
    let charge = i64::try_from(deal.price).unwrap_or(i64::MAX);
    update_player_money(scope.run, -charge);
    scope.party_member_mut(deal.buyer)?.held_items.push(HeldItem::new(keys::ITEM_SOOTHE_BELL, 1));
    scope.set_encounter_rewards(None, vec![ItemKey::from(keys::ITEM_LUCKY_EGG)], Vec::new(), None);
    scope.leave_encounter_without_battle(false);
    Ok(())
}

fn threaten(scope: &mut PhaseScope<'_>) -> Result<(), EncounterError> {
    let participants = scope.run.party.allowed_in_battle();
    scope.set_encounter_exp(participants, 150, true);
    scope.init_battle_with_enemy_config(0)
}

fn settle_receipt(scope: &mut PhaseScope<'_>) -> Result<(), EncounterError> {
    if let Some(deal) = scope.encounter.misc.load::<MerchantDeal>()? {
        scope.set_dialogue_token("paid", deal.price.to_string());
    }
    scope.encounter.misc.clear();
    Ok(())
}

pub fn shady_merchant() -> Result<Encounter, ConfigError> {
    let guardian = EnemyPartyConfig {
        level_additive_multiplier: 1.0,
        pokemon: vec![EnemyPokemonConfig {
            boss_segment_modifier: 1,
            status: Some(StatusConfig { effect: StatusEffect::Sleep, cure_turn: None }),
            nickname: Some("merchant:guardian".to_string()),
            ..EnemyPokemonConfig::boss(keys::SPECIES_MIMIKYU)
        }],
        ..EnemyPartyConfig::default()
    };

    let buy_option = EncounterOption::builder(OptionMode::DisabledOrSpecial)
        .with_scene_money_requirement(0, PRICE_MULTIPLIER)
        .with_dialogue(option_dialogue("merchant:option.1"))
        .with_pre_option_phase(choose_buyer)
        .with_option_phase(buy)
        .with_post_option_phase(settle_receipt)
        .build()?;

    Encounter::builder()
        .with_encounter_type(keys::SHADY_MERCHANT)
        .with_encounter_tier(EncounterTier::Great)
        .with_scene_wave_range_requirement(10..=180)
        .with_title("merchant:title")
        .with_query("merchant:query")
        .with_enemy_party_config(guardian)
        .with_start_of_battle_effects(vec![StartOfBattleEffect {
            source_enemy: 0,
            move_key: MoveKey::from(keys::MOVE_SPITE),
            ignore_pp: true,
        }])
        .with_catch_allowed(true)
        .with_option(buy_option)
        .with_simple_option(option_dialogue("merchant:option.2"), |_| Ok(()))
        .with_simple_option(option_dialogue("merchant:option.3"), threaten)
        .build()
}
