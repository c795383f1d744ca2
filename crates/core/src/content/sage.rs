//! A wandering sage answers up to three questions before moving on. The
//! encounter is continuous: it keeps returning to option selection until
//! the player leaves or runs out of questions.

use serde::{Deserialize, Serialize};

use super::{keys, option_dialogue};
use crate::encounter::Encounter;
use crate::error::{ConfigError, EncounterError};
use crate::party_utils::apply_heal_to_pokemon;
use crate::requirements::{PokemonCriterion, PokemonRequirement};
use crate::session::PhaseScope;
use crate::state::MAX_FRIENDSHIP;
use crate::types::{EncounterTier, PokemonId};

pub const MAX_QUESTIONS: u32 = 3;
const TOPICS: [&str; 3] = ["sage:topic.past", "sage:topic.future", "sage:topic.bond"];
const WISDOM_FRIENDSHIP: u32 = 5;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Conversation {
    asked: u32,
    last_listener: Option<PokemonId>,
}

fn ask(scope: &mut PhaseScope<'_>) -> Result<(), EncounterError> {
    let mut conversation: Conversation = scope.encounter.misc.load()?.unwrap_or_default();
    if let Some(topic) = scope.select_option(TOPICS.len()) {
        scope.set_dialogue_token("topic", TOPICS[topic]);
        let listener = scope.random_party_member(true, false, false);
        if let Some(listener) = listener {
            let member = scope.party_member_mut(listener)?;
            member.friendship = (member.friendship + WISDOM_FRIENDSHIP).min(MAX_FRIENDSHIP);
            let name = member.name.clone();
            scope.set_dialogue_token("listenerName", name);
        }
        conversation.last_listener = listener;
    }
    conversation.asked += 1;
    scope.encounter.misc.store(&conversation)?;
    if conversation.asked < MAX_QUESTIONS {
        scope.init_subsequent_option_select();
    }
    Ok(())
}

fn take_leave(scope: &mut PhaseScope<'_>) -> Result<(), EncounterError> {
    for id in scope.run.party.ids().to_vec() {
        let member = scope.party_member_mut(id)?;
        if !member.is_fainted() && member.hp < member.max_hp {
            let missing = f64::from(member.max_hp - member.hp);
            apply_heal_to_pokemon(member, missing);
        }
    }
    scope.encounter.misc.clear();
    Ok(())
}

pub fn wandering_sage() -> Result<Encounter, ConfigError> {
    Encounter::builder()
        .with_encounter_type(keys::WANDERING_SAGE)
        .with_encounter_tier(EncounterTier::Rogue)
        .with_scene_wave_range_requirement(30..=180)
        .with_scene_party_size_requirement(2..=6, false)
        .with_secondary_pokemon_requirement(
            PokemonRequirement::new(PokemonCriterion::Friendship(50..=MAX_FRIENDSHIP))?,
            false,
        )
        .with_title("sage:title")
        .with_continuous_encounter(true)
        .with_auto_hide_intro_visuals(false)
        .with_simple_option(option_dialogue("sage:option.1"), ask)
        .with_simple_option(option_dialogue("sage:option.2"), take_leave)
        .build()
}
