//! A martial arts dojo: spar with the sensei's trainer team, or meditate
//! with a seasoned party member.

use super::{keys, option_dialogue};
use crate::blueprint::{EnemyPartyConfig, EnemyPokemonConfig, TrainerConfig};
use crate::dialogue::DialogueLine;
use crate::encounter::Encounter;
use crate::error::{ConfigError, EncounterError};
use crate::option::EncounterOption;
use crate::party_utils::apply_heal_to_pokemon;
use crate::requirements::{PokemonCriterion, PokemonRequirement};
use crate::session::PhaseScope;
use crate::state::MAX_FRIENDSHIP;
use crate::types::{EncounterTier, ItemKey, OptionMode};

const SENSEI_NAMES: [&str; 3] = ["dojo:sensei.kaiya", "dojo:sensei.bruno", "dojo:sensei.maylene"];
const MEDITATION_LEVEL: u32 = 30;
const MEDITATION_FRIENDSHIP: u32 = 10;
const SPAR_BASE_EXP: u32 = 100;

fn pick_sensei(scope: &mut PhaseScope<'_>) -> Result<(), EncounterError> {
    let sensei = scope.rng().pick(&SENSEI_NAMES).copied().unwrap_or(SENSEI_NAMES[0]);
    scope.set_dialogue_token("sensei", sensei);
    Ok(())
}

fn spar(scope: &mut PhaseScope<'_>) -> Result<(), EncounterError> {
    let participants = scope.run.party.allowed_in_battle();
    scope.set_encounter_exp(participants, SPAR_BASE_EXP, true);
    scope.set_encounter_rewards(None, vec![ItemKey::from(keys::ITEM_RARE_CANDY)], Vec::new(), None);
    scope.init_battle_with_enemy_config(0)
}

fn meditate(scope: &mut PhaseScope<'_>) -> Result<(), EncounterError> {
    let meditator = scope
        .encounter
        .option(1)
        .and_then(EncounterOption::primary_pokemon)
        .ok_or(EncounterError::UnknownPokemon)?;
    let member = scope.party_member_mut(meditator)?;
    let missing_hp = f64::from(member.max_hp - member.hp);
    if missing_hp > 0.0 {
        apply_heal_to_pokemon(member, missing_hp);
    }
    member.friendship = (member.friendship + MEDITATION_FRIENDSHIP).min(MAX_FRIENDSHIP);
    let name = member.name.clone();
    scope.set_dialogue_token("meditatorName", name);
    Ok(())
}

pub fn training_dojo() -> Result<Encounter, ConfigError> {
    let sensei_team = EnemyPartyConfig {
        level_additive_multiplier: 0.5,
        trainer: Some(TrainerConfig {
            trainer_type: keys::TRAINER_BLACK_BELT.into(),
            female: None,
            double: false,
        }),
        pokemon: vec![
            EnemyPokemonConfig::species(keys::SPECIES_MACHOP),
            EnemyPokemonConfig::species(keys::SPECIES_HITMONLEE),
        ],
        ..EnemyPartyConfig::default()
    };

    let meditate_option = EncounterOption::builder(OptionMode::DisabledOrDefault)
        .with_primary_pokemon_requirement(PokemonRequirement::new(PokemonCriterion::Level(
            MEDITATION_LEVEL..=u32::MAX,
        ))?)
        .with_dialogue(option_dialogue("dojo:option.2"))
        .with_option_phase(meditate)
        .build()?;

    Encounter::builder()
        .with_encounter_type(keys::TRAINING_DOJO)
        .with_encounter_tier(EncounterTier::Common)
        .with_scene_wave_range_requirement(10..=180)
        .with_scene_party_size_requirement(1..=6, true)
        .with_intro_dialogue(vec![DialogueLine::spoken_by("dojo:speaker", "dojo:intro")])
        .with_title("dojo:title")
        .with_description("dojo:description")
        .with_query("dojo:query")
        .with_enemy_party_config(sensei_team)
        .with_on_init(pick_sensei)
        .with_simple_option(option_dialogue("dojo:option.1"), spar)
        .with_option(meditate_option)
        .with_outro_dialogue(vec![DialogueLine::new("dojo:outro")])
        .build()
}
