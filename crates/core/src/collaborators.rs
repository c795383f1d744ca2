//! Contracts for the external systems an encounter session drives.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::blueprint::EnemyParty;
use crate::error::AssetLoadError;
use crate::seed::SeededRng;
use crate::state::{Party, PartyMember};
use crate::types::{PokemonId, SpeciesKey, TrainerKey};

/// Opaque visual descriptor for the rendering layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpriteConfig {
    pub sprite_key: String,
    pub file_root: String,
    pub has_shadow: bool,
    pub repeat: bool,
    pub x: i32,
    pub y: i32,
    pub y_shadow: i32,
    pub tint: Option<f32>,
    pub is_pokemon: bool,
    pub is_item: bool,
}

pub trait BattleEngine {
    fn level_for_wave(&self, wave_index: u32) -> u32;

    fn trainer_party_levels(&self, trainer: &TrainerKey, wave_index: u32) -> Vec<u32>;

    fn boss_segments(&self, wave_index: u32, level: u32, species: &SpeciesKey) -> u32;

    fn wild_species(&self, wave_index: u32, level: u32, rng: &mut SeededRng) -> SpeciesKey;

    /// Must finish every load before returning; the battle is only started on `Ok`.
    fn load_assets(&mut self, party: &EnemyParty) -> Result<(), AssetLoadError>;

    fn start_battle(&mut self, party: EnemyParty);
}

pub trait SelectionUi {
    /// Index of the chosen sub-option, or `None` on cancel.
    fn select_option(&mut self, count: usize) -> Option<usize>;

    /// Chosen member among those passing `filter`, or `None` on cancel.
    fn select_party_member(
        &mut self,
        party: &Party,
        filter: &dyn Fn(&PartyMember) -> bool,
    ) -> Option<PokemonId>;
}

pub trait Visuals {
    fn show_intro(&mut self, sprites: &[SpriteConfig]);

    fn hide_intro(&mut self) {}
}

/// Visuals sink for headless runs.
#[derive(Debug, Default)]
pub struct HeadlessVisuals;

impl Visuals for HeadlessVisuals {
    fn show_intro(&mut self, _sprites: &[SpriteConfig]) {}
}

/// Answers selections from a prerecorded queue; cancels once it runs dry.
#[derive(Clone, Debug, Default)]
pub struct ScriptedUi {
    options: VecDeque<Option<usize>>,
    party_slots: VecDeque<Option<usize>>,
}

impl ScriptedUi {
    pub fn new(
        options: impl IntoIterator<Item = Option<usize>>,
        party_slots: impl IntoIterator<Item = Option<usize>>,
    ) -> Self {
        Self { options: options.into_iter().collect(), party_slots: party_slots.into_iter().collect() }
    }
}

impl SelectionUi for ScriptedUi {
    fn select_option(&mut self, count: usize) -> Option<usize> {
        self.options.pop_front().flatten().filter(|index| *index < count)
    }

    fn select_party_member(
        &mut self,
        party: &Party,
        filter: &dyn Fn(&PartyMember) -> bool,
    ) -> Option<PokemonId> {
        let slot = self.party_slots.pop_front().flatten()?;
        let id = party.at_slot(slot)?;
        party.get(id).filter(|member| filter(member)).map(|member| member.id)
    }
}

pub struct Collaborators {
    pub battle: Box<dyn BattleEngine>,
    pub ui: Box<dyn SelectionUi>,
    pub visuals: Box<dyn Visuals>,
}

impl Collaborators {
    pub fn headless(battle: Box<dyn BattleEngine>, ui: Box<dyn SelectionUi>) -> Self {
        Self { battle, ui, visuals: Box::new(HeadlessVisuals) }
    }
}
