//! Run-level state threaded explicitly into every requirement and phase.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::config::SpawnConfig;
use crate::types::{
    AbilityKey, ElementType, EncounterTier, EncounterType, ItemKey, MoveKey, NatureKey, PokemonId,
    SpeciesKey, StatusEffect, TimeOfDay, Weather,
};

pub const MAX_FRIENDSHIP: u32 = 255;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldItem {
    pub item: ItemKey,
    pub stack: u32,
    /// Set for attack-type boosters.
    pub boosted_type: Option<ElementType>,
}

impl HeldItem {
    pub fn new(item: impl Into<ItemKey>, stack: u32) -> Self {
        Self { item: item.into(), stack, boosted_type: None }
    }

    pub fn type_booster(item: impl Into<ItemKey>, boosted_type: ElementType) -> Self {
        Self { item: item.into(), stack: 1, boosted_type: Some(boosted_type) }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartyMember {
    pub id: PokemonId,
    pub name: String,
    pub species: SpeciesKey,
    pub nature: NatureKey,
    pub types: Vec<ElementType>,
    pub ability: AbilityKey,
    pub moveset: Vec<MoveKey>,
    /// TM moves this species can learn; egg moves are never listed here.
    pub compatible_tms: Vec<MoveKey>,
    pub status: StatusEffect,
    pub level: u32,
    pub exp: u64,
    pub friendship: u32,
    pub hp: u32,
    pub max_hp: u32,
    pub weight: f64,
    /// hp, atk, def, spatk, spdef, spd
    pub stats: [u32; 6],
    pub held_items: Vec<HeldItem>,
    /// Items that trigger a form change for this member's species and form.
    pub form_change_items: Vec<ItemKey>,
    pub evolution_items: Vec<ItemKey>,
    pub active: bool,
    /// False when a challenge rule bans the member from battle.
    pub allowed: bool,
    pub pokerus: bool,
}

impl PartyMember {
    pub fn new(species: impl Into<SpeciesKey>, level: u32) -> Self {
        let species = species.into();
        Self {
            id: PokemonId::default(),
            name: species.as_str().to_string(),
            species,
            nature: NatureKey::from("HARDY"),
            types: Vec::new(),
            ability: AbilityKey::from("NONE"),
            moveset: Vec::new(),
            compatible_tms: Vec::new(),
            status: StatusEffect::None,
            level,
            exp: 0,
            friendship: 70,
            hp: 100,
            max_hp: 100,
            weight: 10.0,
            stats: [100; 6],
            held_items: Vec::new(),
            form_change_items: Vec::new(),
            evolution_items: Vec::new(),
            active: false,
            allowed: true,
            pokerus: false,
        }
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0 || self.status == StatusEffect::Faint
    }

    pub fn is_allowed_in_battle(&self) -> bool {
        self.allowed && !self.is_fainted()
    }

    pub fn health_ratio(&self) -> f64 {
        if self.max_hp == 0 {
            return 0.0;
        }
        f64::from(self.hp) / f64::from(self.max_hp)
    }

    pub fn stat_total(&self) -> u32 {
        self.stats.iter().sum()
    }
}

/// Arena of party members plus their slot order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Party {
    members: SlotMap<PokemonId, PartyMember>,
    order: Vec<PokemonId>,
}

impl Party {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, member: PartyMember) -> PokemonId {
        let id = self.members.insert(member);
        self.members[id].id = id;
        self.order.push(id);
        id
    }

    pub fn get(&self, id: PokemonId) -> Option<&PartyMember> {
        self.members.get(id)
    }

    pub fn get_mut(&mut self, id: PokemonId) -> Option<&mut PartyMember> {
        self.members.get_mut(id)
    }

    pub fn contains(&self, id: PokemonId) -> bool {
        self.members.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn ids(&self) -> &[PokemonId] {
        &self.order
    }

    pub fn slot_of(&self, id: PokemonId) -> Option<usize> {
        self.order.iter().position(|candidate| *candidate == id)
    }

    pub fn at_slot(&self, slot: usize) -> Option<PokemonId> {
        self.order.get(slot).copied()
    }

    /// Members in slot order.
    pub fn members(&self) -> Vec<&PartyMember> {
        self.order.iter().filter_map(|id| self.members.get(*id)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PartyMember> {
        self.order.iter().filter_map(|id| self.members.get(*id))
    }

    pub fn allowed_in_battle(&self) -> Vec<PokemonId> {
        self.iter().filter(|member| member.is_allowed_in_battle()).map(|member| member.id).collect()
    }

    /// First active member, else the first member allowed in battle.
    pub fn first_active_or_allowed(&self) -> Option<PokemonId> {
        self.iter()
            .find(|member| member.active)
            .or_else(|| self.iter().find(|member| member.is_allowed_in_battle()))
            .map(|member| member.id)
    }
}

/// Stack counts of persistent (run-wide) modifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierBag {
    stacks: BTreeMap<ItemKey, u32>,
}

impl ModifierBag {
    pub fn add(&mut self, item: impl Into<ItemKey>, count: u32) {
        *self.stacks.entry(item.into()).or_insert(0) += count;
    }

    pub fn stack_count(&self, item: &ItemKey) -> u32 {
        self.stacks.get(item).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemKey, u32)> {
        self.stacks.iter().map(|(item, count)| (item, *count))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounteredEvent {
    pub encounter_type: EncounterType,
    pub tier: EncounterTier,
    pub wave_index: u32,
    pub selected_option: Option<usize>,
}

/// Run-level bookkeeping that outlives each encounter instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterHistory {
    pub events: Vec<EncounteredEvent>,
    /// Current spawn weight out of 256, raised on every missed roll.
    pub spawn_weight: u32,
}

impl Default for EncounterHistory {
    fn default() -> Self {
        Self { events: Vec::new(), spawn_weight: SpawnConfig::default().base_weight }
    }
}

impl EncounterHistory {
    pub fn count_of(&self, encounter_type: &EncounterType) -> u32 {
        self.events.iter().filter(|event| &event.encounter_type == encounter_type).count() as u32
    }

    pub fn count_of_tier(&self, tier: EncounterTier) -> u32 {
        self.events.iter().filter(|event| event.tier == tier).count() as u32
    }

    pub fn contains(&self, encounter_type: &EncounterType) -> bool {
        self.events.iter().any(|event| &event.encounter_type == encounter_type)
    }

    pub fn last_wave(&self) -> Option<u32> {
        self.events.last().map(|event| event.wave_index)
    }

    pub fn record(&mut self, event: EncounteredEvent) {
        self.events.push(event);
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunState {
    pub seed: u64,
    pub wave_index: u32,
    pub money: u64,
    pub party: Party,
    pub modifiers: ModifierBag,
    pub history: EncounterHistory,
    pub time_of_day: TimeOfDay,
    pub weather: Weather,
    pub max_level: u32,
}

impl RunState {
    pub fn new(seed: u64, wave_index: u32) -> Self {
        Self {
            seed,
            wave_index,
            money: 0,
            party: Party::new(),
            modifiers: ModifierBag::default(),
            history: EncounterHistory::default(),
            time_of_day: TimeOfDay::default(),
            weather: Weather::default(),
            max_level: 200,
        }
    }

    /// Money awarded for the current wave scaled by `multiplier`, rounded down to tens.
    pub fn wave_money_amount(&self, multiplier: f64) -> u64 {
        wave_money_amount(self.wave_index, multiplier)
    }
}

pub fn wave_money_amount(wave_index: u32, multiplier: f64) -> u64 {
    let wave = f64::from(wave_index.max(1));
    let wave_set_index = (wave / 10.0).ceil() - 1.0;
    let wave_in_set = f64::from((wave_index.max(1) - 1) % 10) + 1.0;
    let base = (wave_set_index + 1.0 + (0.75 + wave_in_set / 10.0)) * 100.0;
    let value = base.powf(1.0 + 0.005 * wave_set_index) * multiplier;
    ((value / 10.0).floor() * 10.0).max(0.0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_money_amount_follows_wave_set_curve() {
        // wave 1: set 0, (0 + 1 + 0.85) * 100 = 185
        assert_eq!(wave_money_amount(1, 1.0), 180);
        // wave 10: set 0, (1 + 1.75) * 100 = 275
        assert_eq!(wave_money_amount(10, 1.0), 270);
        assert_eq!(wave_money_amount(10, 2.0), 550);
        assert!(wave_money_amount(50, 1.0) > wave_money_amount(40, 1.0));
    }

    #[test]
    fn first_active_or_allowed_prefers_active_member() {
        let mut party = Party::new();
        let first = party.add(PartyMember::new("BULBASAUR", 5));
        let mut second_member = PartyMember::new("CHARMANDER", 5);
        second_member.active = true;
        let second = party.add(second_member);

        assert_eq!(party.first_active_or_allowed(), Some(second));
        party.get_mut(second).expect("member").active = false;
        assert_eq!(party.first_active_or_allowed(), Some(first));
    }

    #[test]
    fn first_active_or_allowed_skips_fainted_and_banned() {
        let mut party = Party::new();
        let mut fainted = PartyMember::new("BULBASAUR", 5);
        fainted.hp = 0;
        party.add(fainted);
        let mut banned = PartyMember::new("SQUIRTLE", 5);
        banned.allowed = false;
        party.add(banned);
        let healthy = party.add(PartyMember::new("CHARMANDER", 5));

        assert_eq!(party.first_active_or_allowed(), Some(healthy));
    }

    #[test]
    fn history_counts_by_type_and_tier() {
        let mut history = EncounterHistory::default();
        let sale = EncounterType::from("SALE");
        history.record(EncounteredEvent {
            encounter_type: sale.clone(),
            tier: EncounterTier::Common,
            wave_index: 12,
            selected_option: Some(0),
        });
        history.record(EncounteredEvent {
            encounter_type: EncounterType::from("DOJO"),
            tier: EncounterTier::Great,
            wave_index: 17,
            selected_option: None,
        });

        assert_eq!(history.count_of(&sale), 1);
        assert_eq!(history.count_of_tier(EncounterTier::Great), 1);
        assert_eq!(history.last_wave(), Some(17));
        assert!(history.contains(&sale));
    }
}
