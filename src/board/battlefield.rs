//! Team battlefield.
//!
//! A battlefield is a fixed array of slots. Slot count and adjacency are
//! fixed at construction by the [`BoardLayout`] and never change. Each slot
//! holds at most one card.
//!
//! Every operation taking a [`SlotId`] rejects numbers outside the layout
//! with a validation error before looking at the slot.

use serde::{Deserialize, Serialize};

use super::topology::{BoardLayout, Direction};
use crate::cards::Card;
use crate::core::{EngineError, EngineResult};
use crate::effects::Effect;

/// A battlefield space number, 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub u8);

impl SlotId {
    #[must_use]
    pub const fn new(space: u8) -> Self {
        Self(space)
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot {}", self.0)
    }
}

/// One space on the battlefield.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattlefieldSlot {
    pub space_number: SlotId,
    pub card: Option<Card>,
    /// Neighbors indexed by [`Direction::index`].
    pub connections: [Option<SlotId>; 8],
}

impl BattlefieldSlot {
    fn new(layout: BoardLayout, space: u8) -> Self {
        let mut connections = [None; 8];
        for &(dir, other) in layout.edges(space) {
            connections[dir.index()] = Some(SlotId::new(other));
        }
        Self {
            space_number: SlotId::new(space),
            card: None,
            connections,
        }
    }

    #[must_use]
    pub fn neighbor(&self, dir: Direction) -> Option<SlotId> {
        self.connections[dir.index()]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.card.is_none()
    }
}

/// The grid of slots owned by one team.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Battlefield {
    layout: BoardLayout,
    slots: Vec<BattlefieldSlot>,
}

impl Battlefield {
    /// An empty battlefield for `layout`.
    #[must_use]
    pub fn new(layout: BoardLayout) -> Self {
        Self {
            layout,
            slots: (1..=layout.slot_count())
                .map(|space| BattlefieldSlot::new(layout, space))
                .collect(),
        }
    }

    /// An empty battlefield sized for `team_size` players.
    pub fn for_team_size(team_size: usize) -> EngineResult<Self> {
        Ok(Self::new(BoardLayout::for_team_size(team_size)?))
    }

    #[must_use]
    pub fn layout(&self) -> BoardLayout {
        self.layout
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(BattlefieldSlot::is_empty)
    }

    fn index(&self, slot: SlotId) -> EngineResult<usize> {
        if self.layout.contains(slot.0) {
            Ok(usize::from(slot.0 - 1))
        } else {
            Err(EngineError::validation(format!(
                "{} is outside a {}-slot battlefield",
                slot,
                self.layout.slot_count()
            )))
        }
    }

    pub fn slot(&self, slot: SlotId) -> EngineResult<&BattlefieldSlot> {
        let index = self.index(slot)?;
        Ok(&self.slots[index])
    }

    pub fn slots(&self) -> impl Iterator<Item = &BattlefieldSlot> {
        self.slots.iter()
    }

    /// Occupied slots with their cards.
    pub fn cards(&self) -> impl Iterator<Item = (SlotId, &Card)> {
        self.slots
            .iter()
            .filter_map(|s| s.card.as_ref().map(|card| (s.space_number, card)))
    }

    pub fn get_card(&self, slot: SlotId) -> EngineResult<Option<&Card>> {
        Ok(self.slot(slot)?.card.as_ref())
    }

    fn occupied_mut(&mut self, slot: SlotId) -> EngineResult<&mut Card> {
        let index = self.index(slot)?;
        self.slots[index]
            .card
            .as_mut()
            .ok_or_else(|| EngineError::validation(format!("{} is empty", slot)))
    }

    /// Place `card` into an empty slot.
    pub fn add_card(&mut self, card: Card, slot: SlotId) -> EngineResult<()> {
        let index = self.index(slot)?;
        let target = &mut self.slots[index];
        if let Some(existing) = &target.card {
            return Err(EngineError::conflict(format!(
                "{} is occupied by {}",
                slot, existing.name
            )));
        }
        target.card = Some(card);
        Ok(())
    }

    /// Take the card out of a slot.
    pub fn remove_card(&mut self, slot: SlotId) -> EngineResult<Card> {
        let index = self.index(slot)?;
        self.slots[index]
            .card
            .take()
            .ok_or_else(|| EngineError::validation(format!("{} is empty", slot)))
    }

    /// Exchange the cards of two occupied slots. Nothing changes on error.
    pub fn swap_cards(&mut self, a: SlotId, b: SlotId) -> EngineResult<()> {
        let ia = self.index(a)?;
        let ib = self.index(b)?;
        if ia == ib {
            return Err(EngineError::validation(format!("cannot swap {} with itself", a)));
        }
        if self.slots[ia].is_empty() || self.slots[ib].is_empty() {
            return Err(EngineError::validation(format!(
                "swap needs cards in both {} and {}",
                a, b
            )));
        }
        let card_a = self.slots[ia].card.take();
        self.slots[ia].card = self.slots[ib].card.take();
        self.slots[ib].card = card_a;
        Ok(())
    }

    /// Damage the card in `slot`, clamped to its health.
    ///
    /// Returns true if the card is defeated. The card stays in the slot;
    /// removing it is up to the caller.
    pub fn damage_card_at_position(&mut self, slot: SlotId, amount: u32) -> EngineResult<bool> {
        let card = self.occupied_mut(slot)?;
        let name = card.name.clone();
        let stats = card
            .combat
            .as_mut()
            .ok_or_else(|| EngineError::validation(format!("{} cannot take damage", name)))?;
        Ok(stats.take_damage(amount))
    }

    /// Remove all damage from the card in `slot`. Cards without combat
    /// stats are left alone.
    pub fn clear_damage(&mut self, slot: SlotId) -> EngineResult<()> {
        if let Some(stats) = self.occupied_mut(slot)?.combat.as_mut() {
            stats.damage_count = 0;
        }
        Ok(())
    }

    pub fn add_shield_to_card_at_position(&mut self, slot: SlotId, amount: u32) -> EngineResult<()> {
        if let Some(stats) = self.occupied_mut(slot)?.combat.as_mut() {
            stats.shield_count = stats.shield_count.saturating_add(amount);
        }
        Ok(())
    }

    pub fn add_boost_to_card_at_position(&mut self, slot: SlotId, amount: u32) -> EngineResult<()> {
        if let Some(stats) = self.occupied_mut(slot)?.combat.as_mut() {
            stats.boost_count = stats.boost_count.saturating_add(amount);
        }
        Ok(())
    }

    /// Consume one shield. Returns false if the card had none.
    pub fn consume_shield(&mut self, slot: SlotId) -> EngineResult<bool> {
        match self.occupied_mut(slot)?.combat.as_mut() {
            Some(stats) if stats.shield_count > 0 => {
                stats.shield_count -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Reset the boosts of the card in `slot`.
    pub fn consume_boosts(&mut self, slot: SlotId) -> EngineResult<()> {
        if let Some(stats) = self.occupied_mut(slot)?.combat.as_mut() {
            stats.boost_count = 0;
        }
        Ok(())
    }

    /// Slots holding day-break cards.
    #[must_use]
    pub fn get_day_break_cards(&self) -> Vec<SlotId> {
        self.cards()
            .filter(|(_, card)| card.is_day_break)
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Effects of the day-break card in `slot`.
    ///
    /// Does not record that the card was used this turn.
    pub fn activate_day_break(&self, slot: SlotId) -> EngineResult<Vec<Effect>> {
        let card = self
            .get_card(slot)?
            .ok_or_else(|| EngineError::validation(format!("{} is empty", slot)))?;
        if !card.is_day_break {
            return Err(EngineError::validation(format!(
                "{} has no day-break ability",
                card.name
            )));
        }
        Ok(card.effects().to_vec())
    }

    pub fn day_break_spent(&self, slot: SlotId) -> EngineResult<bool> {
        Ok(self.get_card(slot)?.is_some_and(|card| card.day_break_spent))
    }

    /// Mark the day-break card in `slot` as used for this turn.
    pub fn mark_day_break_spent(&mut self, slot: SlotId) -> EngineResult<()> {
        let card = self.occupied_mut(slot)?;
        if card.day_break_spent {
            return Err(EngineError::conflict(format!(
                "{} already used its day-break this turn",
                card.name
            )));
        }
        card.day_break_spent = true;
        Ok(())
    }

    /// Clear the day-break marks of every card on the field.
    pub fn reset_day_breaks(&mut self) {
        for card in self.slots.iter_mut().filter_map(|s| s.card.as_mut()) {
            card.day_break_spent = false;
        }
    }

    /// Neighbors of `slot` with their directions.
    pub fn neighbors(&self, slot: SlotId) -> EngineResult<Vec<(Direction, SlotId)>> {
        let slot = self.slot(slot)?;
        Ok(Direction::ALL
            .into_iter()
            .filter_map(|dir| slot.neighbor(dir).map(|n| (dir, n)))
            .collect())
    }

    /// First occupied slot whose card matches `predicate`.
    pub fn find_slot<F>(&self, predicate: F) -> Option<SlotId>
    where
        F: Fn(&Card) -> bool,
    {
        self.cards()
            .find(|(_, card)| predicate(card))
            .map(|(slot, _)| slot)
    }

    pub fn row_of(&self, slot: SlotId) -> EngineResult<u8> {
        self.index(slot)?;
        self.layout
            .row_of(slot.0)
            .ok_or_else(|| EngineError::validation(format!("{} has no row", slot)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardId, CardRole, Element};
    use crate::core::ErrorKind;

    fn fighter(id: u32, health: u32) -> Card {
        Card::new(CardId::new(id), format!("Fighter {}", id), CardRole::Creature)
            .with_combat(Element::Fire, 1, health)
    }

    #[test]
    fn test_sizes() {
        assert_eq!(Battlefield::for_team_size(1).unwrap().len(), 6);
        assert_eq!(Battlefield::for_team_size(2).unwrap().len(), 12);
    }

    #[test]
    fn test_connections_built_from_table() {
        let field = Battlefield::new(BoardLayout::Duo);
        let slot = field.slot(SlotId::new(4)).unwrap();

        assert_eq!(slot.neighbor(Direction::Top), Some(SlotId::new(1)));
        assert_eq!(slot.neighbor(Direction::BottomRight), Some(SlotId::new(10)));
        assert_eq!(slot.neighbor(Direction::TopLeft), None);
        assert_eq!(field.neighbors(SlotId::new(4)).unwrap().len(), 7);
    }

    #[test]
    fn test_add_to_occupied_conflicts() {
        let mut field = Battlefield::new(BoardLayout::Solo);
        field.add_card(fighter(1, 3), SlotId::new(2)).unwrap();

        let err = field.add_card(fighter(2, 3), SlotId::new(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_invalid_slot_is_validation() {
        let mut field = Battlefield::new(BoardLayout::Solo);

        for space in [0, 7] {
            let err = field.add_card(fighter(1, 3), SlotId::new(space)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert_eq!(field.row_of(SlotId::new(7)).unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_remove_empty_is_validation() {
        let mut field = Battlefield::new(BoardLayout::Solo);
        assert_eq!(
            field.remove_card(SlotId::new(1)).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_damage_and_defeat() {
        let mut field = Battlefield::new(BoardLayout::Solo);
        field.add_card(fighter(1, 3), SlotId::new(4)).unwrap();

        assert!(!field.damage_card_at_position(SlotId::new(4), 2).unwrap());
        assert!(field.damage_card_at_position(SlotId::new(4), 5).unwrap());

        let card = field.get_card(SlotId::new(4)).unwrap().unwrap();
        assert_eq!(card.combat.as_ref().unwrap().damage_count, 3);

        field.clear_damage(SlotId::new(4)).unwrap();
        let card = field.get_card(SlotId::new(4)).unwrap().unwrap();
        assert_eq!(card.combat.as_ref().unwrap().damage_count, 0);
    }

    #[test]
    fn test_shield_and_boost_are_additive() {
        let mut field = Battlefield::new(BoardLayout::Solo);
        field.add_card(fighter(1, 3), SlotId::new(1)).unwrap();

        field.add_shield_to_card_at_position(SlotId::new(1), 2).unwrap();
        field.add_shield_to_card_at_position(SlotId::new(1), 1).unwrap();
        field.add_boost_to_card_at_position(SlotId::new(1), 4).unwrap();

        let stats = field.get_card(SlotId::new(1)).unwrap().unwrap().combat.clone().unwrap();
        assert_eq!(stats.shield_count, 3);
        assert_eq!(stats.boost_count, 4);

        assert!(field.consume_shield(SlotId::new(1)).unwrap());
        field.consume_boosts(SlotId::new(1)).unwrap();
        let stats = field.get_card(SlotId::new(1)).unwrap().unwrap().combat.clone().unwrap();
        assert_eq!(stats.shield_count, 2);
        assert_eq!(stats.boost_count, 0);
    }

    #[test]
    fn test_day_break() {
        let mut field = Battlefield::new(BoardLayout::Solo);
        let herald = fighter(1, 3)
            .with_ability(crate::cards::Ability::new(vec![Effect::CollectGold { amount: 1 }]))
            .day_break();
        field.add_card(herald, SlotId::new(4)).unwrap();
        field.add_card(fighter(2, 3), SlotId::new(6)).unwrap();

        assert_eq!(field.get_day_break_cards(), vec![SlotId::new(4)]);
        assert_eq!(
            field.activate_day_break(SlotId::new(4)).unwrap(),
            vec![Effect::CollectGold { amount: 1 }]
        );
        assert!(field.activate_day_break(SlotId::new(6)).is_err());
        assert!(field.activate_day_break(SlotId::new(5)).is_err());
    }

    #[test]
    fn test_find_slot() {
        let mut field = Battlefield::new(BoardLayout::Duo);
        field.add_card(fighter(7, 3), SlotId::new(9)).unwrap();

        assert_eq!(field.find_slot(|c| c.id == CardId::new(7)), Some(SlotId::new(9)));
        assert_eq!(field.find_slot(|c| c.id == CardId::new(8)), None);
    }
}
