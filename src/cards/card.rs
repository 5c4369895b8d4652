//! Card values.
//!
//! A card is a single record with an explicit capability set rather than a
//! class hierarchy. Whether a card can fight, has an ability, or fires at
//! day-break is answered by its optional parts:
//!
//! - `combat`: attack, health and the counters that change during play
//! - `ability`: declarative effect list plus the rows it may be summoned to
//! - `is_day_break`: the ability can be activated in phase 1
//!
//! `role` is a classification tag only. The engine never branches on it
//! except to recognize sage cards on the battlefield and creature stock in
//! the shop.
//!
//! Cards are values. A card lives in exactly one zone at a time and moves
//! by being removed from one collection and inserted into another.

use serde::{Deserialize, Serialize};

use super::element::Element;
use crate::effects::Effect;

/// Identifier of a card design. Copies of the same design share an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl CardId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Classification tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardRole {
    Sage,
    Champion,
    Warrior,
    Basic,
    Item,
    Creature,
}

/// Fighting stats of a card on the battlefield.
///
/// Counters never go below zero and `damage_count` never exceeds `health`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatStats {
    pub element: Element,
    pub attack: u32,
    pub health: u32,
    pub shield_count: u32,
    pub boost_count: u32,
    pub damage_count: u32,
}

impl CombatStats {
    #[must_use]
    pub fn new(element: Element, attack: u32, health: u32) -> Self {
        Self {
            element,
            attack,
            health,
            shield_count: 0,
            boost_count: 0,
            damage_count: 0,
        }
    }

    /// Add damage, clamped to health. Returns true if the card is now defeated.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.damage_count = self.damage_count.saturating_add(amount).min(self.health);
        self.is_defeated()
    }

    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.damage_count >= self.health
    }

    #[must_use]
    pub fn remaining_health(&self) -> u32 {
        self.health - self.damage_count
    }

    /// Damage dealt by an attack from this card: attack plus boosts.
    #[must_use]
    pub fn strike(&self) -> u32 {
        self.attack.saturating_add(self.boost_count)
    }
}

/// Set of battlefield rows (1 = rear, 3 = front), stored as a bitmask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowSet(u8);

impl RowSet {
    pub const REAR: RowSet = RowSet(0b001);
    pub const MIDDLE: RowSet = RowSet(0b010);
    pub const FRONT: RowSet = RowSet(0b100);
    pub const ANY: RowSet = RowSet(0b111);

    /// Build from row numbers. Numbers outside 1..=3 are ignored.
    #[must_use]
    pub fn from_rows(rows: &[u8]) -> Self {
        RowSet(
            rows.iter()
                .filter(|row| (1..=3).contains(*row))
                .fold(0, |mask, row| mask | (1 << (row - 1))),
        )
    }

    #[must_use]
    pub fn contains(self, row: u8) -> bool {
        (1..=3).contains(&row) && self.0 & (1 << (row - 1)) != 0
    }

    #[must_use]
    pub fn union(self, other: RowSet) -> RowSet {
        RowSet(self.0 | other.0)
    }
}

/// What a card does when activated, and where it may be summoned.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ability {
    pub effects: Vec<Effect>,
    pub rows: RowSet,
}

impl Ability {
    #[must_use]
    pub fn new(effects: Vec<Effect>) -> Self {
        Self {
            effects,
            rows: RowSet::ANY,
        }
    }

    #[must_use]
    pub fn in_rows(mut self, rows: RowSet) -> Self {
        self.rows = rows;
        self
    }
}

/// A card.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub price: u32,
    pub description: String,
    /// Reference into the client's art catalog.
    pub art: Option<String>,
    pub role: CardRole,
    pub combat: Option<CombatStats>,
    pub ability: Option<Ability>,
    pub is_day_break: bool,
    /// The day-break ability already fired this turn.
    #[serde(default)]
    pub day_break_spent: bool,
    /// Minimum player level needed to summon.
    pub level_requirement: Option<u8>,
}

impl Card {
    #[must_use]
    pub fn new(id: CardId, name: impl Into<String>, role: CardRole) -> Self {
        Self {
            id,
            name: name.into(),
            price: 0,
            description: String::new(),
            art: None,
            role,
            combat: None,
            ability: None,
            is_day_break: false,
            day_break_spent: false,
            level_requirement: None,
        }
    }

    #[must_use]
    pub fn with_price(mut self, price: u32) -> Self {
        self.price = price;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_art(mut self, art: impl Into<String>) -> Self {
        self.art = Some(art.into());
        self
    }

    #[must_use]
    pub fn with_combat(mut self, element: Element, attack: u32, health: u32) -> Self {
        self.combat = Some(CombatStats::new(element, attack, health));
        self
    }

    #[must_use]
    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.ability = Some(ability);
        self
    }

    #[must_use]
    pub fn day_break(mut self) -> Self {
        self.is_day_break = true;
        self
    }

    #[must_use]
    pub fn with_level_requirement(mut self, level: u8) -> Self {
        self.level_requirement = Some(level);
        self
    }

    #[must_use]
    pub fn element(&self) -> Option<Element> {
        self.combat.as_ref().map(|c| c.element)
    }

    #[must_use]
    pub fn is_sage(&self) -> bool {
        self.role == CardRole::Sage
    }

    #[must_use]
    pub fn can_fight(&self) -> bool {
        self.combat.is_some()
    }

    /// Effects of the card's ability, empty if it has none.
    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        self.ability.as_ref().map_or(&[], |a| a.effects.as_slice())
    }

    /// Whether the card may be placed in `row`. Cards without an ability
    /// have no row requirement.
    #[must_use]
    pub fn allowed_in_row(&self, row: u8) -> bool {
        self.ability.as_ref().map_or(true, |a| a.rows.contains(row))
    }

    /// Whether a player at `level` meets the card's level requirement.
    #[must_use]
    pub fn meets_level(&self, level: u8) -> bool {
        self.level_requirement.map_or(true, |required| level >= required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Effect, SlotRef};

    #[test]
    fn test_damage_clamps_to_health() {
        let mut stats = CombatStats::new(Element::Fire, 2, 3);

        assert!(!stats.take_damage(2));
        assert_eq!(stats.remaining_health(), 1);
        assert!(stats.take_damage(10));
        assert_eq!(stats.damage_count, 3);
    }

    #[test]
    fn test_strike_includes_boosts() {
        let mut stats = CombatStats::new(Element::Air, 2, 3);
        stats.boost_count = 3;
        assert_eq!(stats.strike(), 5);
    }

    #[test]
    fn test_row_set() {
        let rows = RowSet::from_rows(&[2, 3, 9]);
        assert!(!rows.contains(1));
        assert!(rows.contains(2));
        assert!(rows.contains(3));
        assert!(!rows.contains(0));
        assert_eq!(RowSet::MIDDLE.union(RowSet::FRONT), rows);
    }

    #[test]
    fn test_capabilities() {
        let plain = Card::new(CardId::new(1), "Recruit", CardRole::Basic)
            .with_combat(Element::Earth, 1, 3);
        assert!(plain.can_fight());
        assert!(plain.allowed_in_row(1));
        assert!(plain.effects().is_empty());
        assert_eq!(plain.element(), Some(Element::Earth));

        let front_only = Card::new(CardId::new(2), "Vanguard", CardRole::Warrior)
            .with_ability(
                Ability::new(vec![Effect::damage_enemy(SlotRef::Chosen(0), 1)])
                    .in_rows(RowSet::FRONT),
            )
            .with_level_requirement(3);
        assert!(!front_only.allowed_in_row(2));
        assert!(front_only.allowed_in_row(3));
        assert!(!front_only.meets_level(2));
        assert!(front_only.meets_level(3));
        assert_eq!(front_only.effects().len(), 1);
    }
}
