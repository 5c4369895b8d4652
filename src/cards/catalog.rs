//! Built-in decklists and shop stock.
//!
//! There is one decklist per sage plus the shared shop stock. It
//! is deliberately small: enough cards for a match to be playable end to
//! end.
//!
//! ## Id ranges
//!
//! Each element owns a block of a hundred ids (Fire 100, Water 200,
//! Earth 300, Air 400). Creature shop stock starts at 500, item shop stock
//! at 600.

use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use super::card::{Ability, Card, CardId, CardRole, RowSet};
use super::element::{Element, Sage};
use crate::effects::{CardMove, Effect, EffectTarget, IndexRef, Pile, SlotRef};

/// The fixed set of cards a player receives for a sage choice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decklist {
    pub sage: Sage,
    pub sage_card: Card,
    pub basic: Card,
    /// Three warriors. Two of them start on the battlefield.
    pub warriors: Vec<Card>,
    pub champions: Vec<Card>,
    pub items: Vec<Card>,
}

impl Decklist {
    /// The decklist bound to `sage`.
    #[must_use]
    pub fn for_sage(sage: Sage) -> Self {
        let element = sage.element();
        let base = element_base(element);
        let name = element_word(element);

        let sage_card = Card::new(CardId::new(base + 1), sage.to_string(), CardRole::Sage)
            .with_description(format!("{} sage", element))
            .with_art(format!("sages/{}", sage.to_string().to_lowercase()))
            .with_combat(element, 1, 20)
            .with_ability(Ability::new(sage_skill(element)));

        let basic = Card::new(CardId::new(base + 2), format!("{} Recruit", name), CardRole::Basic)
            .with_price(1)
            .with_description("Starter creature")
            .with_combat(element, 1, 3);

        let warriors = vec![
            Card::new(CardId::new(base + 3), format!("{} Herald", name), CardRole::Warrior)
                .with_price(2)
                .with_description("Collects 1 gold at day-break")
                .with_combat(element, 1, 4)
                .with_ability(Ability::new(vec![Effect::CollectGold { amount: 1 }]))
                .day_break(),
            Card::new(CardId::new(base + 4), format!("{} Striker", name), CardRole::Warrior)
                .with_price(2)
                .with_description("Deals 1 damage to a chosen enemy")
                .with_combat(element, 2, 3)
                .with_ability(
                    Ability::new(vec![Effect::damage_enemy(SlotRef::Chosen(0), 1)])
                        .in_rows(RowSet::FRONT),
                ),
            Card::new(CardId::new(base + 5), format!("{} Guard", name), CardRole::Warrior)
                .with_price(2)
                .with_description("Gains a boost")
                .with_combat(element, 1, 5)
                .with_ability(
                    Ability::new(vec![Effect::boost(SlotRef::Source, 1)])
                        .in_rows(RowSet::MIDDLE.union(RowSet::FRONT)),
                ),
        ];

        let champions = vec![
            Card::new(CardId::new(base + 6), format!("{} Knight", name), CardRole::Champion)
                .with_price(4)
                .with_combat(element, 3, 6)
                .with_level_requirement(3),
            Card::new(CardId::new(base + 7), format!("{} Titan", name), CardRole::Champion)
                .with_price(6)
                .with_combat(element, 5, 9)
                .with_ability(
                    Ability::new(vec![Effect::damage_enemy(SlotRef::Chosen(0), 2)])
                        .in_rows(RowSet::FRONT),
                )
                .with_level_requirement(5),
        ];

        let items = vec![
            Card::new(CardId::new(base + 8), format!("{} Tonic", name), CardRole::Item)
                .with_price(1)
                .with_description("Removes all damage from a chosen ally")
                .with_ability(Ability::new(vec![Effect::heal(SlotRef::Chosen(0))])),
            Card::new(CardId::new(base + 9), format!("{} Charm", name), CardRole::Item)
                .with_price(2)
                .with_ability(Ability::new(element_item(element))),
        ];

        Self {
            sage,
            sage_card,
            basic,
            warriors,
            champions,
            items,
        }
    }

    #[must_use]
    pub fn element(&self) -> Element {
        self.sage.element()
    }

    /// Cards a fresh deck is seeded with: basics plus items.
    #[must_use]
    pub fn starter_cards(&self, basic_copies: usize) -> Vec<Card> {
        std::iter::repeat(self.basic.clone())
            .take(basic_copies)
            .chain(self.items.iter().cloned())
            .collect()
    }

    /// Warrior with the given id, if it belongs to this list.
    #[must_use]
    pub fn warrior(&self, id: CardId) -> Option<&Card> {
        self.warriors.iter().find(|w| w.id == id)
    }
}

fn element_base(element: Element) -> u32 {
    match element {
        Element::Fire => 100,
        Element::Water => 200,
        Element::Earth => 300,
        Element::Air => 400,
    }
}

fn element_word(element: Element) -> &'static str {
    match element {
        Element::Fire => "Ember",
        Element::Water => "Tide",
        Element::Earth => "Stone",
        Element::Air => "Gale",
    }
}

fn sage_skill(element: Element) -> Vec<Effect> {
    match element {
        Element::Fire => vec![Effect::damage_enemy(SlotRef::Chosen(0), 2)],
        Element::Water => vec![Effect::heal(SlotRef::Chosen(0))],
        Element::Earth => vec![Effect::shield(SlotRef::Chosen(0), 1)],
        Element::Air => vec![
            Effect::DrawCards { count: 1 },
            Effect::boost(SlotRef::Chosen(0), 1),
        ],
    }
}

fn element_item(element: Element) -> Vec<Effect> {
    match element {
        Element::Fire => vec![Effect::damage_enemy(SlotRef::Chosen(0), 1)],
        Element::Water => vec![Effect::MoveCards {
            target: EffectTarget::Own,
            moves: vec![CardMove::FromField {
                slot: SlotRef::Chosen(0),
                to: Pile::Hand,
            }],
        }],
        Element::Earth => vec![Effect::shield(SlotRef::Chosen(0), 2)],
        Element::Air => vec![Effect::SwapFieldPositions {
            target: EffectTarget::Own,
            slots: smallvec![SlotRef::Chosen(0), SlotRef::Chosen(1)],
        }],
    }
}

/// Creature stock for the creature shop.
#[must_use]
pub fn creature_shop_stock() -> Vec<Card> {
    let mut stock = Vec::new();
    for (i, element) in Element::ALL.into_iter().enumerate() {
        let base = 500 + (i as u32) * 3;
        let name = element_word(element);
        stock.push(
            Card::new(CardId::new(base + 1), format!("{} Hound", name), CardRole::Creature)
                .with_price(2)
                .with_combat(element, 2, 3),
        );
        stock.push(
            Card::new(CardId::new(base + 2), format!("{} Sentinel", name), CardRole::Creature)
                .with_price(3)
                .with_combat(element, 1, 6)
                .with_ability(Ability::new(vec![Effect::shield(SlotRef::Source, 1)])),
        );
        stock.push(
            Card::new(CardId::new(base + 3), format!("{} Raider", name), CardRole::Creature)
                .with_price(4)
                .with_combat(element, 3, 4)
                .with_ability(
                    Ability::new(vec![Effect::damage_enemy(SlotRef::Chosen(0), 1)])
                        .in_rows(RowSet::FRONT),
                )
                .with_level_requirement(2),
        );
    }
    stock
}

/// Item stock for the item shop.
#[must_use]
pub fn item_shop_stock() -> Vec<Card> {
    let mut stock = Vec::new();
    for copy in 0..3u32 {
        let base = 600 + copy * 3;
        stock.push(
            Card::new(CardId::new(base + 1), "Coin Purse", CardRole::Item)
                .with_price(1)
                .with_ability(Ability::new(vec![Effect::CollectGold { amount: 2 }])),
        );
        stock.push(
            Card::new(CardId::new(base + 2), "Scroll of Insight", CardRole::Item)
                .with_price(2)
                .with_ability(Ability::new(vec![Effect::DrawCards { count: 2 }])),
        );
        stock.push(
            Card::new(CardId::new(base + 3), "Call to Arms", CardRole::Item)
                .with_price(3)
                .with_description("Returns a card from the discard pile to the field")
                .with_ability(Ability::new(vec![Effect::MoveCards {
                    target: EffectTarget::Own,
                    moves: vec![CardMove::ToField {
                        from: Pile::Discard,
                        index: IndexRef::Chosen(0),
                        slot: SlotRef::Chosen(0),
                    }],
                }])),
        );
    }
    stock
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decklist_shape() {
        for sage in Sage::ALL {
            let list = Decklist::for_sage(sage);
            assert_eq!(list.element(), sage.element());
            assert!(list.sage_card.is_sage());
            assert_eq!(list.warriors.len(), 3);
            assert_eq!(list.champions.len(), 2);
            assert_eq!(list.items.len(), 2);
            assert!(list.warriors[0].is_day_break);
            assert_eq!(list.sage_card.element(), Some(sage.element()));
        }
    }

    #[test]
    fn test_starter_cards() {
        let list = Decklist::for_sage(Sage::Terran);
        let starter = list.starter_cards(4);

        assert_eq!(starter.len(), 6);
        assert_eq!(starter.iter().filter(|c| c.id == list.basic.id).count(), 4);
    }

    #[test]
    fn test_warrior_lookup() {
        let list = Decklist::for_sage(Sage::Pyra);
        assert!(list.warrior(CardId::new(104)).is_some());
        assert!(list.warrior(CardId::new(204)).is_none());
    }

    #[test]
    fn test_shop_stock_sizes() {
        assert_eq!(creature_shop_stock().len(), 12);
        assert_eq!(item_shop_stock().len(), 9);
        assert!(creature_shop_stock().iter().all(|c| c.can_fight()));
        assert!(item_shop_stock().iter().all(|c| !c.can_fight()));
    }

    #[test]
    fn test_design_ids_unique() {
        let mut ids: Vec<CardId> = Sage::ALL
            .into_iter()
            .flat_map(|sage| {
                let list = Decklist::for_sage(sage);
                [list.sage_card, list.basic]
                    .into_iter()
                    .chain(list.warriors)
                    .chain(list.champions)
                    .chain(list.items)
            })
            .chain(creature_shop_stock())
            .chain(item_shop_stock())
            .map(|card| card.id)
            .collect();
        // 4 elements x 9 designs + 12 creatures + 9 items
        assert_eq!(ids.len(), 57);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 57);
    }
}
