//! Shops: a backing deck and the cards currently on offer.
//!
//! ## Restock guard
//!
//! `add_card_to_shop` refuses with `ShopFull` when the *backing deck*
//! holds exactly `shop_size` cards. It does not look at how many cards are
//! offered.
//!
//! `restock` does not go through that guard. After a purchase or refresh
//! the offer goes back to `shop_size` cards as long as the backing deck
//! has any left, so the last `shop_size` stock cards still reach the
//! offer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cards::Card;
use crate::core::{EngineError, EngineResult, GameRng};

/// The two shops of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopKind {
    Creature,
    Item,
}

impl std::fmt::Display for ShopKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShopKind::Creature => f.write_str("creature shop"),
            ShopKind::Item => f.write_str("item shop"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub kind: ShopKind,
    shop_size: usize,
    /// Backing deck; the top is the back.
    pub deck: im::Vector<Card>,
    pub offered: im::Vector<Card>,
}

impl Shop {
    /// Shuffle `stock` into a backing deck and fill the offer.
    #[must_use]
    pub fn new(kind: ShopKind, stock: Vec<Card>, shop_size: usize, rng: &mut GameRng) -> Self {
        let mut deck: im::Vector<Card> = stock.into_iter().collect();
        rng.shuffle_vector(&mut deck);
        let mut shop = Self {
            kind,
            shop_size,
            deck,
            offered: im::Vector::new(),
        };
        shop.restock();
        shop
    }

    #[must_use]
    pub fn shop_size(&self) -> usize {
        self.shop_size
    }

    /// Draw one card from the backing deck into the offer.
    pub fn add_card_to_shop(&mut self) -> EngineResult<()> {
        if self.deck.len() == self.shop_size {
            return Err(EngineError::ShopFull);
        }
        let card = self
            .deck
            .pop_back()
            .ok_or_else(|| EngineError::conflict(format!("{} has no stock left", self.kind)))?;
        self.offered.push_back(card);
        Ok(())
    }

    /// Offer cards until `shop_size` are shown or the backing deck is
    /// empty. Returns the number of cards added.
    pub fn restock(&mut self) -> usize {
        let mut added = 0;
        while self.offered.len() < self.shop_size {
            let Some(card) = self.deck.pop_back() else {
                debug!(shop = %self.kind, offered = self.offered.len(), "out of stock");
                break;
            };
            self.offered.push_back(card);
            added += 1;
        }
        added
    }

    #[must_use]
    pub fn offered_card(&self, index: usize) -> Option<&Card> {
        self.offered.get(index)
    }

    /// Remove the offered card at `index`. Does not restock.
    pub fn take_offered(&mut self, index: usize) -> EngineResult<Card> {
        if index >= self.offered.len() {
            return Err(EngineError::validation(format!(
                "{} offers {} cards, no index {}",
                self.kind,
                self.offered.len(),
                index
            )));
        }
        Ok(self.offered.remove(index))
    }

    /// Return every offered card to the bottom of the backing deck and
    /// restock.
    pub fn refresh(&mut self) -> usize {
        while let Some(card) = self.offered.pop_front() {
            self.deck.push_front(card);
        }
        self.restock()
    }
}
