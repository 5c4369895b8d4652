//! Players and their card piles.
//!
//! The top of the deck is the back of `deck`. Cards bought or returned
//! during play are put at the bottom (the front).

use serde::{Deserialize, Serialize};

use crate::cards::{Card, CardId, Decklist, Sage};
use crate::core::{ConnectionId, EngineError, EngineResult, GameRng, GameRules, UserId};

/// A player in a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub user_id: UserId,
    pub connection_id: ConnectionId,
    pub is_ready: bool,
    pub is_setup: bool,
    pub has_chosen_warriors: bool,
    pub is_game_host: bool,
    pub sage: Option<Sage>,
    pub decklist: Option<Decklist>,
    pub level: u8,
    pub hand: im::Vector<Card>,
    pub deck: im::Vector<Card>,
    pub discard_pile: im::Vector<Card>,
}

impl Player {
    #[must_use]
    pub fn new(user_id: UserId, connection_id: ConnectionId) -> Self {
        Self {
            user_id,
            connection_id,
            is_ready: false,
            is_setup: false,
            has_chosen_warriors: false,
            is_game_host: false,
            sage: None,
            decklist: None,
            level: 1,
            hand: im::Vector::new(),
            deck: im::Vector::new(),
            discard_pile: im::Vector::new(),
        }
    }

    /// Flip readiness and return the new value.
    pub fn toggle_ready(&mut self) -> bool {
        self.is_ready = !self.is_ready;
        self.is_ready
    }

    /// Replace the transport connection after a reconnect.
    pub fn reconnect(&mut self, connection_id: ConnectionId) {
        self.connection_id = connection_id;
    }

    /// Assign the decklist for the chosen sage and seed a shuffled deck
    /// with its starter cards.
    pub fn init_deck(&mut self, rules: &GameRules, rng: &mut GameRng) -> EngineResult<()> {
        if !self.is_ready {
            return Err(EngineError::validation(format!("{} is not ready", self.user_id)));
        }
        let sage = self
            .sage
            .ok_or_else(|| EngineError::not_found(format!("sage of {}", self.user_id)))?;
        let decklist = Decklist::for_sage(sage);

        self.deck = decklist.starter_cards(rules.starter_basic_copies).into_iter().collect();
        rng.shuffle_vector(&mut self.deck);
        self.decklist = Some(decklist);
        Ok(())
    }

    /// Draw an opening hand.
    pub fn init_hand(&mut self, hand_size: usize) -> EngineResult<()> {
        for _ in 0..hand_size {
            self.draw_card()?;
        }
        Ok(())
    }

    /// Move the top card of the deck into the hand.
    ///
    /// There is no reshuffle from the discard pile: an empty deck is an
    /// error.
    pub fn draw_card(&mut self) -> EngineResult<CardId> {
        let card = self.deck.pop_back().ok_or_else(|| EngineError::DeckExhausted {
            user: self.user_id.to_string(),
        })?;
        let id = card.id;
        self.hand.push_back(card);
        Ok(id)
    }

    /// Draw until the hand holds `hand_size` cards or the deck runs out.
    /// Returns the number of cards drawn.
    pub fn draw_new_hand(&mut self, hand_size: usize) -> usize {
        let mut drawn = 0;
        while self.hand.len() < hand_size {
            match self.deck.pop_back() {
                Some(card) => {
                    self.hand.push_back(card);
                    drawn += 1;
                }
                None => break,
            }
        }
        drawn
    }

    /// Raise the level by one, up to `max_level`.
    pub fn level_up(&mut self, max_level: u8) {
        if self.level < max_level {
            self.level += 1;
        }
    }

    pub fn finish_player_setup(&mut self) -> EngineResult<()> {
        if !self.is_ready || !self.has_chosen_warriors {
            return Err(EngineError::validation(format!(
                "{} must be ready and have chosen warriors",
                self.user_id
            )));
        }
        self.is_setup = true;
        Ok(())
    }

    #[must_use]
    pub fn hand_card(&self, index: usize) -> Option<&Card> {
        self.hand.get(index)
    }

    pub fn remove_card_from_hand(&mut self, index: usize) -> EngineResult<Card> {
        take_at(&mut self.hand, index, "hand")
    }

    pub fn remove_card_from_discard_pile(&mut self, index: usize) -> EngineResult<Card> {
        take_at(&mut self.discard_pile, index, "discard pile")
    }

    pub(crate) fn reset_day_breaks(&mut self) {
        for card in self
            .hand
            .iter_mut()
            .chain(self.deck.iter_mut())
            .chain(self.discard_pile.iter_mut())
        {
            card.day_break_spent = false;
        }
    }

    pub fn add_card_to_hand(&mut self, card: Card) {
        self.hand.push_back(card);
    }

    /// Put a card at the bottom of the deck.
    pub fn add_card_to_deck(&mut self, card: Card) {
        self.deck.push_front(card);
    }

    pub fn add_card_to_discard(&mut self, card: Card) {
        self.discard_pile.push_back(card);
    }
}

fn take_at(pile: &mut im::Vector<Card>, index: usize, name: &str) -> EngineResult<Card> {
    if index >= pile.len() {
        return Err(EngineError::validation(format!(
            "index {} is out of range for a {} of {}",
            index,
            name,
            pile.len()
        )));
    }
    Ok(pile.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;

    fn player() -> Player {
        Player::new(UserId::from("alice"), ConnectionId::from("c1"))
    }

    fn ready_player(sage: Sage) -> Player {
        let mut p = player();
        p.sage = Some(sage);
        p.toggle_ready();
        p
    }

    #[test]
    fn test_init_deck_requires_ready() {
        let mut p = player();
        p.sage = Some(Sage::Pyra);
        let err = p.init_deck(&GameRules::default(), &mut GameRng::new(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_init_deck_requires_sage() {
        let mut p = player();
        p.toggle_ready();
        let err = p.init_deck(&GameRules::default(), &mut GameRng::new(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_init_deck_seeds_starter_cards() {
        let mut p = ready_player(Sage::Maris);
        p.init_deck(&GameRules::default(), &mut GameRng::new(1)).unwrap();

        assert_eq!(p.deck.len(), 6);
        assert_eq!(p.decklist.as_ref().map(|d| d.sage), Some(Sage::Maris));
    }

    #[test]
    fn test_draw_and_exhaustion() {
        let mut p = ready_player(Sage::Pyra);
        p.init_deck(&GameRules::default(), &mut GameRng::new(1)).unwrap();
        p.init_hand(5).unwrap();
        assert_eq!(p.hand.len(), 5);
        assert_eq!(p.deck.len(), 1);

        p.draw_card().unwrap();
        let err = p.draw_card().unwrap_err();
        assert_eq!(err, EngineError::DeckExhausted { user: "alice".into() });
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_draw_new_hand_stops_at_empty_deck() {
        let mut p = ready_player(Sage::Pyra);
        p.init_deck(&GameRules::default(), &mut GameRng::new(1)).unwrap();

        assert_eq!(p.draw_new_hand(10), 6);
        assert_eq!(p.draw_new_hand(10), 0);
    }

    #[test]
    fn test_level_ceiling() {
        let mut p = player();
        for _ in 0..20 {
            p.level_up(8);
        }
        assert_eq!(p.level, 8);
    }

    #[test]
    fn test_finish_setup_requires_warriors() {
        let mut p = ready_player(Sage::Pyra);
        assert!(p.finish_player_setup().is_err());
        p.has_chosen_warriors = true;
        p.finish_player_setup().unwrap();
        assert!(p.is_setup);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut p = player();
        assert_eq!(
            p.remove_card_from_hand(0).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            p.remove_card_from_discard_pile(3).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_reconnect_keeps_identity() {
        let mut p = player();
        p.reconnect(ConnectionId::from("c2"));
        assert_eq!(p.user_id, UserId::from("alice"));
        assert_eq!(p.connection_id, ConnectionId::from("c2"));
    }
}
