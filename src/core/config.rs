//! Match rules configuration.
//!
//! Hosts configure the engine by providing a `GameRules` when a session is
//! created. Every numeric rule the engine enforces lives here so that a
//! variant ruleset never requires code changes. The defaults are the
//! standard ruleset.
//!
//! `GameRules` deserializes with `#[serde(default)]`, so a partial
//! document only overrides the keys it names.

use serde::{Deserialize, Serialize};

/// Numeric rules for a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Cards in an opening hand and the refill target at end of turn.
    pub hand_size: usize,

    /// Cards each shop keeps on offer.
    pub shop_size: usize,

    /// Level ceiling for players.
    pub max_level: u8,

    /// Gold cap for a one-player team.
    pub max_gold_solo: u32,

    /// Gold cap for a two-player team.
    pub max_gold_duo: u32,

    /// Action points per turn in a 2-player match.
    pub action_points_two_players: u32,

    /// Action points per turn in a 4-player match.
    pub action_points_four_players: u32,

    /// Action points consumed by each phase-2 action.
    pub action_cost: u32,

    /// Gold charged for refreshing a shop.
    pub refresh_cost: u32,

    /// Copies of the basic card in a starter deck.
    pub starter_basic_copies: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            hand_size: 5,
            shop_size: 3,
            max_level: 8,
            max_gold_solo: 12,
            max_gold_duo: 20,
            action_points_two_players: 3,
            action_points_four_players: 6,
            action_cost: 1,
            refresh_cost: 1,
            starter_basic_copies: 4,
        }
    }
}

impl GameRules {
    /// Standard ruleset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gold cap for a team of the given size.
    #[must_use]
    pub fn max_gold(&self, team_size: usize) -> u32 {
        if team_size >= 2 {
            self.max_gold_duo
        } else {
            self.max_gold_solo
        }
    }

    /// Action points per turn for a match with `num_players` players.
    #[must_use]
    pub fn max_action_points(&self, num_players: usize) -> u32 {
        if num_players >= 4 {
            self.action_points_four_players
        } else {
            self.action_points_two_players
        }
    }

    #[must_use]
    pub fn with_hand_size(mut self, size: usize) -> Self {
        self.hand_size = size;
        self
    }

    #[must_use]
    pub fn with_shop_size(mut self, size: usize) -> Self {
        self.shop_size = size;
        self
    }

    #[must_use]
    pub fn with_max_gold(mut self, solo: u32, duo: u32) -> Self {
        self.max_gold_solo = solo;
        self.max_gold_duo = duo;
        self
    }

    #[must_use]
    pub fn with_action_points(mut self, two_players: u32, four_players: u32) -> Self {
        self.action_points_two_players = two_players;
        self.action_points_four_players = four_players;
        self
    }

    #[must_use]
    pub fn with_refresh_cost(mut self, cost: u32) -> Self {
        self.refresh_cost = cost;
        self
    }

    /// Parse rules from a JSON document, filling omitted keys with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
