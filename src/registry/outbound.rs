//! Outbound notifications.
//!
//! Session operations describe what clients should hear about as a list
//! of [`Outbound`] values. The registry delivers them after the change has
//! been persisted and committed.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::UserId;
use crate::game::{GameSession, TeamNumber};

/// Event name plus JSON payload, as sent over the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub event: String,
    pub payload: Value,
}

/// Who receives a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Audience {
    Player(UserId),
    Team(TeamNumber),
    Room,
    RoomExcept(UserId),
}

/// A message and its audience.
#[derive(Clone, Debug, PartialEq)]
pub struct Outbound {
    pub audience: Audience,
    pub message: OutboundMessage,
}

impl Outbound {
    #[must_use]
    pub fn new(audience: Audience, event: impl Into<String>, payload: Value) -> Self {
        Self {
            audience,
            message: OutboundMessage {
                event: event.into(),
                payload,
            },
        }
    }

    #[must_use]
    pub fn player(user: UserId, event: impl Into<String>, payload: Value) -> Self {
        Self::new(Audience::Player(user), event, payload)
    }

    #[must_use]
    pub fn team(team: TeamNumber, event: impl Into<String>, payload: Value) -> Self {
        Self::new(Audience::Team(team), event, payload)
    }

    #[must_use]
    pub fn room(event: impl Into<String>, payload: Value) -> Self {
        Self::new(Audience::Room, event, payload)
    }

    #[must_use]
    pub fn room_except(user: UserId, event: impl Into<String>, payload: Value) -> Self {
        Self::new(Audience::RoomExcept(user), event, payload)
    }
}

/// JSON value of anything serializable, `null` if it cannot be encoded.
pub(crate) fn to_payload<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Public view of a session: no password, no hidden piles.
pub(crate) fn session_summary(game: &GameSession) -> Value {
    let players: Vec<Value> = game
        .players()
        .map(|p| {
            json!({
                "user": p.user_id,
                "is_host": p.is_game_host,
                "is_ready": p.is_ready,
                "sage": p.sage,
                "level": p.level,
                "team": game.team_of(&p.user_id).map(TeamNumber::number),
                "hand_size": p.hand.len(),
                "deck_size": p.deck.len(),
            })
        })
        .collect();
    json!({
        "id": game.id,
        "name": game.name,
        "is_private": game.is_private,
        "num_players_total": game.num_players_total,
        "is_started": game.is_started,
        "players": players,
    })
}

/// Private view of a player's hand.
pub(crate) fn hand_of(game: &GameSession, user: &UserId) -> Value {
    game.player(user)
        .map(|p| to_payload(&p.hand))
        .unwrap_or(Value::Null)
}
