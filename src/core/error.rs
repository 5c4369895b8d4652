//! Engine error taxonomy.
//!
//! Every operation that can be rejected returns [`EngineError`]. Errors are
//! grouped by [`ErrorKind`] so callers can map them onto a response class
//! without matching every variant:
//!
//! - `Validation`: malformed or out-of-range input
//! - `Conflict`: resource in a state incompatible with the request
//! - `NotFound`: missing session, player, team or card
//! - `GameState`: event not legal in the current phase
//! - `HostOnly`: a host-gated transition attempted by another player
//! - `Storage`: a collaborator (persistence) failed
//!
//! All of them are recoverable and reported to the initiating client only.

use derive_more::{Display, Error};

use crate::phases::{GameEvent, GamePhase};

/// Coarse classification of an [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    GameState,
    HostOnly,
    Storage,
}

/// Error returned by engine operations.
#[derive(Clone, Debug, PartialEq, Eq, Display, Error)]
pub enum EngineError {
    /// Input was malformed or out of range.
    #[display("invalid request: {message}")]
    Validation { message: String },

    /// Generic conflict with the current resource state.
    #[display("conflict: {message}")]
    Conflict { message: String },

    /// The team cannot afford the purchase.
    #[display("not enough gold: need {needed}, have {available}")]
    NotEnoughGold { needed: u32, available: u32 },

    /// The shop refused to restock.
    #[display("shop is full")]
    ShopFull,

    /// The active team has no action points left this turn.
    #[display("no action points left this turn")]
    NoActionPoints,

    /// The acting user is not on the active team.
    #[display("it is not {user}'s turn")]
    NotYourTurn { user: String },

    /// Draw requested from an empty deck.
    #[display("deck of {user} is exhausted")]
    DeckExhausted { user: String },

    /// Something the request referred to does not exist.
    #[display("not found: {what}")]
    NotFound { what: String },

    /// The event is not accepted by the current phase.
    #[display("event {event} is not allowed during {phase}")]
    GameState { event: GameEvent, phase: GamePhase },

    /// The session has not been promoted to an active match yet.
    #[display("session {session} has not started")]
    NotStarted { session: String },

    /// Only the host may trigger this transition.
    #[display("only the game host may {action}")]
    HostOnly { action: String },

    /// Persistence or another collaborator failed.
    #[display("storage failure: {message}")]
    Storage { message: String },
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn host_only(action: impl Into<String>) -> Self {
        Self::HostOnly { action: action.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage { message: message.into() }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Conflict { .. }
            | Self::NotEnoughGold { .. }
            | Self::ShopFull
            | Self::NoActionPoints
            | Self::NotYourTurn { .. }
            | Self::DeckExhausted { .. } => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::GameState { .. } | Self::NotStarted { .. } => ErrorKind::GameState,
            Self::HostOnly { .. } => ErrorKind::HostOnly,
            Self::Storage { .. } => ErrorKind::Storage,
        }
    }
}

impl From<bincode::Error> for EngineError {
    fn from(err: bincode::Error) -> Self {
        Self::storage(format!("snapshot codec: {}", err))
    }
}

/// Result alias used throughout the engine.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(EngineError::validation("x").kind(), ErrorKind::Validation);
        assert_eq!(EngineError::ShopFull.kind(), ErrorKind::Conflict);
        assert_eq!(
            EngineError::NotEnoughGold { needed: 3, available: 1 }.kind(),
            ErrorKind::Conflict
        );
        assert_eq!(EngineError::not_found("player").kind(), ErrorKind::NotFound);
        assert_eq!(EngineError::host_only("start").kind(), ErrorKind::HostOnly);
        assert_eq!(
            EngineError::NotStarted { session: "s".into() }.kind(),
            ErrorKind::GameState
        );
    }

    #[test]
    fn test_display() {
        let err = EngineError::GameState {
            event: GameEvent::StartGame,
            phase: GamePhase::JoiningGame,
        };
        assert_eq!(
            err.to_string(),
            "event StartGame is not allowed during JoiningGame"
        );
        assert_eq!(
            EngineError::NotEnoughGold { needed: 4, available: 2 }.to_string(),
            "not enough gold: need 4, have 2"
        );
    }
}
