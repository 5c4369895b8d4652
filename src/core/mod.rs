//! Core engine types: identifiers, errors, rules configuration, RNG.
//!
//! Everything else in the crate builds on these. None of them know about
//! cards, boards or phases except the error type, which names the phase
//! and event of a rejected transition.

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;

pub use config::GameRules;
pub use error::{EngineError, EngineResult, ErrorKind};
pub use ids::{ConnectionId, SessionId, UserId};
pub use rng::{GameRng, GameRngState};
