//! Session phase tracking.
//!
//! A session walks through setup phases (joining, sage selection, teams,
//! ready-up, warrior selection) and then cycles through the four play
//! phases plus the draw step until a team wins.
//!
//! ## Key Types
//!
//! - [`GamePhase`]: where the session is
//! - [`GameEvent`]: what a client asked to do
//! - [`PhaseStateMachine`]: the pure transition table between them

mod machine;

pub use machine::{transitions, GameEvent, GamePhase, PhaseState, PhaseStateMachine};
