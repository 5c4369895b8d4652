//! # sage-arena
//!
//! Authoritative match engine for a team-vs-team elemental card game.
//!
//! ## Design Principles
//!
//! 1. **Phase-Gated**: Every client request is an event. The phase machine
//!    decides whether it is legal before any game data is touched.
//!
//! 2. **All-or-Nothing**: Mutations run on a clone of the session. The clone
//!    replaces the stored session only after it has been persisted.
//!
//! 3. **Data-Driven Abilities**: Card abilities are lists of declarative
//!    effects run by one interpreter. Rules numbers live in `GameRules`.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: O(1) cloning via `im-rs` makes the
//!   staged commit cheap.
//!
//! - **Per-Session Locking**: Commands for one session are serialized,
//!   different sessions run in parallel.
//!
//! - **Ports**: Storage, delivery and identity are traits the host plugs in.
//!
//! ## Modules
//!
//! - `core`: IDs, errors, rules configuration, RNG
//! - `phases`: phase and event enums, transition table
//! - `cards`: card values, elements, sages, decklists and shop stock
//! - `board`: battlefield slots and adjacency
//! - `effects`: ability effects and their interpreter
//! - `game`: sessions, teams, players, shops, live match state
//! - `registry`: session store, commands, ports

pub mod board;
pub mod cards;
pub mod core;
pub mod effects;
pub mod game;
pub mod phases;
pub mod registry;

// Re-export commonly used types
pub use crate::core::{
    ConnectionId, EngineError, EngineResult, ErrorKind, GameRng, GameRngState, GameRules,
    SessionId, UserId,
};

pub use crate::phases::{GameEvent, GamePhase, PhaseState, PhaseStateMachine};

pub use crate::cards::{
    Ability, Card, CardId, CardRole, CombatStats, Decklist, Element, RowSet, Sage,
};

pub use crate::board::{Battlefield, BattlefieldSlot, BoardLayout, Direction, SlotId};

pub use crate::effects::{
    AbilityEffectInterpreter, CardMove, Effect, EffectContext, EffectReport, EffectTarget,
    IndexRef, Pile, SlotRef,
};

pub use crate::game::{
    ActiveGameSession, AttackOutcome, GameSession, Player, Session, SessionSettings, Shop,
    ShopKind, Team, TeamNumber, TurnSlot,
};

pub use crate::registry::{
    Audience, ClientCommand, Identity, Outbound, OutboundMessage, Persistence, SessionRegistry,
    Transport,
};
