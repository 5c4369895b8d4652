//! Sessions, teams, players and shops.
//!
//! ## Key Types
//!
//! - `GameSession`: a session from the first join until it is started
//! - `ActiveGameSession`: a started match with turn state
//! - `Session`: either of the two, as stored by the registry
//! - `Team` / `Player`: resources and piles
//! - `Shop`: backing deck plus offered cards
//!
//! Promotion from `GameSession` to `ActiveGameSession` is one-way and
//! happens exactly once, in [`Session::start_game`].

pub mod active;
pub mod player;
pub mod session;
pub mod shop;
pub mod team;

pub use active::{ActiveGameSession, AttackOutcome, TurnSlot};
pub use player::Player;
pub use session::{GameSession, Session, SessionSettings};
pub use shop::{Shop, ShopKind};
pub use team::{Team, TeamNumber};
