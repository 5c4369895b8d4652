//! Battlefield model: slots, fixed adjacency and card placement.
//!
//! ## Key Types
//!
//! - `SlotId`: 1-based space number
//! - `BoardLayout`: six-slot (one player) or twelve-slot (two players) shape
//! - `Direction`: the eight neighbor directions
//! - `Battlefield`: the slots of one team

mod battlefield;
mod topology;

pub use battlefield::{Battlefield, BattlefieldSlot, SlotId};
pub use topology::{BoardLayout, Direction};
