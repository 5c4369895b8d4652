//! Cards: elements, sages, card values, decklists and shop stock.
//!
//! ## Key Types
//!
//! - `Card`: a card value with optional combat stats and ability
//! - `CardId`: identifier of a card design
//! - `Element` / `Sage`: the four elements and their sages
//! - `Decklist`: the cards a player receives for a sage choice

pub mod card;
pub mod catalog;
pub mod element;

pub use card::{Ability, Card, CardId, CardRole, CombatStats, RowSet};
pub use catalog::{creature_shop_stock, item_shop_stock, Decklist};
pub use element::{Element, Sage};
