//! Card ability effects.
//!
//! - `Effect`: declarative effect kinds an ability is made of
//! - `EffectContext`: who activated the ability and what they chose
//! - `AbilityEffectInterpreter`: applies an effect list to a session
//!
//! Abilities are plain data. Nothing here is scripted; adding a card never
//! needs new interpreter code unless it needs a new effect kind.

mod effect;
mod interpreter;

pub use effect::{CardMove, Effect, EffectContext, EffectTarget, IndexRef, Pile, SlotRef, SlotRefs};
pub use interpreter::{AbilityEffectInterpreter, EffectReport};
