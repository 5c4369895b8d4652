//! Effect definitions.
//!
//! Effects are the atomic building blocks of card abilities. An ability is
//! an ordered list of them; the interpreter applies the list in order
//! against the acting player's team or, for damage only, the enemy team.
//!
//! ## Slot references
//!
//! Effects never hold a concrete slot unless the card always acts on the
//! same place. Instead they name a [`SlotRef`]:
//!
//! - `Fixed(slot)`: always that slot
//! - `Chosen(i)`: the i-th slot the client supplied with the activation
//! - `Source`: the slot of the card whose ability is running
//!
//! Pile positions (hand or discard index) are resolved the same way
//! through [`IndexRef`].

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use crate::board::SlotId;
use crate::core::UserId;

/// Which team an effect applies to, relative to the acting player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectTarget {
    Own,
    Enemy,
}

/// Reference to a battlefield slot, resolved at activation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotRef {
    Fixed(SlotId),
    Chosen(u8),
    Source,
}

/// Reference to a position in a pile, resolved at activation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexRef {
    Fixed(usize),
    Chosen(u8),
}

/// Player pile a card can be moved from or to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pile {
    Hand,
    Discard,
}

/// One card movement inside a `MoveCards` effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardMove {
    /// From the acting player's pile onto the battlefield.
    ToField {
        from: Pile,
        index: IndexRef,
        slot: SlotRef,
    },
    /// From the battlefield into the acting player's pile.
    FromField { slot: SlotRef, to: Pile },
}

/// Slot list of an effect. Almost always one or two entries.
pub type SlotRefs = SmallVec<[SlotRef; 2]>;

/// An atomic ability effect.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// Add gold to the acting team, clamped to its cap.
    CollectGold { amount: u32 },

    /// Damage the cards in `slots`. Defeated cards leave the field.
    DealDamage {
        target: EffectTarget,
        slots: SlotRefs,
        amount: u32,
    },

    /// Recognized but has no effect yet.
    ReduceDamage {
        target: EffectTarget,
        slots: SlotRefs,
        amount: u32,
    },

    /// Move one or more cards between the field and the acting player's piles.
    MoveCards {
        target: EffectTarget,
        moves: Vec<CardMove>,
    },

    /// Swap the cards in exactly two slots.
    SwapFieldPositions {
        target: EffectTarget,
        slots: SlotRefs,
    },

    /// Acting player draws `count` cards.
    DrawCards { count: usize },

    AddShield {
        target: EffectTarget,
        slots: SlotRefs,
        amount: u32,
    },

    AddBoost {
        target: EffectTarget,
        slots: SlotRefs,
        amount: u32,
    },

    RemoveAllDamage {
        target: EffectTarget,
        slots: SlotRefs,
    },

    /// Inert.
    DontRemoveShield,

    /// Inert.
    DontRemoveBoost,
}

impl Effect {
    /// Deal `amount` damage to one enemy slot.
    #[must_use]
    pub fn damage_enemy(slot: SlotRef, amount: u32) -> Self {
        Effect::DealDamage {
            target: EffectTarget::Enemy,
            slots: smallvec![slot],
            amount,
        }
    }

    /// Add `amount` shields to one own slot.
    #[must_use]
    pub fn shield(slot: SlotRef, amount: u32) -> Self {
        Effect::AddShield {
            target: EffectTarget::Own,
            slots: smallvec![slot],
            amount,
        }
    }

    /// Add `amount` boosts to one own slot.
    #[must_use]
    pub fn boost(slot: SlotRef, amount: u32) -> Self {
        Effect::AddBoost {
            target: EffectTarget::Own,
            slots: smallvec![slot],
            amount,
        }
    }

    /// Remove all damage from one own slot.
    #[must_use]
    pub fn heal(slot: SlotRef) -> Self {
        Effect::RemoveAllDamage {
            target: EffectTarget::Own,
            slots: smallvec![slot],
        }
    }

    /// Team the effect declares, if it declares one.
    #[must_use]
    pub fn target(&self) -> Option<EffectTarget> {
        match self {
            Effect::DealDamage { target, .. }
            | Effect::ReduceDamage { target, .. }
            | Effect::MoveCards { target, .. }
            | Effect::SwapFieldPositions { target, .. }
            | Effect::AddShield { target, .. }
            | Effect::AddBoost { target, .. }
            | Effect::RemoveAllDamage { target, .. } => Some(*target),
            Effect::CollectGold { .. }
            | Effect::DrawCards { .. }
            | Effect::DontRemoveShield
            | Effect::DontRemoveBoost => None,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::CollectGold { .. } => "collect_gold",
            Effect::DealDamage { .. } => "deal_damage",
            Effect::ReduceDamage { .. } => "reduce_damage",
            Effect::MoveCards { .. } => "move_cards",
            Effect::SwapFieldPositions { .. } => "swap_field_positions",
            Effect::DrawCards { .. } => "draw_cards",
            Effect::AddShield { .. } => "add_shield",
            Effect::AddBoost { .. } => "add_boost",
            Effect::RemoveAllDamage { .. } => "remove_all_damage",
            Effect::DontRemoveShield => "dont_remove_shield",
            Effect::DontRemoveBoost => "dont_remove_boost",
        }
    }
}

/// Activation data an ability is run with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectContext {
    pub acting_player: UserId,
    /// Slot of the activating card, if it is on the field.
    pub source_slot: Option<SlotId>,
    /// Slots chosen by the client, addressed by `SlotRef::Chosen`.
    pub chosen_slots: Vec<SlotId>,
    /// Pile indices chosen by the client, addressed by `IndexRef::Chosen`.
    pub chosen_indices: Vec<usize>,
}

impl EffectContext {
    #[must_use]
    pub fn new(acting_player: UserId) -> Self {
        Self {
            acting_player,
            source_slot: None,
            chosen_slots: Vec::new(),
            chosen_indices: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, slot: SlotId) -> Self {
        self.source_slot = Some(slot);
        self
    }

    #[must_use]
    pub fn with_chosen_slots(mut self, slots: impl IntoIterator<Item = SlotId>) -> Self {
        self.chosen_slots = slots.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_chosen_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.chosen_indices = indices.into_iter().collect();
        self
    }
}
