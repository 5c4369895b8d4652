//! Ability effect interpreter.
//!
//! Applies an effect list to a [`GameSession`] on behalf of one player.
//! The list runs against a clone of the session and the clone replaces
//! the session only after every effect succeeded, so a failing effect
//! halfway down the list leaves nothing behind.
//!
//! Only `DealDamage` may target the enemy team. Any other effect that
//! declares `Enemy` is rejected.

use serde::Serialize;
use tracing::{debug, instrument};

use super::effect::{CardMove, Effect, EffectContext, EffectTarget, IndexRef, Pile, SlotRef};
use crate::board::{Battlefield, SlotId};
use crate::cards::{Card, CardId};
use crate::core::{EngineError, EngineResult};
use crate::game::{GameSession, Player, TeamNumber};

/// What an effect list did.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EffectReport {
    pub applied: usize,
    pub gold_collected: u32,
    pub damage_dealt: u32,
    pub cards_drawn: usize,
    pub cards_moved: usize,
    /// Cards that left the field defeated, with their owning team.
    pub defeated: Vec<(TeamNumber, CardId)>,
}

/// Stateless interpreter for effect lists.
pub struct AbilityEffectInterpreter;

impl AbilityEffectInterpreter {
    /// Apply `effects` in order. Commits to `session` only if all succeed.
    #[instrument(skip_all, fields(session_id = %session.id, player = %context.acting_player, effects = effects.len()))]
    pub fn process(
        session: &mut GameSession,
        effects: &[Effect],
        context: &EffectContext,
    ) -> EngineResult<EffectReport> {
        let own = session.require_team_of(&context.acting_player)?;
        let mut staged = session.clone();
        let mut report = EffectReport::default();

        for effect in effects {
            Self::apply(&mut staged, effect, context, own, &mut report)?;
            report.applied += 1;
        }

        *session = staged;
        debug!(?report, "effects committed");
        Ok(report)
    }

    fn apply(
        session: &mut GameSession,
        effect: &Effect,
        ctx: &EffectContext,
        own: TeamNumber,
        report: &mut EffectReport,
    ) -> EngineResult<()> {
        let team = match effect.target() {
            Some(EffectTarget::Enemy) if !matches!(effect, Effect::DealDamage { .. }) => {
                return Err(EngineError::validation(format!(
                    "{} cannot target the enemy team",
                    effect.kind()
                )));
            }
            Some(EffectTarget::Enemy) => own.opposite(),
            _ => own,
        };

        match effect {
            Effect::CollectGold { amount } => {
                let before = session.team(team).gold();
                session.team_mut(team).add_gold(*amount);
                report.gold_collected += session.team(team).gold() - before;
            }

            Effect::DealDamage { slots, amount, .. } => {
                for slot_ref in slots {
                    let slot = resolve_slot(*slot_ref, ctx)?;
                    let target = session.team_mut(team);
                    let remaining = target
                        .battlefield
                        .get_card(slot)?
                        .and_then(|card| card.combat.as_ref())
                        .map_or(0, |stats| stats.remaining_health());
                    let defeated = target.battlefield.damage_card_at_position(slot, *amount)?;
                    report.damage_dealt += (*amount).min(remaining);
                    if defeated {
                        let card = target.battlefield.remove_card(slot)?;
                        report.defeated.push((team, card.id));
                        debug!(card = %card.name, %slot, "card defeated");
                        target.record_removed(card);
                    }
                }
            }

            Effect::ReduceDamage { .. } => {
                debug!("reduce_damage has no effect");
            }

            Effect::MoveCards { moves, .. } => {
                let (player, target) = session.player_and_team_mut(&ctx.acting_player, team)?;
                report.cards_moved += move_cards(player, &mut target.battlefield, moves, ctx)?;
            }

            Effect::SwapFieldPositions { slots, .. } => {
                if slots.len() != 2 {
                    return Err(EngineError::validation(format!(
                        "swap needs exactly 2 slots, got {}",
                        slots.len()
                    )));
                }
                let a = resolve_slot(slots[0], ctx)?;
                let b = resolve_slot(slots[1], ctx)?;
                session.team_mut(team).battlefield.swap_cards(a, b)?;
            }

            Effect::DrawCards { count } => {
                let player = session.player_mut(&ctx.acting_player)?;
                for _ in 0..*count {
                    player.draw_card()?;
                }
                report.cards_drawn += count;
            }

            Effect::AddShield { slots, amount, .. } => {
                for slot_ref in slots {
                    let slot = resolve_slot(*slot_ref, ctx)?;
                    session
                        .team_mut(team)
                        .battlefield
                        .add_shield_to_card_at_position(slot, *amount)?;
                }
            }

            Effect::AddBoost { slots, amount, .. } => {
                for slot_ref in slots {
                    let slot = resolve_slot(*slot_ref, ctx)?;
                    session
                        .team_mut(team)
                        .battlefield
                        .add_boost_to_card_at_position(slot, *amount)?;
                }
            }

            Effect::RemoveAllDamage { slots, .. } => {
                for slot_ref in slots {
                    let slot = resolve_slot(*slot_ref, ctx)?;
                    session.team_mut(team).battlefield.clear_damage(slot)?;
                }
            }

            Effect::DontRemoveShield | Effect::DontRemoveBoost => {
                debug!(effect = effect.kind(), "inert effect");
            }
        }
        Ok(())
    }
}

fn resolve_slot(slot: SlotRef, ctx: &EffectContext) -> EngineResult<SlotId> {
    match slot {
        SlotRef::Fixed(slot) => Ok(slot),
        SlotRef::Chosen(i) => ctx
            .chosen_slots
            .get(usize::from(i))
            .copied()
            .ok_or_else(|| EngineError::validation(format!("no chosen slot {}", i))),
        SlotRef::Source => ctx
            .source_slot
            .ok_or_else(|| EngineError::validation("effect needs a source slot")),
    }
}

fn resolve_index(index: IndexRef, ctx: &EffectContext) -> EngineResult<usize> {
    match index {
        IndexRef::Fixed(i) => Ok(i),
        IndexRef::Chosen(i) => ctx
            .chosen_indices
            .get(usize::from(i))
            .copied()
            .ok_or_else(|| EngineError::validation(format!("no chosen index {}", i))),
    }
}

fn pile_mut(player: &mut Player, pile: Pile) -> &mut im::Vector<Card> {
    match pile {
        Pile::Hand => &mut player.hand,
        Pile::Discard => &mut player.discard_pile,
    }
}

/// Take every card out first, then put them all in place.
///
/// Pile indices refer to the piles as they were before any card moved.
fn move_cards(
    player: &mut Player,
    battlefield: &mut Battlefield,
    moves: &[CardMove],
    ctx: &EffectContext,
) -> EngineResult<usize> {
    let mut pile_takes: Vec<(usize, Pile, usize)> = Vec::new();
    let mut destinations: Vec<Option<SlotId>> = Vec::with_capacity(moves.len());
    for (n, mv) in moves.iter().enumerate() {
        match *mv {
            CardMove::ToField { from, index, slot } => {
                let index = resolve_index(index, ctx)?;
                if index >= pile_mut(player, from).len() {
                    return Err(EngineError::validation(format!(
                        "index {} is out of range for {:?}",
                        index, from
                    )));
                }
                if pile_takes.iter().any(|&(_, p, i)| p == from && i == index) {
                    return Err(EngineError::validation(format!("index {} moved twice", index)));
                }
                pile_takes.push((n, from, index));
                destinations.push(Some(resolve_slot(slot, ctx)?));
            }
            CardMove::FromField { .. } => destinations.push(None),
        }
    }

    let mut taken: Vec<Option<Card>> = vec![None; moves.len()];
    pile_takes.sort_by(|a, b| b.2.cmp(&a.2));
    for (n, pile, index) in pile_takes {
        taken[n] = Some(pile_mut(player, pile).remove(index));
    }
    for (n, mv) in moves.iter().enumerate() {
        if let CardMove::FromField { slot, .. } = *mv {
            taken[n] = Some(battlefield.remove_card(resolve_slot(slot, ctx)?)?);
        }
    }

    for (n, mv) in moves.iter().enumerate() {
        let card = taken[n]
            .take()
            .ok_or_else(|| EngineError::validation("card move resolved nothing"))?;
        match (*mv, destinations[n]) {
            (CardMove::ToField { .. }, Some(slot)) => battlefield.add_card(card, slot)?,
            (CardMove::FromField { to, .. }, _) => pile_mut(player, to).push_back(card),
            (CardMove::ToField { .. }, None) => {
                return Err(EngineError::validation("card move has no destination"));
            }
        }
    }
    Ok(moves.len())
}
