//! Live match state.
//!
//! [`ActiveGameSession`] wraps a started [`GameSession`] with the turn
//! fields: which team acts, action points, the per-turn usage of
//! day-break cards and sage skills, and the winner.
//!
//! ## Turn rules
//!
//! - Only players of the active team may act (`NotYourTurn` otherwise).
//! - Phase-2 actions cost `action_cost` action points each.
//! - A day-break card fires at most once per turn, a sage skill at most
//!   once per player per turn. The day-break mark sits on the card, so it
//!   follows the card when abilities move it around the field.
//! - `end_turn` is the only place the active team, action points and the
//!   per-turn usage marks change.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::session::GameSession;
use super::shop::ShopKind;
use super::team::TeamNumber;
use crate::board::SlotId;
use crate::cards::{Card, CardId};
use crate::core::{EngineError, EngineResult, UserId};
use crate::effects::{AbilityEffectInterpreter, EffectContext, EffectReport};
use crate::phases::GamePhase;

/// Position in the team order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnSlot {
    First,
    Second,
}

impl TurnSlot {
    #[must_use]
    pub const fn toggle(self) -> TurnSlot {
        match self {
            TurnSlot::First => TurnSlot::Second,
            TurnSlot::Second => TurnSlot::First,
        }
    }

    const fn index(self) -> usize {
        match self {
            TurnSlot::First => 0,
            TurnSlot::Second => 1,
        }
    }
}

/// Result of an attack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub damage: u32,
    /// A shield took the hit.
    pub absorbed: bool,
    pub defeated: Option<CardId>,
}

/// A started match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveGameSession {
    game: GameSession,
    pub active_team: TurnSlot,
    pub current_phase: GamePhase,
    pub action_points: u32,
    pub max_action_points: u32,
    pub turn_number: u32,
    used_sage_skills: im::HashSet<UserId>,
    pub winner: Option<TeamNumber>,
    /// Team of a player who left mid-match.
    pub forfeited_by: Option<TeamNumber>,
}

impl ActiveGameSession {
    /// Promote a prepared session. The first team in the team order acts first.
    #[must_use]
    pub fn promote(mut game: GameSession) -> Self {
        game.is_started = true;
        let max_action_points = game.rules().max_action_points(game.num_players_total);
        info!(session_id = %game.id, max_action_points, "match started");
        Self {
            game,
            active_team: TurnSlot::First,
            current_phase: GamePhase::Phase1,
            action_points: max_action_points,
            max_action_points,
            turn_number: 1,
            used_sage_skills: im::HashSet::new(),
            winner: None,
            forfeited_by: None,
        }
    }

    #[must_use]
    pub fn game(&self) -> &GameSession {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut GameSession {
        &mut self.game
    }

    #[must_use]
    pub fn active_team_number(&self) -> TeamNumber {
        self.game.team_order()[self.active_team.index()]
    }

    #[must_use]
    pub fn enemy_team_number(&self) -> TeamNumber {
        self.active_team_number().opposite()
    }

    /// Whether the card now in `slot` of the active team already used its
    /// day-break this turn.
    #[must_use]
    pub fn day_break_used(&self, slot: SlotId) -> bool {
        self.game
            .team(self.active_team_number())
            .battlefield
            .day_break_spent(slot)
            .unwrap_or(false)
    }

    #[must_use]
    pub fn sage_skill_used(&self, user: &UserId) -> bool {
        self.used_sage_skills.contains(user)
    }

    /// The user's team, which must be the active one.
    pub fn ensure_turn(&self, user: &UserId) -> EngineResult<TeamNumber> {
        let team = self.game.require_team_of(user)?;
        if team != self.active_team_number() {
            return Err(EngineError::NotYourTurn {
                user: user.to_string(),
            });
        }
        Ok(team)
    }

    /// Close one of the play phases. Only the active team may move its
    /// turn forward.
    pub fn end_phase(&self, user: &UserId) -> EngineResult<TeamNumber> {
        self.ensure_turn(user)
    }

    fn ensure_action_point(&self) -> EngineResult<()> {
        if self.action_points < self.game.rules().action_cost {
            return Err(EngineError::NoActionPoints);
        }
        Ok(())
    }

    fn spend_action_point(&mut self) {
        self.action_points = self.action_points.saturating_sub(self.game.rules().action_cost);
    }

    // === Warrior selection ===

    pub fn choose_warriors(&mut self, user: &UserId, chosen: [CardId; 2]) -> EngineResult<()> {
        self.game.choose_warriors(user, chosen)
    }

    pub fn swap_warriors(&mut self, user: &UserId) -> EngineResult<()> {
        self.game.swap_warriors(user)
    }

    pub fn finish_player_setup(&mut self, user: &UserId) -> EngineResult<()> {
        self.game.finish_player_setup(user)
    }

    pub fn all_players_setup_complete(&mut self) -> EngineResult<()> {
        self.game.all_players_setup_complete()
    }

    // === Phase 1 ===

    /// Run the day-break ability of the card in `slot`.
    #[instrument(skip(self, chosen_slots, chosen_indices), fields(session_id = %self.game.id))]
    pub fn activate_day_break(
        &mut self,
        user: &UserId,
        slot: SlotId,
        chosen_slots: Vec<SlotId>,
        chosen_indices: Vec<usize>,
    ) -> EngineResult<EffectReport> {
        let team = self.ensure_turn(user)?;
        let effects = self.game.team(team).battlefield.activate_day_break(slot)?;

        // Mark before running: effects may move the card to another slot.
        let mut staged = self.game.clone();
        staged.team_mut(team).battlefield.mark_day_break_spent(slot)?;
        let context = EffectContext::new(user.clone())
            .with_source(slot)
            .with_chosen_slots(chosen_slots)
            .with_chosen_indices(chosen_indices);
        let report = AbilityEffectInterpreter::process(&mut staged, &effects, &context)?;
        self.game = staged;
        Ok(report)
    }

    // === Phase 2 ===

    pub fn draw_card(&mut self, user: &UserId) -> EngineResult<CardId> {
        self.ensure_turn(user)?;
        self.ensure_action_point()?;
        let id = self.game.player_mut(user)?.draw_card()?;
        self.spend_action_point();
        Ok(id)
    }

    pub fn swap_cards(&mut self, user: &UserId, a: SlotId, b: SlotId) -> EngineResult<()> {
        let team = self.ensure_turn(user)?;
        self.ensure_action_point()?;
        self.game.team_mut(team).battlefield.swap_cards(a, b)?;
        self.spend_action_point();
        Ok(())
    }

    /// Check that `card` may be put on `slot` of `team` by `user`.
    fn check_summon(&self, user: &UserId, team: TeamNumber, card: &Card, slot: SlotId) -> EngineResult<()> {
        if !card.can_fight() {
            return Err(EngineError::validation(format!("{} cannot be summoned", card.name)));
        }
        let battlefield = &self.game.team(team).battlefield;
        let row = battlefield.row_of(slot)?;
        if !card.allowed_in_row(row) {
            return Err(EngineError::validation(format!(
                "{} cannot be summoned to row {}",
                card.name, row
            )));
        }
        let level = self.game.player(user)?.level;
        if !card.meets_level(level) {
            return Err(EngineError::validation(format!(
                "{} needs level {}, player is level {}",
                card.name,
                card.level_requirement.unwrap_or_default(),
                level
            )));
        }
        if battlefield.get_card(slot)?.is_some() {
            return Err(EngineError::conflict(format!("{} is occupied", slot)));
        }
        Ok(())
    }

    /// Summon a card from the hand onto the field.
    pub fn summon_card(&mut self, user: &UserId, hand_index: usize, slot: SlotId) -> EngineResult<()> {
        let team = self.ensure_turn(user)?;
        self.ensure_action_point()?;
        let card = self
            .game
            .player(user)?
            .hand_card(hand_index)
            .cloned()
            .ok_or_else(|| EngineError::validation(format!("no card at hand index {}", hand_index)))?;
        self.check_summon(user, team, &card, slot)?;

        let card = self.game.player_mut(user)?.remove_card_from_hand(hand_index)?;
        self.game.team_mut(team).battlefield.add_card(card, slot)?;
        self.spend_action_point();
        Ok(())
    }

    /// Attack an enemy card. Damage is attack plus boosts; boosts are
    /// consumed. A shielded target loses one shield instead of taking
    /// damage.
    #[instrument(skip(self), fields(session_id = %self.game.id))]
    pub fn attack(&mut self, user: &UserId, attacker: SlotId, target: SlotId) -> EngineResult<AttackOutcome> {
        let team = self.ensure_turn(user)?;
        self.ensure_action_point()?;
        let enemy = team.opposite();

        let strike = self
            .game
            .team(team)
            .battlefield
            .get_card(attacker)?
            .and_then(|card| card.combat.as_ref())
            .map(|stats| stats.strike())
            .ok_or_else(|| EngineError::validation(format!("no fighting card at {}", attacker)))?;
        let remaining = self
            .game
            .team(enemy)
            .battlefield
            .get_card(target)?
            .ok_or_else(|| EngineError::validation(format!("no enemy card at {}", target)))?
            .combat
            .as_ref()
            .map_or(0, |stats| stats.remaining_health());
        let damage = strike.min(remaining);

        self.game.team_mut(team).battlefield.consume_boosts(attacker)?;
        let enemy_team = self.game.team_mut(enemy);
        let outcome = if enemy_team.battlefield.consume_shield(target)? {
            AttackOutcome {
                damage: 0,
                absorbed: true,
                defeated: None,
            }
        } else if enemy_team.battlefield.damage_card_at_position(target, strike)? {
            let card = enemy_team.battlefield.remove_card(target)?;
            let id = card.id;
            enemy_team.record_removed(card);
            AttackOutcome {
                damage,
                absorbed: false,
                defeated: Some(id),
            }
        } else {
            AttackOutcome {
                damage,
                absorbed: false,
                defeated: None,
            }
        };
        self.spend_action_point();
        info!(user = %user, %attacker, %target, damage = outcome.damage, absorbed = outcome.absorbed, "attack");
        Ok(outcome)
    }

    /// Play an item from the hand. The item goes to the discard pile.
    pub fn use_utility(
        &mut self,
        user: &UserId,
        hand_index: usize,
        chosen_slots: Vec<SlotId>,
        chosen_indices: Vec<usize>,
    ) -> EngineResult<EffectReport> {
        self.ensure_turn(user)?;
        self.ensure_action_point()?;

        let mut staged = self.game.clone();
        let item = staged.player_mut(user)?.remove_card_from_hand(hand_index)?;
        if item.can_fight() || item.ability.is_none() {
            return Err(EngineError::validation(format!("{} is not a utility card", item.name)));
        }
        let context = EffectContext::new(user.clone())
            .with_chosen_slots(chosen_slots)
            .with_chosen_indices(chosen_indices);
        let report = AbilityEffectInterpreter::process(&mut staged, item.effects(), &context)?;
        staged.player_mut(user)?.add_card_to_discard(item);

        self.game = staged;
        self.spend_action_point();
        Ok(report)
    }

    /// Run the player's sage skill from the sage's slot.
    pub fn sage_skill(
        &mut self,
        user: &UserId,
        chosen_slots: Vec<SlotId>,
        chosen_indices: Vec<usize>,
    ) -> EngineResult<EffectReport> {
        let team = self.ensure_turn(user)?;
        self.ensure_action_point()?;
        if self.used_sage_skills.contains(user) {
            return Err(EngineError::conflict(format!("{} already used the sage skill this turn", user)));
        }
        let sage_card = self
            .game
            .player(user)?
            .decklist
            .as_ref()
            .map(|d| d.sage_card.clone())
            .ok_or_else(|| EngineError::not_found(format!("decklist of {}", user)))?;
        let source = self
            .game
            .team(team)
            .battlefield
            .find_slot(|card| card.id == sage_card.id)
            .ok_or_else(|| EngineError::validation(format!("{} is no longer on the field", sage_card.name)))?;

        let context = EffectContext::new(user.clone())
            .with_source(source)
            .with_chosen_slots(chosen_slots)
            .with_chosen_indices(chosen_indices);
        let report = AbilityEffectInterpreter::process(&mut self.game, sage_card.effects(), &context)?;
        self.used_sage_skills.insert(user.clone());
        self.spend_action_point();
        Ok(report)
    }

    /// Declare the winner.
    ///
    /// After a forfeit the remaining team wins. Otherwise the acting team
    /// wins once the enemy has no sage left on the field.
    #[instrument(skip(self), fields(session_id = %self.game.id))]
    pub fn win_game(&mut self, user: &UserId) -> EngineResult<TeamNumber> {
        let winner = match self.forfeited_by {
            Some(loser) => loser.opposite(),
            None => {
                let team = self.ensure_turn(user)?;
                let sages_left = self.game.team(team.opposite()).sage_count_on_field();
                if sages_left > 0 {
                    return Err(EngineError::validation(format!(
                        "enemy still has {} sage(s) on the field",
                        sages_left
                    )));
                }
                team
            }
        };
        self.winner = Some(winner);
        info!(%winner, "game won");
        Ok(winner)
    }

    /// A player left mid-match. Their team forfeits.
    pub fn forfeit(&mut self, user: &UserId) -> EngineResult<TeamNumber> {
        let team = self.game.require_team_of(user)?;
        self.game.remove_player(user)?;
        self.forfeited_by = Some(team);
        info!(user = %user, %team, "team forfeits");
        Ok(team)
    }

    // === Phase 3 ===

    pub fn buy_card(&mut self, user: &UserId, kind: ShopKind, index: usize) -> EngineResult<Card> {
        self.ensure_turn(user)?;
        self.game.buy_card(user, kind, index)
    }

    /// Buy a creature straight onto the field.
    pub fn summon_bought_card(&mut self, user: &UserId, index: usize, slot: SlotId) -> EngineResult<Card> {
        let team = self.ensure_turn(user)?;
        let card = self
            .game
            .shop(ShopKind::Creature)
            .offered_card(index)
            .cloned()
            .ok_or_else(|| EngineError::validation(format!("creature shop has no card {}", index)))?;
        let available = self.game.team(team).gold();
        if available < card.price {
            return Err(EngineError::NotEnoughGold {
                needed: card.price,
                available,
            });
        }
        self.check_summon(user, team, &card, slot)?;

        let card = self.game.shop_mut(ShopKind::Creature).take_offered(index)?;
        self.game.team_mut(team).remove_gold(card.price);
        self.game.team_mut(team).battlefield.add_card(card.clone(), slot)?;
        self.game.shop_mut(ShopKind::Creature).restock();
        Ok(card)
    }

    /// Sell a card from the hand for half its price.
    pub fn sell_card(&mut self, user: &UserId, hand_index: usize) -> EngineResult<u32> {
        let team = self.ensure_turn(user)?;
        let card = self.game.player_mut(user)?.remove_card_from_hand(hand_index)?;
        let refund = card.price / 2;
        let team = self.game.team_mut(team);
        team.add_gold(refund);
        team.record_removed(card);
        Ok(refund)
    }

    pub fn refresh_shop(&mut self, user: &UserId, kind: ShopKind) -> EngineResult<()> {
        let team = self.ensure_turn(user)?;
        let cost = self.game.rules().refresh_cost;
        let available = self.game.team(team).gold();
        if available < cost {
            return Err(EngineError::NotEnoughGold {
                needed: cost,
                available,
            });
        }
        self.game.team_mut(team).remove_gold(cost);
        self.game.shop_mut(kind).refresh();
        Ok(())
    }

    // === Phase 4 ===

    pub fn discard_card(&mut self, user: &UserId, hand_index: usize) -> EngineResult<()> {
        self.ensure_turn(user)?;
        let player = self.game.player_mut(user)?;
        let card = player.remove_card_from_hand(hand_index)?;
        player.add_card_to_discard(card);
        Ok(())
    }

    // === Drawing new hand ===

    /// Every player of the active team draws up to the hand size.
    pub fn draw_new_hand(&mut self, user: &UserId) -> EngineResult<usize> {
        let team = self.ensure_turn(user)?;
        let hand_size = self.game.rules().hand_size;
        let members: Vec<UserId> = self.game.team(team).roster.iter().cloned().collect();
        let mut drawn = 0;
        for member in &members {
            drawn += self.game.player_mut(member)?.draw_new_hand(hand_size);
        }
        Ok(drawn)
    }

    /// Close the turn: level up the acting team, hand over to the other
    /// team, reset action points and per-turn usage.
    #[instrument(skip(self), fields(session_id = %self.game.id))]
    pub fn end_turn(&mut self, user: &UserId) -> EngineResult<()> {
        let team = self.ensure_turn(user)?;
        let max_level = self.game.rules().max_level;
        let members: Vec<UserId> = self.game.team(team).roster.iter().cloned().collect();
        for member in &members {
            self.game.player_mut(member)?.level_up(max_level);
        }

        self.active_team = self.active_team.toggle();
        self.action_points = self.max_action_points;
        self.game.reset_day_breaks();
        self.used_sage_skills.clear();
        self.turn_number += 1;
        info!(turn = self.turn_number, active = %self.active_team_number(), "turn ended");
        Ok(())
    }
}
