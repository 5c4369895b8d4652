//! Inbound client commands.
//!
//! Clients send `{"event": "...", "payload": {...}}`. Payloads are parsed
//! into [`ClientCommand`] with unknown fields rejected, so nothing that
//! reaches a session operation is untyped.
//!
//! Each command maps to exactly one [`GameEvent`]. The phase machine
//! checks that event before [`ClientCommand::apply`] touches the session.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::outbound::{hand_of, session_summary, to_payload, Outbound};
use crate::board::SlotId;
use crate::cards::{CardId, Sage};
use crate::core::{ConnectionId, EngineError, EngineResult, UserId};
use crate::game::{Session, ShopKind, TeamNumber};
use crate::phases::GameEvent;

/// A validated client request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case", deny_unknown_fields)]
pub enum ClientCommand {
    JoinGame {
        connection_id: ConnectionId,
    },
    LeaveGame,
    AllPlayersJoined,
    SelectSage {
        sage: Sage,
    },
    AllSagesSelected,
    JoinTeam {
        team: u8,
    },
    ClearTeams,
    AllTeamsJoined,
    ToggleReady,
    StartGame,
    ChooseWarriors {
        warriors: [CardId; 2],
    },
    SwapWarriors,
    FinishSetup,
    AllPlayersSetupComplete,
    ActivateDayBreak {
        slot: SlotId,
        #[serde(default)]
        chosen_slots: Vec<SlotId>,
        #[serde(default)]
        chosen_indices: Vec<usize>,
    },
    EndPhase1,
    DrawCard,
    SwapCards {
        a: SlotId,
        b: SlotId,
    },
    SummonCard {
        hand_index: usize,
        slot: SlotId,
    },
    Attack {
        attacker: SlotId,
        target: SlotId,
    },
    UseUtility {
        hand_index: usize,
        #[serde(default)]
        chosen_slots: Vec<SlotId>,
        #[serde(default)]
        chosen_indices: Vec<usize>,
    },
    SageSkill {
        #[serde(default)]
        chosen_slots: Vec<SlotId>,
        #[serde(default)]
        chosen_indices: Vec<usize>,
    },
    EndPhase2,
    WinGame,
    BuyCard {
        shop: ShopKind,
        index: usize,
    },
    SummonBoughtCard {
        index: usize,
        slot: SlotId,
    },
    SellCard {
        hand_index: usize,
    },
    RefreshShop {
        shop: ShopKind,
    },
    EndPhase3,
    DiscardCard {
        hand_index: usize,
    },
    EndPhase4,
    DrawNewHand,
    EndTurn,
}

impl ClientCommand {
    /// Parse a JSON command. Malformed input is a validation error.
    pub fn parse(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json)
            .map_err(|err| EngineError::validation(format!("malformed command: {}", err)))
    }

    /// The phase event this command raises.
    #[must_use]
    pub fn event(&self) -> GameEvent {
        match self {
            ClientCommand::JoinGame { .. } => GameEvent::PlayerJoined,
            ClientCommand::LeaveGame => GameEvent::PlayerLeft,
            ClientCommand::AllPlayersJoined => GameEvent::AllPlayersJoined,
            ClientCommand::SelectSage { .. } => GameEvent::PlayerSelectedSage,
            ClientCommand::AllSagesSelected => GameEvent::AllSagesSelected,
            ClientCommand::JoinTeam { .. } => GameEvent::PlayerJoinedTeam,
            ClientCommand::ClearTeams => GameEvent::ClearTeams,
            ClientCommand::AllTeamsJoined => GameEvent::AllTeamsJoined,
            ClientCommand::ToggleReady => GameEvent::ToggleReadyStatus,
            ClientCommand::StartGame => GameEvent::StartGame,
            ClientCommand::ChooseWarriors { .. } => GameEvent::ChooseWarriors,
            ClientCommand::SwapWarriors => GameEvent::SwapWarriors,
            ClientCommand::FinishSetup => GameEvent::PlayerFinishedSetup,
            ClientCommand::AllPlayersSetupComplete => GameEvent::AllPlayersSetupComplete,
            ClientCommand::ActivateDayBreak { .. } => GameEvent::ActivateDayBreak,
            ClientCommand::EndPhase1 => GameEvent::EndPhase1,
            ClientCommand::DrawCard => GameEvent::DrawCard,
            ClientCommand::SwapCards { .. } => GameEvent::SwapCards,
            ClientCommand::SummonCard { .. } => GameEvent::SummonCard,
            ClientCommand::Attack { .. } => GameEvent::Attack,
            ClientCommand::UseUtility { .. } => GameEvent::UseUtility,
            ClientCommand::SageSkill { .. } => GameEvent::SageSkill,
            ClientCommand::EndPhase2 => GameEvent::EndPhase2,
            ClientCommand::WinGame => GameEvent::WinGame,
            ClientCommand::BuyCard { .. } => GameEvent::BuyCard,
            ClientCommand::SummonBoughtCard { .. } => GameEvent::SummonBoughtCard,
            ClientCommand::SellCard { .. } => GameEvent::SellCard,
            ClientCommand::RefreshShop { .. } => GameEvent::RefreshShop,
            ClientCommand::EndPhase3 => GameEvent::EndPhase3,
            ClientCommand::DiscardCard { .. } => GameEvent::DiscardCard,
            ClientCommand::EndPhase4 => GameEvent::EndPhase4,
            ClientCommand::DrawNewHand => GameEvent::DrawNewHand,
            ClientCommand::EndTurn => GameEvent::EndTurn,
        }
    }

    /// Run the session operation behind this command and describe who
    /// should be told about it.
    pub fn apply(self, session: &mut Session, user: &UserId) -> EngineResult<Vec<Outbound>> {
        let by = json!({ "user": user });
        let outbound = match self {
            ClientCommand::JoinGame { connection_id } => {
                let fresh = session.game_mut().add_player(user.clone(), connection_id)?;
                let event = if fresh { "player_joined" } else { "player_reconnected" };
                vec![
                    Outbound::room_except(user.clone(), event, by),
                    Outbound::player(user.clone(), "session_state", session_summary(session.game())),
                ]
            }

            ClientCommand::LeaveGame => match session {
                Session::Active(active) => {
                    let team = active.forfeit(user)?;
                    vec![Outbound::room(
                        "player_left",
                        json!({ "user": user, "forfeited_by": team.number() }),
                    )]
                }
                Session::Setup(game) => {
                    game.remove_player(user)?;
                    let host = game.host().map(|p| p.user_id.clone());
                    vec![Outbound::room("player_left", json!({ "user": user, "host": host }))]
                }
            },

            ClientCommand::AllPlayersJoined => {
                session.game().all_players_joined(user)?;
                vec![Outbound::room("all_players_joined", session_summary(session.game()))]
            }

            ClientCommand::SelectSage { sage } => {
                session.game_mut().select_sage(user, sage)?;
                vec![Outbound::room("sage_selected", json!({ "user": user, "sage": sage }))]
            }

            ClientCommand::AllSagesSelected => {
                session.game().all_sages_selected(user)?;
                vec![Outbound::room("all_sages_selected", session_summary(session.game()))]
            }

            ClientCommand::JoinTeam { team } => {
                let number = TeamNumber::from_number(team)?;
                session.game_mut().join_team(user, number)?;
                vec![Outbound::room("team_joined", json!({ "user": user, "team": team }))]
            }

            ClientCommand::ClearTeams => {
                session.game_mut().clear_teams(user)?;
                vec![Outbound::room("teams_cleared", by)]
            }

            ClientCommand::AllTeamsJoined => {
                session.game().all_teams_joined()?;
                vec![Outbound::room("all_teams_joined", session_summary(session.game()))]
            }

            ClientCommand::ToggleReady => {
                let ready = session.game_mut().toggle_ready(user)?;
                vec![Outbound::room("ready_toggled", json!({ "user": user, "is_ready": ready }))]
            }

            ClientCommand::StartGame => {
                session.start_game(user)?;
                let active = session.active()?;
                vec![Outbound::room(
                    "game_started",
                    json!({
                        "first_team": active.active_team_number().number(),
                        "max_action_points": active.max_action_points,
                    }),
                )]
            }

            ClientCommand::ChooseWarriors { warriors } => {
                let active = session.active_mut()?;
                active.choose_warriors(user, warriors)?;
                let team = active.game().require_team_of(user)?;
                vec![Outbound::team(team, "warriors_chosen", json!({ "user": user, "warriors": warriors }))]
            }

            ClientCommand::SwapWarriors => {
                let active = session.active_mut()?;
                active.swap_warriors(user)?;
                let team = active.game().require_team_of(user)?;
                vec![Outbound::team(team, "warriors_swapped", by)]
            }

            ClientCommand::FinishSetup => {
                session.active_mut()?.finish_player_setup(user)?;
                vec![Outbound::room("player_setup_finished", by)]
            }

            ClientCommand::AllPlayersSetupComplete => {
                let active = session.active_mut()?;
                active.all_players_setup_complete()?;
                let game = active.game();
                let mut outbound: Vec<Outbound> = game
                    .players()
                    .map(|p| Outbound::player(p.user_id.clone(), "hand", hand_of(game, &p.user_id)))
                    .collect();
                outbound.push(Outbound::room(
                    "setup_complete",
                    json!({ "active_team": active.active_team_number().number() }),
                ));
                outbound
            }

            ClientCommand::ActivateDayBreak {
                slot,
                chosen_slots,
                chosen_indices,
            } => {
                let report = session
                    .active_mut()?
                    .activate_day_break(user, slot, chosen_slots, chosen_indices)?;
                vec![Outbound::room(
                    "day_break_activated",
                    json!({ "user": user, "slot": slot, "report": to_payload(&report) }),
                )]
            }

            ClientCommand::EndPhase1 => {
                session.active()?.end_phase(user)?;
                vec![Outbound::room("phase_ended", json!({ "phase": 1, "user": user }))]
            }

            ClientCommand::DrawCard => {
                let active = session.active_mut()?;
                active.draw_card(user)?;
                vec![
                    Outbound::player(user.clone(), "hand", hand_of(active.game(), user)),
                    Outbound::room_except(user.clone(), "card_drawn", by),
                ]
            }

            ClientCommand::SwapCards { a, b } => {
                session.active_mut()?.swap_cards(user, a, b)?;
                vec![Outbound::room("cards_swapped", json!({ "user": user, "a": a, "b": b }))]
            }

            ClientCommand::SummonCard { hand_index, slot } => {
                session.active_mut()?.summon_card(user, hand_index, slot)?;
                vec![Outbound::room("card_summoned", json!({ "user": user, "slot": slot }))]
            }

            ClientCommand::Attack { attacker, target } => {
                let outcome = session.active_mut()?.attack(user, attacker, target)?;
                vec![Outbound::room(
                    "attacked",
                    json!({ "user": user, "attacker": attacker, "target": target, "outcome": to_payload(&outcome) }),
                )]
            }

            ClientCommand::UseUtility {
                hand_index,
                chosen_slots,
                chosen_indices,
            } => {
                let report = session
                    .active_mut()?
                    .use_utility(user, hand_index, chosen_slots, chosen_indices)?;
                vec![Outbound::room(
                    "utility_used",
                    json!({ "user": user, "report": to_payload(&report) }),
                )]
            }

            ClientCommand::SageSkill {
                chosen_slots,
                chosen_indices,
            } => {
                let report = session
                    .active_mut()?
                    .sage_skill(user, chosen_slots, chosen_indices)?;
                vec![Outbound::room(
                    "sage_skill_used",
                    json!({ "user": user, "report": to_payload(&report) }),
                )]
            }

            ClientCommand::EndPhase2 => {
                session.active()?.end_phase(user)?;
                vec![Outbound::room("phase_ended", json!({ "phase": 2, "user": user }))]
            }

            ClientCommand::WinGame => {
                let winner = session.active_mut()?.win_game(user)?;
                vec![Outbound::room("game_won", json!({ "winner": winner.number() }))]
            }

            ClientCommand::BuyCard { shop, index } => {
                let card = session.active_mut()?.buy_card(user, shop, index)?;
                vec![Outbound::room(
                    "card_bought",
                    json!({ "user": user, "shop": shop, "card": card.id }),
                )]
            }

            ClientCommand::SummonBoughtCard { index, slot } => {
                let card = session.active_mut()?.summon_bought_card(user, index, slot)?;
                vec![Outbound::room(
                    "bought_card_summoned",
                    json!({ "user": user, "card": card.id, "slot": slot }),
                )]
            }

            ClientCommand::SellCard { hand_index } => {
                let refund = session.active_mut()?.sell_card(user, hand_index)?;
                vec![Outbound::room("card_sold", json!({ "user": user, "refund": refund }))]
            }

            ClientCommand::RefreshShop { shop } => {
                session.active_mut()?.refresh_shop(user, shop)?;
                vec![Outbound::room("shop_refreshed", json!({ "user": user, "shop": shop }))]
            }

            ClientCommand::EndPhase3 => {
                session.active()?.end_phase(user)?;
                vec![Outbound::room("phase_ended", json!({ "phase": 3, "user": user }))]
            }

            ClientCommand::DiscardCard { hand_index } => {
                session.active_mut()?.discard_card(user, hand_index)?;
                vec![Outbound::room("card_discarded", by)]
            }

            ClientCommand::EndPhase4 => {
                session.active()?.end_phase(user)?;
                vec![Outbound::room("phase_ended", json!({ "phase": 4, "user": user }))]
            }

            ClientCommand::DrawNewHand => {
                let active = session.active_mut()?;
                let team = active.ensure_turn(user)?;
                let drawn = active.draw_new_hand(user)?;
                let game = active.game();
                let mut outbound: Vec<Outbound> = game
                    .team_players(team)
                    .map(|p| Outbound::player(p.user_id.clone(), "hand", hand_of(game, &p.user_id)))
                    .collect();
                outbound.push(Outbound::room("new_hand_drawn", json!({ "team": team.number(), "drawn": drawn })));
                outbound
            }

            ClientCommand::EndTurn => {
                let active = session.active_mut()?;
                active.end_turn(user)?;
                vec![Outbound::room(
                    "turn_ended",
                    json!({
                        "active_team": active.active_team_number().number(),
                        "turn": active.turn_number,
                        "action_points": active.action_points,
                    }),
                )]
            }
        };
        Ok(outbound)
    }
}
