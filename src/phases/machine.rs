//! Table-driven phase state machine.
//!
//! The machine knows nothing about game data. It only answers two
//! questions: is this event legal right now, and which phase follows it.
//! Session mutations are run between [`PhaseStateMachine::verify_event`]
//! and [`PhaseStateMachine::process_event`], so a rejected event never
//! reaches game data.

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, EngineResult};

/// Every phase a session moves through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    JoiningGame,
    SageSelection,
    JoiningTeams,
    ReadyUp,
    WarriorSelection,
    /// Day-break activations only.
    Phase1,
    /// Actions gated by action points.
    Phase2,
    /// Shop.
    Phase3,
    /// Discard.
    Phase4,
    DrawingNewHand,
    EndGame,
    GameFinished,
}

impl GamePhase {
    /// All phases, in table order.
    pub const ALL: [GamePhase; 12] = [
        GamePhase::JoiningGame,
        GamePhase::SageSelection,
        GamePhase::JoiningTeams,
        GamePhase::ReadyUp,
        GamePhase::WarriorSelection,
        GamePhase::Phase1,
        GamePhase::Phase2,
        GamePhase::Phase3,
        GamePhase::Phase4,
        GamePhase::DrawingNewHand,
        GamePhase::EndGame,
        GamePhase::GameFinished,
    ];

    /// Phases of live play, after setup has completed.
    #[must_use]
    pub fn is_match_phase(self) -> bool {
        matches!(
            self,
            GamePhase::Phase1
                | GamePhase::Phase2
                | GamePhase::Phase3
                | GamePhase::Phase4
                | GamePhase::DrawingNewHand
                | GamePhase::EndGame
                | GamePhase::GameFinished
        )
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Every event the machine understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameEvent {
    PlayerJoined,
    PlayerLeft,
    AllPlayersJoined,
    PlayerSelectedSage,
    AllSagesSelected,
    PlayerJoinedTeam,
    ClearTeams,
    AllTeamsJoined,
    ToggleReadyStatus,
    StartGame,
    ChooseWarriors,
    SwapWarriors,
    PlayerFinishedSetup,
    AllPlayersSetupComplete,
    ActivateDayBreak,
    EndPhase1,
    DrawCard,
    SwapCards,
    SummonCard,
    Attack,
    UseUtility,
    SageSkill,
    EndPhase2,
    WinGame,
    BuyCard,
    SummonBoughtCard,
    SellCard,
    RefreshShop,
    EndPhase3,
    DiscardCard,
    EndPhase4,
    DrawNewHand,
    EndTurn,
}

impl GameEvent {
    /// All events.
    pub const ALL: [GameEvent; 33] = [
        GameEvent::PlayerJoined,
        GameEvent::PlayerLeft,
        GameEvent::AllPlayersJoined,
        GameEvent::PlayerSelectedSage,
        GameEvent::AllSagesSelected,
        GameEvent::PlayerJoinedTeam,
        GameEvent::ClearTeams,
        GameEvent::AllTeamsJoined,
        GameEvent::ToggleReadyStatus,
        GameEvent::StartGame,
        GameEvent::ChooseWarriors,
        GameEvent::SwapWarriors,
        GameEvent::PlayerFinishedSetup,
        GameEvent::AllPlayersSetupComplete,
        GameEvent::ActivateDayBreak,
        GameEvent::EndPhase1,
        GameEvent::DrawCard,
        GameEvent::SwapCards,
        GameEvent::SummonCard,
        GameEvent::Attack,
        GameEvent::UseUtility,
        GameEvent::SageSkill,
        GameEvent::EndPhase2,
        GameEvent::WinGame,
        GameEvent::BuyCard,
        GameEvent::SummonBoughtCard,
        GameEvent::SellCard,
        GameEvent::RefreshShop,
        GameEvent::EndPhase3,
        GameEvent::DiscardCard,
        GameEvent::EndPhase4,
        GameEvent::DrawNewHand,
        GameEvent::EndTurn,
    ];
}

impl std::fmt::Display for GameEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

use GameEvent as E;
use GamePhase as P;

/// Accepted events per phase and the phase each one leads to.
///
/// A self-loop keeps collecting (one player acted); a forward edge fires
/// once everyone is done.
const TRANSITIONS: &[(GamePhase, &[(GameEvent, GamePhase)])] = &[
    (
        P::JoiningGame,
        &[
            (E::PlayerJoined, P::JoiningGame),
            (E::PlayerLeft, P::JoiningGame),
            (E::AllPlayersJoined, P::SageSelection),
        ],
    ),
    (
        P::SageSelection,
        &[
            (E::PlayerSelectedSage, P::SageSelection),
            (E::PlayerLeft, P::SageSelection),
            (E::AllSagesSelected, P::JoiningTeams),
        ],
    ),
    (
        P::JoiningTeams,
        &[
            (E::PlayerJoinedTeam, P::JoiningTeams),
            (E::ClearTeams, P::JoiningTeams),
            (E::PlayerLeft, P::JoiningTeams),
            (E::AllTeamsJoined, P::ReadyUp),
        ],
    ),
    (
        P::ReadyUp,
        &[
            (E::ToggleReadyStatus, P::ReadyUp),
            (E::PlayerLeft, P::ReadyUp),
            (E::StartGame, P::WarriorSelection),
        ],
    ),
    (
        P::WarriorSelection,
        &[
            (E::ChooseWarriors, P::WarriorSelection),
            (E::SwapWarriors, P::WarriorSelection),
            (E::PlayerFinishedSetup, P::WarriorSelection),
            (E::AllPlayersSetupComplete, P::Phase1),
        ],
    ),
    (
        P::Phase1,
        &[
            (E::ActivateDayBreak, P::Phase1),
            (E::EndPhase1, P::Phase2),
            (E::PlayerLeft, P::EndGame),
        ],
    ),
    (
        P::Phase2,
        &[
            (E::DrawCard, P::Phase2),
            (E::SwapCards, P::Phase2),
            (E::SummonCard, P::Phase2),
            (E::Attack, P::Phase2),
            (E::UseUtility, P::Phase2),
            (E::SageSkill, P::Phase2),
            (E::EndPhase2, P::Phase3),
            (E::WinGame, P::GameFinished),
            (E::PlayerLeft, P::EndGame),
        ],
    ),
    (
        P::Phase3,
        &[
            (E::BuyCard, P::Phase3),
            (E::SummonBoughtCard, P::Phase3),
            (E::SellCard, P::Phase3),
            (E::RefreshShop, P::Phase3),
            (E::EndPhase3, P::Phase4),
            (E::PlayerLeft, P::EndGame),
        ],
    ),
    (
        P::Phase4,
        &[
            (E::DiscardCard, P::Phase4),
            (E::EndPhase4, P::DrawingNewHand),
            (E::PlayerLeft, P::EndGame),
        ],
    ),
    (
        P::DrawingNewHand,
        &[
            (E::DrawNewHand, P::DrawingNewHand),
            (E::EndTurn, P::Phase1),
            (E::PlayerLeft, P::EndGame),
        ],
    ),
    (P::EndGame, &[(E::WinGame, P::GameFinished)]),
    (P::GameFinished, &[]),
];

/// Accepted `(event, next phase)` pairs for a phase.
#[must_use]
pub fn transitions(phase: GamePhase) -> &'static [(GameEvent, GamePhase)] {
    TRANSITIONS
        .iter()
        .find(|(p, _)| *p == phase)
        .map_or(&[], |(_, edges)| *edges)
}

/// Serializable snapshot of a machine, stored next to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseState {
    pub current: GamePhase,
}

/// Finite-state machine over [`GamePhase`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "PhaseState", from = "PhaseState")]
pub struct PhaseStateMachine {
    current: GamePhase,
}

impl PhaseStateMachine {
    /// A machine at the start of a fresh session.
    #[must_use]
    pub fn new() -> Self {
        Self::at(GamePhase::JoiningGame)
    }

    /// A machine positioned at `phase`.
    #[must_use]
    pub fn at(phase: GamePhase) -> Self {
        Self { current: phase }
    }

    #[must_use]
    pub fn current(&self) -> GamePhase {
        self.current
    }

    /// Events the current phase accepts.
    pub fn accepted_events(&self) -> impl Iterator<Item = GameEvent> {
        transitions(self.current).iter().map(|(event, _)| *event)
    }

    /// Check that `event` is legal now and return the phase it leads to.
    ///
    /// Never changes the machine.
    pub fn verify_event(&self, event: GameEvent) -> EngineResult<GamePhase> {
        transitions(self.current)
            .iter()
            .find(|(accepted, _)| *accepted == event)
            .map(|(_, next)| *next)
            .ok_or(EngineError::GameState {
                event,
                phase: self.current,
            })
    }

    /// Re-validate `event` and advance.
    pub fn process_event(&mut self, event: GameEvent) -> EngineResult<GamePhase> {
        let next = self.verify_event(event)?;
        self.current = next;
        Ok(next)
    }

    /// Snapshot for persistence.
    #[must_use]
    pub fn state(&self) -> PhaseState {
        PhaseState {
            current: self.current,
        }
    }
}

impl Default for PhaseStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl From<PhaseState> for PhaseStateMachine {
    fn from(state: PhaseState) -> Self {
        Self::at(state.current)
    }
}

impl From<PhaseStateMachine> for PhaseState {
    fn from(machine: PhaseStateMachine) -> Self {
        machine.state()
    }
}
