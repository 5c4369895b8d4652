//! Registry pipeline tests.
//!
//! Commands go in as JSON, exactly as a client would send them. The
//! in-memory store and the recording transport stand in for the host.

use std::sync::Arc;

use sage_arena::core::{ConnectionId, EngineError, ErrorKind, SessionId, UserId};
use sage_arena::game::{SessionSettings, TeamNumber};
use sage_arena::phases::GamePhase;
use sage_arena::registry::{
    ConnectionDirectory, DeliveryTarget, MemoryStore, Persistence, RecordingTransport,
    SessionRegistry,
};

struct Host {
    registry: SessionRegistry,
    store: Arc<MemoryStore>,
    transport: Arc<RecordingTransport>,
    directory: Arc<ConnectionDirectory>,
}

/// Log to the test output; `RUST_LOG=sage_arena=debug` shows the pipeline.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn host() -> Host {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let transport = Arc::new(RecordingTransport::new());
    let directory = Arc::new(ConnectionDirectory::new());
    let registry = SessionRegistry::new(store.clone(), transport.clone(), directory.clone());
    Host {
        registry,
        store,
        transport,
        directory,
    }
}

fn user(name: &str) -> UserId {
    UserId::from(name)
}

impl Host {
    async fn send(&self, id: &SessionId, who: &str, json: &str) -> sage_arena::EngineResult<GamePhase> {
        self.registry.handle_json(id, &user(who), json).await
    }

    async fn ok(&self, id: &SessionId, who: &str, json: &str) -> GamePhase {
        match self.send(id, who, json).await {
            Ok(phase) => phase,
            Err(err) => panic!("{} sent {} and got {}", who, json, err),
        }
    }

    /// Create a duel and run it up to the ready-up phase.
    async fn duel_to_ready_up(&self, name: &str) -> SessionId {
        let id = SessionId::from(name);
        self.registry
            .create_session(SessionSettings::new(name, 2).with_seed(21))
            .await
            .unwrap();
        self.ok(&id, "alice", r#"{"event":"join_game","payload":{"connection_id":"conn-alice"}}"#).await;
        self.ok(&id, "bob", r#"{"event":"join_game","payload":{"connection_id":"conn-bob"}}"#).await;
        self.ok(&id, "alice", r#"{"event":"all_players_joined"}"#).await;
        self.ok(&id, "alice", r#"{"event":"select_sage","payload":{"sage":"Pyra"}}"#).await;
        self.ok(&id, "bob", r#"{"event":"select_sage","payload":{"sage":"Maris"}}"#).await;
        self.ok(&id, "alice", r#"{"event":"all_sages_selected"}"#).await;
        self.ok(&id, "alice", r#"{"event":"join_team","payload":{"team":1}}"#).await;
        self.ok(&id, "bob", r#"{"event":"join_team","payload":{"team":2}}"#).await;
        let phase = self.ok(&id, "alice", r#"{"event":"all_teams_joined"}"#).await;
        assert_eq!(phase, GamePhase::ReadyUp);
        id
    }

    /// Continue a ready-up duel into the first play phase.
    async fn duel_to_phase1(&self, name: &str) -> SessionId {
        let id = self.duel_to_ready_up(name).await;
        self.ok(&id, "alice", r#"{"event":"toggle_ready"}"#).await;
        self.ok(&id, "bob", r#"{"event":"toggle_ready"}"#).await;
        self.ok(&id, "alice", r#"{"event":"start_game"}"#).await;
        self.ok(&id, "alice", r#"{"event":"choose_warriors","payload":{"warriors":[103,104]}}"#).await;
        self.ok(&id, "bob", r#"{"event":"choose_warriors","payload":{"warriors":[203,205]}}"#).await;
        self.ok(&id, "alice", r#"{"event":"finish_setup"}"#).await;
        self.ok(&id, "bob", r#"{"event":"finish_setup"}"#).await;
        let phase = self.ok(&id, "alice", r#"{"event":"all_players_setup_complete"}"#).await;
        assert_eq!(phase, GamePhase::Phase1);
        id
    }

    async fn acting(&self, id: &SessionId) -> (&'static str, &'static str) {
        let active = self.registry.get_active_session(id).await.unwrap();
        match active.active_team_number() {
            TeamNumber::One => ("alice", "bob"),
            TeamNumber::Two => ("bob", "alice"),
        }
    }
}

/// Test the full setup walk through the registry.
#[tokio::test]
async fn test_setup_reaches_phase1() {
    let h = host();
    let id = h.duel_to_phase1("walk").await;

    let active = h.registry.get_active_session(&id).await.unwrap();
    assert_eq!(active.current_phase, GamePhase::Phase1);
    assert_eq!(active.max_action_points, 3);

    let stored = h.store.load_phase(&id).await.unwrap().unwrap();
    assert_eq!(stored.current, GamePhase::Phase1);
}

/// Test that opening hands go privately to each player's connection.
#[tokio::test]
async fn test_hands_delivered_privately() {
    let h = host();
    h.directory
        .register(user("alice"), ConnectionId::from("alice-reconnected"))
        .await;
    h.duel_to_phase1("hands").await;

    let deliveries = h.transport.deliveries().await;
    let hand_targets: Vec<DeliveryTarget> = deliveries
        .iter()
        .filter(|d| d.message.event == "hand")
        .map(|d| d.target.clone())
        .collect();
    assert!(hand_targets.contains(&DeliveryTarget::Player(ConnectionId::from("alice-reconnected"))));
    assert!(hand_targets.contains(&DeliveryTarget::Player(ConnectionId::from("conn-bob"))));
}

/// Test that a host-only event from a guest changes nothing.
#[tokio::test]
async fn test_host_only_refused() {
    let h = host();
    let id = SessionId::from("host");
    h.registry
        .create_session(SessionSettings::new("host", 2))
        .await
        .unwrap();
    h.ok(&id, "alice", r#"{"event":"join_game","payload":{"connection_id":"a"}}"#).await;
    h.ok(&id, "bob", r#"{"event":"join_game","payload":{"connection_id":"b"}}"#).await;

    let err = h.send(&id, "bob", r#"{"event":"all_players_joined"}"#).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HostOnly);
    assert_eq!(h.registry.phase(&id).await.unwrap(), GamePhase::JoiningGame);
}

/// Test that unknown payload fields are rejected before anything runs.
#[tokio::test]
async fn test_unknown_fields_rejected() {
    let h = host();
    let id = h.duel_to_ready_up("strict").await;
    h.transport.clear().await;

    let err = h
        .send(&id, "alice", r#"{"event":"toggle_ready","payload":{"force":true}}"#)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(h.transport.events().await.is_empty());
}

/// Test that a failed save rolls the whole event back.
#[tokio::test]
async fn test_persistence_failure_rolls_back() {
    let h = host();
    let id = h.duel_to_ready_up("rollback").await;
    h.ok(&id, "alice", r#"{"event":"toggle_ready"}"#).await;
    h.ok(&id, "bob", r#"{"event":"toggle_ready"}"#).await;
    h.transport.clear().await;

    h.store.set_fail_writes(true);
    let err = h.send(&id, "alice", r#"{"event":"start_game"}"#).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    assert_eq!(h.registry.phase(&id).await.unwrap(), GamePhase::ReadyUp);
    let session = h.registry.get_session(&id).await.unwrap();
    assert!(!session.is_active());
    assert!(h.transport.events().await.is_empty());

    h.store.set_fail_writes(false);
    let phase = h.ok(&id, "alice", r#"{"event":"start_game"}"#).await;
    assert_eq!(phase, GamePhase::WarriorSelection);
    assert!(h.registry.get_session(&id).await.unwrap().is_active());
}

/// Test that an event from the wrong phase is a game-state error.
#[tokio::test]
async fn test_out_of_phase_event() {
    let h = host();
    let id = h.duel_to_phase1("phase").await;
    let (actor, _) = h.acting(&id).await;

    let err = h.send(&id, actor, r#"{"event":"draw_card"}"#).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GameState);
}

/// Test one full turn cycle through the registry.
#[tokio::test]
async fn test_turn_cycle() {
    let h = host();
    let id = h.duel_to_phase1("turn").await;
    let (actor, waiting) = h.acting(&id).await;

    h.ok(&id, actor, r#"{"event":"activate_day_break","payload":{"slot":4}}"#).await;
    h.ok(&id, actor, r#"{"event":"end_phase1"}"#).await;
    h.ok(&id, actor, r#"{"event":"attack","payload":{"attacker":5,"target":5}}"#).await;

    let err = h.send(&id, waiting, r#"{"event":"draw_card"}"#).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    h.ok(&id, actor, r#"{"event":"end_phase2"}"#).await;
    h.ok(&id, actor, r#"{"event":"end_phase3"}"#).await;
    h.ok(&id, actor, r#"{"event":"end_phase4"}"#).await;
    h.ok(&id, actor, r#"{"event":"draw_new_hand"}"#).await;
    let phase = h.ok(&id, actor, r#"{"event":"end_turn"}"#).await;
    assert_eq!(phase, GamePhase::Phase1);

    let active = h.registry.get_active_session(&id).await.unwrap();
    assert_eq!(active.turn_number, 2);
    assert_eq!(active.current_phase, GamePhase::Phase1);
    assert_eq!(h.acting(&id).await.0, waiting);
}

/// Test that only the active team can close its phases.
#[tokio::test]
async fn test_waiting_player_cannot_end_phase() {
    let h = host();
    let id = h.duel_to_phase1("phases").await;
    let (actor, waiting) = h.acting(&id).await;
    h.transport.clear().await;

    let err = h.send(&id, waiting, r#"{"event":"end_phase1"}"#).await.unwrap_err();
    assert!(matches!(err, EngineError::NotYourTurn { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(h.registry.phase(&id).await.unwrap(), GamePhase::Phase1);
    assert!(h.transport.events().await.is_empty());

    let steps = [
        ("end_phase1", GamePhase::Phase2),
        ("end_phase2", GamePhase::Phase3),
        ("end_phase3", GamePhase::Phase4),
        ("end_phase4", GamePhase::DrawingNewHand),
    ];
    for (event, next) in steps {
        let json = format!(r#"{{"event":"{}"}}"#, event);
        let err = h.send(&id, waiting, &json).await.unwrap_err();
        assert!(matches!(err, EngineError::NotYourTurn { .. }), "{}", event);
        assert_eq!(h.ok(&id, actor, &json).await, next);
    }
}

/// Test that leaving mid-match ends the game for the other team.
#[tokio::test]
async fn test_leave_mid_match() {
    let h = host();
    let id = h.duel_to_phase1("leave").await;
    let (actor, waiting) = h.acting(&id).await;

    let phase = h.ok(&id, waiting, r#"{"event":"leave_game"}"#).await;
    assert_eq!(phase, GamePhase::EndGame);

    let phase = h.ok(&id, actor, r#"{"event":"win_game"}"#).await;
    assert_eq!(phase, GamePhase::GameFinished);
    let active = h.registry.get_active_session(&id).await.unwrap();
    assert_eq!(active.winner, Some(active.active_team_number()));
}

/// Test that two sessions progress independently.
#[tokio::test]
async fn test_sessions_are_independent() {
    let h = host();
    let (first, second) = tokio::join!(h.duel_to_ready_up("one"), h.duel_to_ready_up("two"));

    h.ok(&first, "alice", r#"{"event":"toggle_ready"}"#).await;
    let one = h.registry.get_session(&first).await.unwrap();
    let two = h.registry.get_session(&second).await.unwrap();
    assert!(one.game().player(&user("alice")).unwrap().is_ready);
    assert!(!two.game().player(&user("alice")).unwrap().is_ready);

    h.registry.remove_session(&second).await.unwrap();
    assert_eq!(h.store.session_count().await, 1);
    let err = h.registry.phase(&second).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
