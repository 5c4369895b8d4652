//! Session registry.
//!
//! The registry owns every live session together with its phase machine.
//! Each session sits behind its own mutex, so commands for one session
//! are serialized while different sessions proceed in parallel. The outer
//! map is only write-locked to add or drop an entry.
//!
//! ## Event pipeline
//!
//! [`SessionRegistry::verify_and_process`] runs every change:
//!
//! 1. lock the session
//! 2. check the event against the phase machine
//! 3. run the mutation on a clone of the session
//! 4. advance a copy of the machine
//! 5. persist session and phase
//! 6. swap the clone and the machine copy in
//! 7. deliver the outbound messages
//!
//! Any failure in steps 2 to 5 leaves the stored session, the machine and
//! persistence as they were. Delivery failures are logged, never returned.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use super::command::ClientCommand;
use super::outbound::{Audience, Outbound};
use super::ports::{Identity, Persistence, Transport};
use crate::core::{ConnectionId, EngineError, EngineResult, GameRules, SessionId, UserId};
use crate::game::{ActiveGameSession, GameSession, Session, SessionSettings};
use crate::phases::{GameEvent, GamePhase, PhaseStateMachine};

/// A session and the machine tracking its phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionEntry {
    pub session: Session,
    pub machine: PhaseStateMachine,
}

type SharedEntry = Arc<Mutex<SessionEntry>>;

/// Concurrent store of sessions wired to persistence, transport and
/// identity.
pub struct SessionRegistry {
    sessions: RwLock<FxHashMap<SessionId, SharedEntry>>,
    persistence: Arc<dyn Persistence>,
    transport: Arc<dyn Transport>,
    identity: Arc<dyn Identity>,
    rules: GameRules,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Registry using the standard rules for new sessions.
    pub fn new(
        persistence: Arc<dyn Persistence>,
        transport: Arc<dyn Transport>,
        identity: Arc<dyn Identity>,
    ) -> Self {
        Self {
            sessions: RwLock::new(FxHashMap::default()),
            persistence,
            transport,
            identity,
            rules: GameRules::default(),
        }
    }

    /// Rules for sessions created from now on.
    #[must_use]
    pub fn with_rules(mut self, rules: GameRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Create and persist an empty session.
    #[instrument(skip(self, settings), fields(session_id = %settings.id))]
    pub async fn create_session(&self, settings: SessionSettings) -> EngineResult<()> {
        let id = settings.id.clone();
        if self.sessions.read().await.contains_key(&id)
            || self.persistence.load_session(&id).await?.is_some()
        {
            return Err(EngineError::conflict(format!("session {} already exists", id)));
        }

        let session = Session::new(GameSession::new(settings, self.rules.clone())?);
        let machine = PhaseStateMachine::new();
        self.persistence.save_session(&session).await?;
        self.persistence.save_phase(&id, &machine.state()).await?;

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return Err(EngineError::conflict(format!("session {} already exists", id)));
        }
        sessions.insert(id, Arc::new(Mutex::new(SessionEntry { session, machine })));
        info!("session registered");
        Ok(())
    }

    /// The entry for `id`, loaded from persistence on a miss.
    async fn entry(&self, id: &SessionId) -> EngineResult<SharedEntry> {
        if let Some(entry) = self.sessions.read().await.get(id) {
            return Ok(Arc::clone(entry));
        }

        let session = self
            .persistence
            .load_session(id)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("session {}", id)))?;
        let machine = self
            .persistence
            .load_phase(id)
            .await?
            .map(PhaseStateMachine::from)
            .ok_or_else(|| EngineError::not_found(format!("phase of session {}", id)))?;
        debug!(session_id = %id, phase = %machine.current(), "session loaded from storage");

        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(SessionEntry { session, machine })));
        Ok(Arc::clone(entry))
    }

    /// Snapshot of a session.
    pub async fn get_session(&self, id: &SessionId) -> EngineResult<Session> {
        let entry = self.entry(id).await?;
        let session = entry.lock().await.session.clone();
        Ok(session)
    }

    /// Snapshot of a started session.
    pub async fn get_active_session(&self, id: &SessionId) -> EngineResult<ActiveGameSession> {
        let entry = self.entry(id).await?;
        let active = entry.lock().await.session.active().cloned()?;
        Ok(active)
    }

    pub async fn phase(&self, id: &SessionId) -> EngineResult<GamePhase> {
        let entry = self.entry(id).await?;
        let phase = entry.lock().await.machine.current();
        Ok(phase)
    }

    /// Run `mutate` for `event` as one all-or-nothing step.
    ///
    /// Returns the phase the session is in afterwards.
    #[instrument(skip_all, fields(session_id = %id, user = %user, event = %event))]
    pub async fn verify_and_process<F>(
        &self,
        id: &SessionId,
        user: &UserId,
        event: GameEvent,
        mutate: F,
    ) -> EngineResult<GamePhase>
    where
        F: FnOnce(&mut Session) -> EngineResult<Vec<Outbound>> + Send,
    {
        let handle = self.entry(id).await?;
        let mut entry = handle.lock().await;

        let next = entry.machine.verify_event(event)?;
        let mut staged = entry.session.clone();
        let outbound = mutate(&mut staged).map_err(|err| {
            debug!(error = %err, "event rejected by session");
            err
        })?;

        let mut machine = entry.machine;
        machine.process_event(event)?;
        if let Session::Active(active) = &mut staged {
            if next.is_match_phase() {
                active.current_phase = next;
            }
        }

        self.persistence.save_session(&staged).await?;
        if let Err(err) = self.persistence.save_phase(id, &machine.state()).await {
            if let Err(restore) = self.persistence.save_session(&entry.session).await {
                warn!(error = %restore, "could not restore previous session snapshot");
            }
            return Err(err);
        }

        entry.session = staged;
        entry.machine = machine;
        info!(phase = %next, "event processed");

        self.deliver(&entry.session, outbound).await;
        Ok(next)
    }

    /// Apply a parsed client command.
    pub async fn handle_command(
        &self,
        id: &SessionId,
        user: &UserId,
        command: ClientCommand,
    ) -> EngineResult<GamePhase> {
        let event = command.event();
        self.verify_and_process(id, user, event, move |session| command.apply(session, user))
            .await
    }

    /// Parse and apply a raw JSON command.
    pub async fn handle_json(&self, id: &SessionId, user: &UserId, json: &str) -> EngineResult<GamePhase> {
        let command = ClientCommand::parse(json).map_err(|err| {
            warn!(session_id = %id, user = %user, error = %err, "rejected command payload");
            err
        })?;
        self.handle_command(id, user, command).await
    }

    /// Drop a session from memory and storage.
    #[instrument(skip(self))]
    pub async fn remove_session(&self, id: &SessionId) -> EngineResult<()> {
        let removed = self.sessions.write().await.remove(id);
        self.persistence.delete_session(id).await?;
        if removed.is_none() {
            debug!("session was not loaded");
        }
        info!("session removed");
        Ok(())
    }

    pub async fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Current connection of a user: the identity service first, then the
    /// connection recorded on the session.
    async fn connection_of(&self, session: &Session, user: &UserId) -> Option<ConnectionId> {
        let recorded = || {
            session
                .game()
                .player(user)
                .ok()
                .map(|p| p.connection_id.clone())
        };
        match self.identity.resolve_connection_id(user).await {
            Ok(Some(connection)) => Some(connection),
            Ok(None) => recorded(),
            Err(err) => {
                warn!(user = %user, error = %err, "identity lookup failed");
                recorded()
            }
        }
    }

    async fn deliver(&self, session: &Session, outbound: Vec<Outbound>) {
        let id = session.id();
        for Outbound { audience, message } in outbound {
            let sent = match audience {
                Audience::Player(user) => match self.connection_of(session, &user).await {
                    Some(connection) => self.transport.send_to_player(&connection, &message).await,
                    None => {
                        warn!(user = %user, event = %message.event, "no connection for player");
                        continue;
                    }
                },
                Audience::Team(team) => self.transport.send_to_team(id, team, &message).await,
                Audience::Room => self.transport.send_to_room(id, &message).await,
                Audience::RoomExcept(user) => match self.connection_of(session, &user).await {
                    Some(connection) => {
                        self.transport
                            .send_to_room_except(id, &connection, &message)
                            .await
                    }
                    None => self.transport.send_to_room(id, &message).await,
                },
            };
            if let Err(err) = sent {
                warn!(session_id = %id, event = %message.event, error = %err, "delivery failed");
            }
        }
    }
}
