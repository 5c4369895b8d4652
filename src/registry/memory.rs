//! In-memory collaborators.
//!
//! - [`MemoryStore`]: bincode snapshots in a map, with a switch that makes
//!   every write fail
//! - [`ConnectionDirectory`]: user to connection lookup
//! - [`RecordingTransport`]: records every delivery instead of sending it
//!
//! They back the tests and are good enough for a single-process host.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::outbound::OutboundMessage;
use super::ports::{Identity, Persistence, Transport};
use crate::core::{ConnectionId, EngineError, EngineResult, SessionId, UserId};
use crate::game::{Session, TeamNumber};
use crate::phases::PhaseState;

/// Session and phase snapshots encoded with bincode.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<FxHashMap<SessionId, Vec<u8>>>,
    phases: Mutex<FxHashMap<SessionId, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following save fail with a storage error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> EngineResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(EngineError::storage("store rejected the write"))
        } else {
            Ok(())
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[async_trait]
impl Persistence for MemoryStore {
    async fn load_session(&self, id: &SessionId) -> EngineResult<Option<Session>> {
        let sessions = self.sessions.lock().await;
        match sessions.get(id) {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    async fn save_session(&self, session: &Session) -> EngineResult<()> {
        self.check_writable()?;
        let bytes = bincode::serialize(session)?;
        debug!(session_id = %session.id(), bytes = bytes.len(), "session saved");
        self.sessions.lock().await.insert(session.id().clone(), bytes);
        Ok(())
    }

    async fn load_phase(&self, id: &SessionId) -> EngineResult<Option<PhaseState>> {
        let phases = self.phases.lock().await;
        match phases.get(id) {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    async fn save_phase(&self, id: &SessionId, phase: &PhaseState) -> EngineResult<()> {
        self.check_writable()?;
        let bytes = bincode::serialize(phase)?;
        self.phases.lock().await.insert(id.clone(), bytes);
        Ok(())
    }

    async fn delete_session(&self, id: &SessionId) -> EngineResult<()> {
        self.sessions.lock().await.remove(id);
        self.phases.lock().await.remove(id);
        Ok(())
    }
}

/// Current connection of each user.
#[derive(Debug, Default)]
pub struct ConnectionDirectory {
    connections: RwLock<FxHashMap<UserId, ConnectionId>>,
}

impl ConnectionDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the user's connection, replacing an older one.
    pub async fn register(&self, user: UserId, connection: ConnectionId) {
        self.connections.write().await.insert(user, connection);
    }

    pub async fn unregister(&self, user: &UserId) {
        self.connections.write().await.remove(user);
    }
}

#[async_trait]
impl Identity for ConnectionDirectory {
    async fn resolve_connection_id(&self, user: &UserId) -> EngineResult<Option<ConnectionId>> {
        Ok(self.connections.read().await.get(user).cloned())
    }
}

/// Where a recorded message was addressed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryTarget {
    Player(ConnectionId),
    Team(SessionId, TeamNumber),
    Room(SessionId),
    RoomExcept(SessionId, ConnectionId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    pub target: DeliveryTarget,
    pub message: OutboundMessage,
}

/// Transport that keeps every message it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().await.clone()
    }

    /// Event names in delivery order.
    pub async fn events(&self) -> Vec<String> {
        self.deliveries
            .lock()
            .await
            .iter()
            .map(|d| d.message.event.clone())
            .collect()
    }

    pub async fn clear(&self) {
        self.deliveries.lock().await.clear();
    }

    async fn record(&self, target: DeliveryTarget, message: &OutboundMessage) -> EngineResult<()> {
        self.deliveries.lock().await.push(Delivery {
            target,
            message: message.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_to_player(&self, connection: &ConnectionId, message: &OutboundMessage) -> EngineResult<()> {
        self.record(DeliveryTarget::Player(connection.clone()), message).await
    }

    async fn send_to_team(
        &self,
        session: &SessionId,
        team: TeamNumber,
        message: &OutboundMessage,
    ) -> EngineResult<()> {
        self.record(DeliveryTarget::Team(session.clone(), team), message).await
    }

    async fn send_to_room(&self, session: &SessionId, message: &OutboundMessage) -> EngineResult<()> {
        self.record(DeliveryTarget::Room(session.clone()), message).await
    }

    async fn send_to_room_except(
        &self,
        session: &SessionId,
        except: &ConnectionId,
        message: &OutboundMessage,
    ) -> EngineResult<()> {
        self.record(DeliveryTarget::RoomExcept(session.clone(), except.clone()), message)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GameRules;
    use crate::game::{GameSession, SessionSettings};
    use crate::phases::{GamePhase, PhaseStateMachine};

    fn session() -> Session {
        Session::new(
            GameSession::new(SessionSettings::new("mem", 2).with_seed(4), GameRules::default())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_session_snapshot_roundtrip() {
        let store = MemoryStore::new();
        let session = session();

        store.save_session(&session).await.unwrap();
        let loaded = store.load_session(session.id()).await.unwrap();
        assert_eq!(loaded, Some(session));
    }

    #[tokio::test]
    async fn test_phase_roundtrip_and_delete() {
        let store = MemoryStore::new();
        let id = SessionId::from("mem");
        let state = PhaseStateMachine::at(GamePhase::ReadyUp).state();

        store.save_phase(&id, &state).await.unwrap();
        assert_eq!(store.load_phase(&id).await.unwrap(), Some(state));

        store.delete_session(&id).await.unwrap();
        assert_eq!(store.load_phase(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fail_writes() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let err = store.save_session(&session()).await.unwrap_err();
        assert_eq!(err.kind(), crate::core::ErrorKind::Storage);
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_directory_replaces_connection() {
        let directory = ConnectionDirectory::new();
        let user = UserId::from("a");
        directory.register(user.clone(), ConnectionId::from("c1")).await;
        directory.register(user.clone(), ConnectionId::from("c2")).await;

        assert_eq!(
            directory.resolve_connection_id(&user).await.unwrap(),
            Some(ConnectionId::from("c2"))
        );
        directory.unregister(&user).await;
        assert_eq!(directory.resolve_connection_id(&user).await.unwrap(), None);
    }
}
