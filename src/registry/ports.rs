//! Collaborator interfaces.
//!
//! The engine does not store, deliver or authenticate anything itself.
//! Hosts plug those concerns in through these traits.

use async_trait::async_trait;

use super::outbound::OutboundMessage;
use crate::core::{ConnectionId, EngineResult, SessionId, UserId};
use crate::game::{Session, TeamNumber};
use crate::phases::PhaseState;

/// Durable storage for sessions and their phase machines.
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn load_session(&self, id: &SessionId) -> EngineResult<Option<Session>>;

    async fn save_session(&self, session: &Session) -> EngineResult<()>;

    async fn load_phase(&self, id: &SessionId) -> EngineResult<Option<PhaseState>>;

    async fn save_phase(&self, id: &SessionId, phase: &PhaseState) -> EngineResult<()>;

    /// Remove the session and its phase. Missing entries are not an error.
    async fn delete_session(&self, id: &SessionId) -> EngineResult<()>;
}

/// Push delivery to connected clients.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_to_player(&self, connection: &ConnectionId, message: &OutboundMessage) -> EngineResult<()>;

    async fn send_to_team(
        &self,
        session: &SessionId,
        team: TeamNumber,
        message: &OutboundMessage,
    ) -> EngineResult<()>;

    async fn send_to_room(&self, session: &SessionId, message: &OutboundMessage) -> EngineResult<()>;

    async fn send_to_room_except(
        &self,
        session: &SessionId,
        except: &ConnectionId,
        message: &OutboundMessage,
    ) -> EngineResult<()>;
}

/// Maps users to the connection they are currently reachable on.
#[async_trait]
pub trait Identity: Send + Sync {
    async fn resolve_connection_id(&self, user: &UserId) -> EngineResult<Option<ConnectionId>>;
}
