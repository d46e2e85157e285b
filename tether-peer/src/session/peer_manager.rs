use crate::config::PeerConfig;
use crate::connection::Connector;
use crate::diagnostics::DiagnosticReport;
use crate::error::{PeerError, PeerResult};
use crate::media::{MediaSink, MediaSource};
use crate::session::session::Session;
use crate::session::session_command::{Reply, SessionCommand};
use crate::signaling::SignalingRelay;
use std::sync::Arc;
use tether_core::{ConnectionState, Role, RoomId, SenderId};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::info;

/// Handle to one party's connection manager.
///
/// Cloning is cheap; all clones drive the same session. The session task
/// stops after [`PeerManager::cleanup`] or once every handle is dropped.
#[derive(Clone)]
pub struct PeerManager {
    role: Role,
    room: RoomId,
    sender_id: SenderId,
    command_tx: mpsc::Sender<SessionCommand>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl PeerManager {
    /// Starts the session task. Must be called inside a tokio runtime.
    pub fn spawn(
        role: Role,
        room: RoomId,
        config: PeerConfig,
        relay: Arc<dyn SignalingRelay>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let sender_id = SenderId::new();
        let (session, command_tx, state_rx) =
            Session::new(role, room.clone(), sender_id, config, relay, connector);
        tokio::spawn(session.run());

        info!("Spawned {} manager {} for room {}", role, sender_id, room);

        Self {
            role,
            room,
            sender_id,
            command_tx,
            state_rx,
        }
    }

    pub fn host(
        room: RoomId,
        config: PeerConfig,
        relay: Arc<dyn SignalingRelay>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self::spawn(Role::Host, room, config, relay, connector)
    }

    pub fn viewer(
        room: RoomId,
        config: PeerConfig,
        relay: Arc<dyn SignalingRelay>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self::spawn(Role::Viewer, room, config, relay, connector)
    }

    /// Acquires media from `source` and offers it to the room. Returns once
    /// the offer is sent or queued behind the relay subscription.
    pub async fn start_sharing(&self, source: Arc<dyn MediaSource>) -> PeerResult<()> {
        self.require(Role::Host, "start_sharing")?;
        self.request(|reply| SessionCommand::StartSharing { source, reply })
            .await
    }

    pub async fn join_as_viewer(&self, sink: Arc<dyn MediaSink>) -> PeerResult<()> {
        self.require(Role::Viewer, "join_as_viewer")?;
        self.request(|reply| SessionCommand::Join { sink, reply })
            .await
    }

    /// Tears the connection down and joins again from scratch. Media received
    /// earlier is handed to the sink straight away.
    pub async fn reset_and_reconnect(&self, sink: Option<Arc<dyn MediaSink>>) -> PeerResult<()> {
        self.require(Role::Viewer, "reset_and_reconnect")?;
        self.request(|reply| SessionCommand::Reset { sink, reply })
            .await
    }

    pub async fn stop_sharing(&self) -> PeerResult<()> {
        self.require(Role::Host, "stop_sharing")?;
        self.request(|reply| SessionCommand::StopSharing { reply })
            .await
    }

    /// Releases everything and stops the session. Safe to call repeatedly.
    pub async fn cleanup(&self) -> PeerResult<()> {
        match self
            .request(|reply| SessionCommand::Cleanup { reply })
            .await
        {
            Err(PeerError::Closed) => Ok(()),
            res => res,
        }
    }

    /// Registers `listener` for every later change of [`ConnectionState`].
    pub async fn on_connection_state_change<F>(&self, listener: F) -> PeerResult<()>
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        let listener = Box::new(listener);
        self.request(|reply| SessionCommand::Subscribe { listener, reply })
            .await
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    pub async fn diagnose(&self) -> PeerResult<DiagnosticReport> {
        self.request(|reply| SessionCommand::Diagnose { reply })
            .await
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn sender_id(&self) -> SenderId {
        self.sender_id
    }

    fn require(&self, role: Role, operation: &'static str) -> PeerResult<()> {
        if self.role != role {
            return Err(PeerError::WrongRole {
                operation,
                role: self.role,
            });
        }
        Ok(())
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> SessionCommand) -> PeerResult<T> {
        let (reply, rx) = oneshot::channel();
        self.command_tx
            .send(command(reply))
            .await
            .map_err(|_| PeerError::Closed)?;
        rx.await.map_err(|_| PeerError::Closed)?
    }
}
