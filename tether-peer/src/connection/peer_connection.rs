use crate::config::PeerConfig;
use crate::connection::ConnectionEvent;
use crate::diagnostics::StatsSnapshot;
use crate::media::{LocalStream, MediaKind};
use anyhow::Result;
use async_trait::async_trait;
use tether_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;

/// The peer connection primitive a session drives.
///
/// A session owns exactly one of these at a time and calls it from a single
/// task, so implementations need not serialize description changes themselves.
#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn attach_local_stream(&self, stream: &LocalStream) -> Result<()>;

    /// Declares that `kind` is expected from the remote side and never sent.
    async fn add_receive_only(&self, kind: MediaKind) -> Result<()>;

    async fn create_offer(&self, ice_restart: bool) -> Result<String>;

    async fn create_answer(&self) -> Result<String>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn stats(&self) -> Result<StatsSnapshot>;

    async fn close(&self) -> Result<()>;
}

/// Builds peer connections. Each connection reports through its own channel,
/// so events of a discarded connection die with it.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(
        &self,
        config: &PeerConfig,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> Result<Box<dyn PeerConnection>>;
}
