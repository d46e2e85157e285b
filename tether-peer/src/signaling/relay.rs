use crate::error::RelayError;
use async_trait::async_trait;
use tether_core::{RoomId, SignalEnvelope};
use tokio::sync::{mpsc, oneshot};

/// A live subscription to one room's channel.
pub struct RelaySubscription {
    /// Resolves once the relay confirms the subscription. Publishes made
    /// before that point are not guaranteed to be delivered.
    pub ready: oneshot::Receiver<()>,
    /// Everything published to the room, possibly including our own messages.
    pub inbound: mpsc::UnboundedReceiver<SignalEnvelope>,
}

/// The external room-scoped pub/sub bus used for signaling.
///
/// Implementations may drop, duplicate or reflect messages; the session copes
/// with all three.
#[async_trait]
pub trait SignalingRelay: Send + Sync + 'static {
    async fn subscribe(&self, room: &RoomId) -> Result<RelaySubscription, RelayError>;

    async fn publish(&self, room: &RoomId, envelope: SignalEnvelope) -> Result<(), RelayError>;
}
