use crate::error::RelayError;
use crate::signaling::{RelaySubscription, SignalingRelay};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tether_core::codec;
use tether_core::{RoomId, SignalEnvelope};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// In-process relay: every publish goes out to every subscriber of the room,
/// the publisher included. Messages pass through the JSON codec on the way,
/// as they would on a text relay.
#[derive(Clone, Default)]
pub struct LocalRelay {
    inner: Arc<LocalRelayInner>,
}

#[derive(Default)]
struct LocalRelayInner {
    rooms: DashMap<RoomId, Vec<mpsc::UnboundedSender<SignalEnvelope>>>,
}

impl LocalRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live subscribers of `room`. Closed subscriptions are pruned on publish.
    pub fn subscriber_count(&self, room: &RoomId) -> usize {
        self.inner
            .rooms
            .get(room)
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl SignalingRelay for LocalRelay {
    async fn subscribe(&self, room: &RoomId) -> Result<RelaySubscription, RelayError> {
        let (tx, inbound) = mpsc::unbounded_channel();
        let (ready_tx, ready) = oneshot::channel();

        let mut subs = self.inner.rooms.entry(room.clone()).or_default();
        if subs.is_empty() {
            info!("Opening relay channel for room {}", room);
        }
        subs.push(tx);
        drop(subs);

        let _ = ready_tx.send(());
        Ok(RelaySubscription { ready, inbound })
    }

    async fn publish(&self, room: &RoomId, envelope: SignalEnvelope) -> Result<(), RelayError> {
        let text = codec::encode(&envelope).map_err(|e| RelayError::Publish(e.to_string()))?;

        let Some(mut subs) = self.inner.rooms.get_mut(room) else {
            debug!("Publish to room {} with no subscribers", room);
            return Ok(());
        };

        let mut delivered = 0;
        for tx in subs.iter() {
            let decoded = codec::decode(&text).map_err(|e| RelayError::Publish(e.to_string()))?;
            if tx.send(decoded).is_ok() {
                delivered += 1;
            }
        }
        subs.retain(|tx| !tx.is_closed());

        debug!(
            "Relayed {} in room {} to {} subscriber(s)",
            envelope.signal.kind(),
            room,
            delivered
        );
        Ok(())
    }
}
