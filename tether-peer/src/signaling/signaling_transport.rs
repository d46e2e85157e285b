use crate::error::RelayError;
use crate::signaling::{
    InboundFilter, OutboundQueue, RelaySubscription, SignalingRelay, TransportEvent,
};
use std::sync::Arc;
use std::time::Duration;
use tether_core::{RoomId, SenderId, SignalEnvelope, SignalPayload};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Room-scoped signaling channel for one connection attempt.
///
/// Sends made before the relay confirms the subscription are queued and
/// flushed, in order, by [`SignalingTransport::mark_ready`]. Inbound messages
/// are filtered and handed to the owner as [`TransportEvent`]s.
pub struct SignalingTransport {
    room: RoomId,
    sender: SenderId,
    relay: Arc<dyn SignalingRelay>,
    outbound: OutboundQueue,
    ready: bool,
    pump: JoinHandle<()>,
}

impl SignalingTransport {
    pub async fn open(
        room: RoomId,
        sender: SenderId,
        relay: Arc<dyn SignalingRelay>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TransportEvent>), RelayError> {
        let subscription = relay.subscribe(&room).await?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let filter = InboundFilter::new(room.clone(), sender);
        let pump = tokio::spawn(pump_inbound(subscription, filter, event_tx));

        info!("Signaling transport opened for room {}", room);

        let transport = Self {
            room,
            sender,
            relay,
            outbound: OutboundQueue::new(),
            ready: false,
            pump,
        };
        Ok((transport, event_rx))
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub async fn send(&mut self, signal: SignalPayload) {
        let envelope = SignalEnvelope::new(self.room.clone(), self.sender, signal);

        if !self.ready {
            debug!("Queueing {} until subscription is ready", envelope.signal.kind());
            self.outbound.push(envelope);
            return;
        }

        self.publish(envelope).await;
    }

    /// Flushes the outbound queue. Only the first call has any effect.
    pub async fn mark_ready(&mut self) {
        if self.ready {
            return;
        }
        self.ready = true;

        let queued = self.outbound.drain();
        if !queued.is_empty() {
            info!("Subscription ready, flushing {} queued signal(s)", queued.len());
        }
        for envelope in queued {
            self.publish(envelope).await;
        }
    }

    /// Gives queued signals a last chance to go out before the transport is
    /// closed. Waits up to `wait` for the relay to confirm the subscription,
    /// then flushes whatever is queued either way.
    pub async fn flush(
        &mut self,
        events: Option<&mut mpsc::UnboundedReceiver<TransportEvent>>,
        wait: Duration,
    ) {
        if self.ready || self.outbound.is_empty() {
            return;
        }

        let confirmed = match events {
            Some(events) => timeout(wait, wait_ready(events)).await.unwrap_or(false),
            None => false,
        };
        if !confirmed {
            warn!(
                "Subscription to room {} still unconfirmed, publishing {} queued signal(s) anyway",
                self.room,
                self.outbound.len()
            );
        }
        self.mark_ready().await;
    }

    /// Stops receiving. Anything still queued is reported, not sent.
    pub fn close(&mut self) {
        self.pump.abort();

        if !self.outbound.is_empty() {
            warn!(
                "Closing transport for room {} with {} unsent signal(s)",
                self.room,
                self.outbound.len()
            );
        }
    }

    async fn publish(&self, envelope: SignalEnvelope) {
        let kind = envelope.signal.kind();
        if let Err(e) = self.relay.publish(&self.room, envelope).await {
            error!("Failed to publish {} to room {}: {}", kind, self.room, e);
        }
    }
}

impl Drop for SignalingTransport {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

async fn wait_ready(events: &mut mpsc::UnboundedReceiver<TransportEvent>) -> bool {
    while let Some(event) = events.recv().await {
        if matches!(event, TransportEvent::Ready) {
            return true;
        }
    }
    false
}

async fn pump_inbound(
    subscription: RelaySubscription,
    filter: InboundFilter,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    let RelaySubscription { ready, mut inbound } = subscription;

    if ready.await.is_err() {
        warn!("Relay dropped the subscription before confirming it");
        return;
    }
    if event_tx.send(TransportEvent::Ready).is_err() {
        return;
    }

    while let Some(envelope) = inbound.recv().await {
        if !filter.accepts(&envelope) {
            continue;
        }
        if event_tx.send(TransportEvent::Message(envelope)).is_err() {
            break;
        }
    }

    debug!("Relay subscription closed");
}
