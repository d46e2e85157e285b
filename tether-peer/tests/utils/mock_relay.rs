use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tether_core::{RoomId, SenderId, SignalEnvelope, SignalPayload};
use tether_peer::{RelayError, RelaySubscription, SignalingRelay};
use tokio::sync::{mpsc, oneshot};

/// Relay that records every publish and only delivers what the test injects.
#[derive(Clone)]
pub struct MockRelay {
    inner: Arc<MockRelayInner>,
}

struct MockRelayInner {
    /// When false, subscriptions stay unconfirmed until [`MockRelay::confirm`].
    auto_ready: bool,
    state: Mutex<RelayState>,
    published_tx: mpsc::UnboundedSender<SignalEnvelope>,
}

#[derive(Default)]
struct RelayState {
    subscribers: Vec<(RoomId, mpsc::UnboundedSender<SignalEnvelope>)>,
    pending_ready: Vec<oneshot::Sender<()>>,
    published: Vec<SignalEnvelope>,
}

impl MockRelay {
    /// Subscriptions are confirmed immediately.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SignalEnvelope>) {
        Self::build(true)
    }

    /// Subscriptions wait for [`MockRelay::confirm`].
    pub fn manual() -> (Self, mpsc::UnboundedReceiver<SignalEnvelope>) {
        Self::build(false)
    }

    fn build(auto_ready: bool) -> (Self, mpsc::UnboundedReceiver<SignalEnvelope>) {
        let (published_tx, published_rx) = mpsc::unbounded_channel();
        let relay = Self {
            inner: Arc::new(MockRelayInner {
                auto_ready,
                state: Mutex::new(RelayState::default()),
                published_tx,
            }),
        };
        (relay, published_rx)
    }

    /// Confirms every subscription made so far.
    pub fn confirm(&self) {
        let pending: Vec<_> = self.inner.state.lock().unwrap().pending_ready.drain(..).collect();
        for ready in pending {
            let _ = ready.send(());
        }
    }

    /// Hands `envelope` to every subscriber of its room.
    pub fn deliver(&self, envelope: SignalEnvelope) {
        let state = self.inner.state.lock().unwrap();
        for (room, tx) in &state.subscribers {
            if *room == envelope.room_id {
                let _ = tx.send(envelope.clone());
            }
        }
    }

    /// Delivers `signal` as if another party in `room` had sent it.
    pub fn deliver_from(&self, room: &RoomId, sender: SenderId, signal: SignalPayload) {
        self.deliver(SignalEnvelope::new(room.clone(), sender, signal));
    }

    pub fn published(&self) -> Vec<SignalEnvelope> {
        self.inner.state.lock().unwrap().published.clone()
    }

    pub fn published_kinds(&self) -> Vec<&'static str> {
        self.published().iter().map(|e| e.signal.kind()).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.published_kinds().into_iter().filter(|k| *k == kind).count()
    }

    pub fn subscriptions(&self) -> usize {
        self.inner.state.lock().unwrap().subscribers.len()
    }
}

#[async_trait]
impl SignalingRelay for MockRelay {
    async fn subscribe(&self, room: &RoomId) -> Result<RelaySubscription, RelayError> {
        let (ready_tx, ready) = oneshot::channel();
        let (tx, inbound) = mpsc::unbounded_channel();

        let mut state = self.inner.state.lock().unwrap();
        state.subscribers.push((room.clone(), tx));
        if self.inner.auto_ready {
            let _ = ready_tx.send(());
        } else {
            state.pending_ready.push(ready_tx);
        }

        Ok(RelaySubscription { ready, inbound })
    }

    async fn publish(&self, room: &RoomId, envelope: SignalEnvelope) -> Result<(), RelayError> {
        tracing::debug!("[MockRelay] publish {} to {}", envelope.signal.kind(), room);

        self.inner
            .state
            .lock()
            .unwrap()
            .published
            .push(envelope.clone());
        let _ = self.inner.published_tx.send(envelope);
        Ok(())
    }
}
