use std::collections::VecDeque;
use tether_core::SignalEnvelope;

/// Signals produced before the transport was subscribed, in send order.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    pending: VecDeque<SignalEnvelope>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, envelope: SignalEnvelope) {
        self.pending.push_back(envelope);
    }

    /// Takes every queued signal, oldest first, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<SignalEnvelope> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
