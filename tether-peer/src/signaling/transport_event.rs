use tether_core::SignalEnvelope;

/// What the signaling transport reports back to its owner.
#[derive(Debug)]
pub enum TransportEvent {
    /// The relay confirmed the subscription; queued sends can go out.
    Ready,

    /// A peer message that passed room and self-echo filtering.
    Message(SignalEnvelope),
}
