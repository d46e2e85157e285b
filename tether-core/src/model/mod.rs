mod peer;
mod room;
mod signaling;
mod state;

pub use peer::{Role, SenderId};
pub use room::RoomId;
pub use signaling::{
    IceCandidate, IceServerConfig, SdpKind, SessionDescription, SignalEnvelope, SignalPayload,
};
pub use state::{ConnectionState, IcePathState, Observed, PeerState, SignalingPhase};
