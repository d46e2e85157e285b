use crate::media::RemoteTrack;
use tether_core::{IceCandidate, IcePathState, PeerState, SignalingPhase};

/// Events a peer connection raises for its owning session.
pub enum ConnectionEvent {
    /// A local candidate was gathered and should go to the other party.
    LocalCandidate(IceCandidate),

    /// Candidate gathering finished. Nothing needs to be sent.
    GatheringComplete,

    PeerStateChanged(PeerState),

    IceStateChanged(IcePathState),

    SignalingStateChanged(SignalingPhase),

    /// The remote side started sending a track.
    RemoteTrack(RemoteTrack),
}
