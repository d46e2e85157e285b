use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall state reported to callers. Always derived from [`Observed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Negotiating,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl ConnectionState {
    /// States that call for recovery when they persist.
    pub fn is_unhealthy(self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Failed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Negotiating => "negotiating",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
            ConnectionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Mirror of the peer connection's own aggregate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PeerState {
    #[default]
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Network-path (ICE) negotiation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IcePathState {
    #[default]
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

impl IcePathState {
    pub fn is_established(self) -> bool {
        matches!(self, IcePathState::Connected | IcePathState::Completed)
    }
}

/// Offer/answer exchange progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SignalingPhase {
    #[default]
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
    HaveLocalPranswer,
    HaveRemotePranswer,
    Closed,
}

/// Everything the session has observed about its current connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Observed {
    pub started: bool,
    pub closed: bool,
    pub peer: PeerState,
    pub ice: IcePathState,
    pub signaling: SignalingPhase,
    /// ICE stayed disconnected past the grace window.
    pub escalated: bool,
    /// The host announced the end of its session.
    pub ended_by_host: bool,
}

impl Observed {
    pub fn derive(&self) -> ConnectionState {
        if self.closed {
            return ConnectionState::Closed;
        }
        if !self.started {
            return ConnectionState::Idle;
        }
        if self.ended_by_host {
            return ConnectionState::Disconnected;
        }

        match (self.peer, self.ice) {
            (PeerState::Closed, _) => ConnectionState::Closed,
            (PeerState::Failed, _) | (_, IcePathState::Failed) => ConnectionState::Failed,
            (PeerState::Disconnected, _) | (_, IcePathState::Disconnected) => {
                if self.escalated {
                    ConnectionState::Failed
                } else {
                    ConnectionState::Disconnected
                }
            }
            (PeerState::Connected, _) => ConnectionState::Connected,
            (PeerState::Connecting, _) => ConnectionState::Negotiating,
            (PeerState::New, ice) => {
                if self.signaling != SignalingPhase::Stable || ice == IcePathState::Checking {
                    ConnectionState::Negotiating
                } else {
                    ConnectionState::Idle
                }
            }
        }
    }
}
