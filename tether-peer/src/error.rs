use tether_core::Role;
use thiserror::Error;

/// Failures of the signaling relay collaborator.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay is closed")]
    Closed,
    #[error("failed to subscribe: {0}")]
    Subscribe(String),
    #[error("failed to publish: {0}")]
    Publish(String),
}

/// Errors returned by [`PeerManager`](crate::PeerManager) operations.
///
/// Recovery actions fired by timers never surface here; their outcome is only
/// visible through connection-state callbacks.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("`{operation}` is not available to the {role} role")]
    WrongRole { operation: &'static str, role: Role },

    #[error("a session is already active")]
    AlreadyActive,

    #[error("no active session")]
    NotActive,

    #[error("peer manager has been cleaned up")]
    Closed,

    #[error("local media source unavailable: {0}")]
    Media(#[source] anyhow::Error),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("peer connection error: {0}")]
    Connection(#[source] anyhow::Error),
}

pub type PeerResult<T> = Result<T, PeerError>;
