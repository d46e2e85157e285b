pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod error;
pub mod ice;
pub mod media;
pub mod session;
pub mod signaling;

pub use config::{PeerConfig, RetryPolicy};
pub use connection::{ConnectionEvent, Connector, PeerConnection, RtcConnection, RtcConnector};
pub use diagnostics::{DiagnosticReport, DiagnosticWarning, StatsSnapshot};
pub use error::{PeerError, PeerResult, RelayError};
pub use media::{
    LocalStream, MediaKind, MediaSink, MediaSource, RemoteStream, RemoteTrack, StreamEnder,
};
pub use session::PeerManager;
pub use signaling::{LocalRelay, RelaySubscription, SignalingRelay, SignalingTransport};
