use crate::diagnostics::DiagnosticReport;
use crate::error::PeerResult;
use crate::media::{MediaSink, MediaSource};
use std::sync::Arc;
use tether_core::ConnectionState;
use tokio::sync::oneshot;

pub type StateListener = Box<dyn Fn(ConnectionState) + Send + Sync>;

pub(crate) type Reply<T> = oneshot::Sender<PeerResult<T>>;

/// Requests from a [`PeerManager`](crate::PeerManager) handle to its session task.
pub(crate) enum SessionCommand {
    StartSharing {
        source: Arc<dyn MediaSource>,
        reply: Reply<()>,
    },

    Join {
        sink: Arc<dyn MediaSink>,
        reply: Reply<()>,
    },

    /// Full teardown and rebuild. `None` keeps the current sink.
    Reset {
        sink: Option<Arc<dyn MediaSink>>,
        reply: Reply<()>,
    },

    StopSharing {
        reply: Reply<()>,
    },

    Cleanup {
        reply: Reply<()>,
    },

    Subscribe {
        listener: StateListener,
        reply: Reply<()>,
    },

    Diagnose {
        reply: Reply<DiagnosticReport>,
    },
}
