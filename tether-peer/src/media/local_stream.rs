use std::sync::Arc;
use tokio::sync::watch;
use webrtc::track::track_local::TrackLocal;

/// A captured stream on the host side: the tracks to send plus an "ended"
/// signal the capture layer fires when the user stops sharing.
pub struct LocalStream {
    id: String,
    tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
    ended: Arc<watch::Sender<bool>>,
}

impl LocalStream {
    pub fn new(id: impl Into<String>, tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>) -> Self {
        let (ended, _) = watch::channel(false);
        Self {
            id: id.into(),
            tracks,
            ended: Arc::new(ended),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[Arc<dyn TrackLocal + Send + Sync>] {
        &self.tracks
    }

    /// Handle for the capture layer to report that the source went away.
    pub fn ender(&self) -> StreamEnder {
        StreamEnder {
            ended: self.ended.clone(),
        }
    }

    pub fn is_ended(&self) -> bool {
        *self.ended.borrow()
    }

    pub(crate) fn watch_ended(&self) -> watch::Receiver<bool> {
        self.ended.subscribe()
    }
}

/// Fires the owning stream's "ended" notification.
#[derive(Clone)]
pub struct StreamEnder {
    ended: Arc<watch::Sender<bool>>,
}

impl StreamEnder {
    pub fn end(&self) {
        self.ended.send_replace(true);
    }
}
