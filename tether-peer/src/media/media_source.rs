use crate::media::{LocalStream, RemoteStream};
use async_trait::async_trait;

/// Capture side of the media collaborator. Only the host uses it.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> anyhow::Result<LocalStream>;
}

/// Render side of the media collaborator. Only the viewer uses it.
pub trait MediaSink: Send + Sync {
    /// Called with the full stream each time a track is added.
    fn attach(&self, stream: &RemoteStream);

    /// The stream went away; stop rendering it.
    fn clear(&self);
}
