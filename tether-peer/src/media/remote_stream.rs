use crate::media::MediaKind;
use std::sync::Arc;
use webrtc::track::track_remote::TrackRemote;

/// One track received from the host.
#[derive(Clone)]
pub struct RemoteTrack {
    pub id: String,
    pub stream_id: String,
    pub kind: MediaKind,
    /// The underlying webrtc track. `None` for tracks not backed by a real
    /// peer connection.
    pub handle: Option<Arc<TrackRemote>>,
}

impl RemoteTrack {
    pub fn detached(id: impl Into<String>, stream_id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            stream_id: stream_id.into(),
            kind,
            handle: None,
        }
    }
}

/// The tracks received so far, grouped the way the viewer renders them.
#[derive(Clone, Default)]
pub struct RemoteStream {
    tracks: Vec<RemoteTrack>,
}

impl RemoteStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a track, replacing an earlier one with the same id.
    pub fn add_track(&mut self, track: RemoteTrack) {
        self.tracks.retain(|t| t.id != track.id);
        self.tracks.push(track);
    }

    pub fn tracks(&self) -> &[RemoteTrack] {
        &self.tracks
    }

    pub fn has(&self, kind: MediaKind) -> bool {
        self.tracks.iter().any(|t| t.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
