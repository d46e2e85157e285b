mod local_stream;
mod media_source;
mod remote_stream;

pub use local_stream::*;
pub use media_source::*;
pub use remote_stream::*;

/// The two media kinds a screen share negotiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}
