use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tether_peer::{LocalStream, MediaSink, MediaSource, RemoteStream, StreamEnder};

/// Media source producing track-less streams, or failing on demand.
#[derive(Default)]
pub struct TestSource {
    fail: bool,
    enders: Mutex<Vec<StreamEnder>>,
    acquired: AtomicUsize,
}

impl TestSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Simulates the user stopping the capture.
    pub fn end_all(&self) {
        for ender in self.enders.lock().unwrap().iter() {
            ender.end();
        }
    }
}

#[async_trait]
impl MediaSource for TestSource {
    async fn acquire(&self) -> anyhow::Result<LocalStream> {
        if self.fail {
            anyhow::bail!("permission denied by user");
        }

        self.acquired.fetch_add(1, Ordering::SeqCst);
        let stream = LocalStream::new("screen", vec![]);
        self.enders.lock().unwrap().push(stream.ender());
        Ok(stream)
    }
}

/// Sink that remembers what it was asked to render.
#[derive(Default)]
pub struct RecordingSink {
    attached: Mutex<Vec<Vec<String>>>,
    clears: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach_count(&self) -> usize {
        self.attached.lock().unwrap().len()
    }

    /// Track ids of the most recent attach.
    pub fn last_tracks(&self) -> Vec<String> {
        self.attached
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl MediaSink for RecordingSink {
    fn attach(&self, stream: &RemoteStream) {
        let ids = stream.tracks().iter().map(|t| t.id.clone()).collect();
        self.attached.lock().unwrap().push(ids);
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}
