use std::collections::VecDeque;
use tether_core::IceCandidate;

/// Remote candidates that arrived before a remote description was accepted.
#[derive(Debug, Default)]
pub struct CandidateBuffer {
    pending: VecDeque<IceCandidate>,
}

impl CandidateBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&mut self, candidate: IceCandidate) {
        self.pending.push_back(candidate);
    }

    /// Everything buffered, in arrival order. The buffer is left empty.
    pub fn drain(&mut self) -> Vec<IceCandidate> {
        self.pending.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
