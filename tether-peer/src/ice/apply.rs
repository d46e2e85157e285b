use crate::connection::PeerConnection;
use tether_core::IceCandidate;
use tracing::{debug, warn};

/// Applies candidates in order. A rejected candidate is logged and skipped;
/// the rest are still applied. Returns how many were accepted.
pub async fn apply_candidates(connection: &dyn PeerConnection, candidates: Vec<IceCandidate>) -> usize {
    let total = candidates.len();
    let mut applied = 0;

    for candidate in candidates {
        match connection.add_ice_candidate(candidate.clone()).await {
            Ok(()) => applied += 1,
            Err(e) => warn!("Skipping ICE candidate {:?}: {:?}", candidate.candidate, e),
        }
    }

    if total > 0 {
        debug!("Applied {}/{} ICE candidate(s)", applied, total);
    }
    applied
}
