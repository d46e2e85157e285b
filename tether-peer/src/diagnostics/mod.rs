//! Advisory connection health checks. Nothing here drives recovery.

use std::fmt;

/// Candidate counts pulled from the peer connection's stats report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub local_candidates: usize,
    pub remote_candidates: usize,
    pub candidate_pairs: usize,
    pub succeeded_pairs: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticWarning {
    /// Nothing was gathered locally: network or firewall trouble on this side.
    NoLocalCandidates,
    /// A remote description exists but the peer sent no candidates.
    NoRemoteCandidates,
    /// Pairs were formed and none succeeded; a TURN relay is probably needed.
    NoSucceededPairs,
}

impl fmt::Display for DiagnosticWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticWarning::NoLocalCandidates => {
                "no local ICE candidates gathered, check network/firewall"
            }
            DiagnosticWarning::NoRemoteCandidates => {
                "remote description applied but no remote candidates, check the peer's network"
            }
            DiagnosticWarning::NoSucceededPairs => {
                "candidate pairs formed but none succeeded, a TURN relay may be required"
            }
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub snapshot: StatsSnapshot,
    pub warnings: Vec<DiagnosticWarning>,
}

pub fn diagnose(snapshot: &StatsSnapshot, has_remote_description: bool) -> Vec<DiagnosticWarning> {
    let mut warnings = Vec::new();

    if snapshot.local_candidates == 0 {
        warnings.push(DiagnosticWarning::NoLocalCandidates);
    }
    if has_remote_description && snapshot.remote_candidates == 0 {
        warnings.push(DiagnosticWarning::NoRemoteCandidates);
    }
    if snapshot.candidate_pairs > 0 && snapshot.succeeded_pairs == 0 {
        warnings.push(DiagnosticWarning::NoSucceededPairs);
    }

    warnings
}
