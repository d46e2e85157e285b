use crate::diagnostics::{DiagnosticReport, diagnose};
use crate::error::{PeerError, PeerResult};
use crate::session::session::Session;
use crate::session::timers::TimerKind;
use anyhow::Context;
use tracing::{debug, info, warn};

impl Session {
    pub(super) fn arm_diagnostics(&mut self) {
        self.timers
            .every(TimerKind::DiagnosticsDetail, self.config.diagnostics_interval);
        self.timers
            .every(TimerKind::DiagnosticsStats, self.config.stats_interval);
    }

    pub(super) fn log_detail(&self) {
        info!(
            room = %self.room,
            role = %self.role,
            epoch = self.epoch,
            state = %self.observed.derive(),
            peer = ?self.observed.peer,
            ice = ?self.observed.ice,
            signaling = ?self.observed.signaling,
            candidates_sent = self.candidates_sent,
            candidates_received = self.candidates_received,
            buffered = self.candidates.len(),
            "Connection detail"
        );
    }

    pub(super) async fn check_stats(&self) {
        match self.report().await {
            Ok(report) => {
                debug!(epoch = self.epoch, snapshot = ?report.snapshot, "Connection stats");
                for warning in &report.warnings {
                    warn!(room = %self.room, epoch = self.epoch, "{}", warning);
                }
            }
            Err(e) => debug!(epoch = self.epoch, "Stats unavailable: {:?}", e),
        }
    }

    pub(super) async fn diagnose_now(&self) -> PeerResult<DiagnosticReport> {
        if self.connection.is_none() {
            return Err(PeerError::NotActive);
        }
        self.report().await.map_err(PeerError::Connection)
    }

    async fn report(&self) -> anyhow::Result<DiagnosticReport> {
        let connection = self
            .connection
            .as_deref()
            .context("no active connection")?;

        let snapshot = connection.stats().await?;
        let warnings = diagnose(&snapshot, self.remote_described);
        Ok(DiagnosticReport { snapshot, warnings })
    }
}
