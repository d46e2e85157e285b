use crate::config::RetryPolicy;
use crate::session::session::Session;
use crate::session::timers::TimerKind;
use std::time::Duration;
use tether_core::{IcePathState, PeerState, Role, SignalPayload};
use tracing::{debug, error, info, warn};

/// What asked for recovery. Decides the minimum delay before acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecoveryTrigger {
    /// Aggregate peer state went `Failed` or `Disconnected`.
    PeerState,
    IceFailed,
    IceGraceExpired,
    /// Re-check after an attempt that did not restore the connection.
    FollowUp,
}

/// Counts recovery attempts since the last time the connection was healthy.
#[derive(Debug)]
pub(crate) struct ResilienceController {
    policy: RetryPolicy,
    attempts: u32,
}

impl ResilienceController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn exhausted(&self) -> bool {
        self.attempts >= self.policy.max_attempts
    }

    /// Delay before the next attempt (or the final health check once the
    /// budget is spent). Never shorter than `floor`.
    pub fn delay(&self, floor: Duration) -> Duration {
        self.policy
            .backoff(self.attempts)
            .unwrap_or(Duration::ZERO)
            .max(floor)
    }

    pub fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

impl Session {
    /// Arms the recovery timer unless one is already pending.
    pub(super) fn schedule_recovery(&mut self, trigger: RecoveryTrigger) {
        if self.connection.is_none() || self.observed.ended_by_host {
            return;
        }
        if self.timers.is_armed(TimerKind::Recovery) {
            debug!(?trigger, "Recovery already pending");
            return;
        }

        let floor = match trigger {
            RecoveryTrigger::PeerState | RecoveryTrigger::FollowUp => self.config.recovery_delay,
            RecoveryTrigger::IceFailed | RecoveryTrigger::IceGraceExpired => Duration::ZERO,
        };
        let delay = self.resilience.delay(floor);

        debug!(?trigger, ?delay, attempts = self.resilience.attempts(), "Recovery scheduled");
        self.timers.once(TimerKind::Recovery, delay);
    }

    pub(super) async fn run_recovery(&mut self) {
        let state = self.observed.derive();
        if !state.is_unhealthy() {
            debug!(%state, "Connection recovered on its own, skipping recovery");
            return;
        }
        if self.connection.is_none() || self.observed.ended_by_host {
            return;
        }

        if self.resilience.exhausted() {
            self.give_up().await;
            return;
        }

        self.resilience.record_attempt();
        info!(
            room = %self.room,
            role = %self.role,
            epoch = self.epoch,
            attempt = self.resilience.attempts(),
            %state,
            "Attempting recovery"
        );

        match self.role {
            Role::Host => {
                if let Err(e) = self.send_offer(true).await {
                    warn!(epoch = self.epoch, "ICE restart offer failed: {:?}", e);
                }
            }
            Role::Viewer => self.signal(SignalPayload::RequestOffer).await,
        }

        self.schedule_recovery(RecoveryTrigger::FollowUp);
    }

    pub(super) fn on_ice_grace_expired(&mut self) {
        if self.observed.ice != IcePathState::Disconnected {
            return;
        }

        warn!(
            epoch = self.epoch,
            grace = ?self.config.ice_grace_period,
            "ICE still disconnected after grace period"
        );
        self.observed.escalated = true;
        self.refresh_state();
        self.schedule_recovery(RecoveryTrigger::IceGraceExpired);
    }

    async fn give_up(&mut self) {
        error!(
            room = %self.room,
            role = %self.role,
            attempts = self.resilience.attempts(),
            "Recovery attempts exhausted, giving up"
        );

        self.release_link().await;
        self.local_stream = None;

        self.observed.peer = PeerState::Failed;
        self.refresh_state();
    }
}
