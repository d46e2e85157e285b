use crate::connection::ConnectionEvent;
use crate::session::recovery::RecoveryTrigger;
use crate::session::session::Session;
use crate::session::timers::TimerKind;
use tether_core::{IcePathState, PeerState, SignalPayload};
use tracing::{debug, info};

impl Session {
    pub(super) async fn handle_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::LocalCandidate(candidate) => {
                self.candidates_sent += 1;
                self.signal(SignalPayload::IceCandidate(candidate)).await;
            }

            ConnectionEvent::GatheringComplete => {
                debug!(epoch = self.epoch, sent = self.candidates_sent, "ICE gathering complete");
            }

            ConnectionEvent::PeerStateChanged(state) => {
                debug!(epoch = self.epoch, ?state, "Peer connection state");
                self.observed.peer = state;
                self.refresh_state();

                if matches!(state, PeerState::Failed | PeerState::Disconnected) {
                    self.schedule_recovery(RecoveryTrigger::PeerState);
                }
            }

            ConnectionEvent::IceStateChanged(state) => {
                debug!(epoch = self.epoch, ?state, "ICE connection state");
                self.observed.ice = state;
                self.on_ice_state(state);
                self.refresh_state();
            }

            ConnectionEvent::SignalingStateChanged(phase) => {
                self.observed.signaling = phase;
                self.refresh_state();
            }

            ConnectionEvent::RemoteTrack(track) => {
                info!(
                    epoch = self.epoch,
                    track = %track.id,
                    kind = ?track.kind,
                    "Remote track received"
                );
                self.remote_stream.add_track(track);

                if let Some(sink) = &self.sink {
                    sink.attach(&self.remote_stream);
                }
            }
        }
    }

    fn on_ice_state(&mut self, state: IcePathState) {
        match state {
            IcePathState::Disconnected => {
                if !self.observed.ended_by_host && !self.timers.is_armed(TimerKind::IceGrace) {
                    self.timers.once(TimerKind::IceGrace, self.config.ice_grace_period);
                }
            }
            IcePathState::Failed => {
                self.timers.cancel(TimerKind::IceGrace);
                self.schedule_recovery(RecoveryTrigger::IceFailed);
            }
            s if s.is_established() => {
                self.timers.cancel(TimerKind::IceGrace);
                self.observed.escalated = false;
            }
            _ => {}
        }
    }
}
