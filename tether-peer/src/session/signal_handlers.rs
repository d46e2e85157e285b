use crate::ice::apply_candidates;
use crate::media::RemoteStream;
use crate::session::session::Session;
use crate::session::timers::TimerKind;
use crate::signaling::TransportEvent;
use anyhow::Context;
use tether_core::{IceCandidate, Role, SessionDescription, SignalPayload};
use tracing::{debug, error, info, warn};

impl Session {
    pub(super) async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Ready => {
                if let Some(transport) = self.transport.as_mut() {
                    transport.mark_ready().await;
                }
            }

            TransportEvent::Message(envelope) => {
                debug!(
                    from = %envelope.sender_id,
                    kind = envelope.signal.kind(),
                    "Signal received"
                );
                self.handle_signal(envelope.signal).await;
            }
        }
    }

    async fn handle_signal(&mut self, signal: SignalPayload) {
        match (self.role, signal) {
            (Role::Viewer, SignalPayload::Offer { sdp }) => self.on_offer(sdp).await,
            (Role::Host, SignalPayload::Answer { sdp }) => self.on_answer(sdp).await,
            (_, SignalPayload::IceCandidate(candidate)) => self.on_remote_candidate(candidate).await,
            (Role::Host, SignalPayload::RequestOffer) => self.on_request_offer().await,
            (Role::Viewer, SignalPayload::SessionEnded) => self.on_session_ended(),
            (role, signal) => {
                debug!(%role, kind = signal.kind(), "Ignoring signal meant for the other role");
            }
        }
    }

    async fn on_offer(&mut self, sdp: String) {
        if self.remote_offer.as_deref() == Some(sdp.as_str()) {
            debug!(epoch = self.epoch, "Offer already applied, ignoring duplicate");
            return;
        }

        if self.observed.ended_by_host {
            info!(room = %self.room, "Offer from a new host session, rebuilding connection");
            if let Err(e) = self.rebuild_connection().await {
                error!(room = %self.room, "Failed to rebuild connection: {}", e);
                return;
            }
        }

        if let Err(e) = self.accept_offer(sdp.clone()).await {
            warn!(epoch = self.epoch, "Failed to apply offer: {:?}", e);
            return;
        }
        self.remote_offer = Some(sdp);

        if !self.offer_applied {
            self.offer_applied = true;
            self.timers.cancel(TimerKind::RequestOffer);
        }
        self.refresh_state();
    }

    async fn accept_offer(&mut self, sdp: String) -> anyhow::Result<()> {
        let connection = self
            .connection
            .as_deref()
            .context("no active connection")?;

        connection
            .set_remote_description(SessionDescription::offer(sdp))
            .await?;
        self.remote_described = true;
        apply_candidates(connection, self.candidates.drain()).await;

        let answer = connection.create_answer().await?;
        connection
            .set_local_description(SessionDescription::answer(answer.clone()))
            .await?;

        info!(epoch = self.epoch, "Sending answer");
        self.signal(SignalPayload::Answer { sdp: answer }).await;
        Ok(())
    }

    /// Candidates of the new host session may already be buffered; they
    /// belong to the rebuilt connection.
    async fn rebuild_connection(&mut self) -> anyhow::Result<()> {
        let pending = self.candidates.drain();

        self.close_connection().await;
        self.open_connection().await?;
        for candidate in pending {
            self.candidates.buffer(candidate);
        }
        self.add_receive_only().await
    }

    async fn on_answer(&mut self, sdp: String) {
        if !self.awaiting_answer {
            debug!(epoch = self.epoch, "No offer outstanding, ignoring answer");
            return;
        }
        let Some(connection) = self.connection.as_deref() else {
            return;
        };

        if let Err(e) = connection
            .set_remote_description(SessionDescription::answer(sdp))
            .await
        {
            warn!(epoch = self.epoch, "Failed to apply answer: {:?}", e);
            return;
        }
        self.remote_described = true;
        self.awaiting_answer = false;
        apply_candidates(connection, self.candidates.drain()).await;
    }

    async fn on_remote_candidate(&mut self, candidate: IceCandidate) {
        self.candidates_received += 1;

        if !self.remote_described {
            self.candidates.buffer(candidate);
            debug!(buffered = self.candidates.len(), "No remote description yet, buffering candidate");
            return;
        }

        let Some(connection) = self.connection.as_deref() else {
            return;
        };
        if let Err(e) = connection.add_ice_candidate(candidate).await {
            warn!(epoch = self.epoch, "Failed to add ICE candidate: {:?}", e);
        }
    }

    async fn on_request_offer(&mut self) {
        if self.local_stream.is_none() {
            debug!("Offer requested but nothing is being shared");
            return;
        }

        if let Err(e) = self.send_offer(false).await {
            warn!(epoch = self.epoch, "Failed to re-send offer: {:?}", e);
        }
    }

    fn on_session_ended(&mut self) {
        info!(room = %self.room, "Host ended the session");

        if let Some(sink) = &self.sink {
            sink.clear();
        }
        self.remote_stream = RemoteStream::new();

        // Whatever arrives next belongs to the next host session.
        self.remote_described = false;
        self.remote_offer = None;
        self.candidates.clear();

        self.observed.ended_by_host = true;
        self.timers.cancel(TimerKind::IceGrace);
        self.timers.cancel(TimerKind::Recovery);
        self.refresh_state();
    }
}
