use crate::config::PeerConfig;
use crate::connection::{ConnectionEvent, Connector, PeerConnection};
use crate::error::{PeerError, PeerResult};
use crate::ice::CandidateBuffer;
use crate::media::{LocalStream, MediaKind, MediaSink, MediaSource, RemoteStream};
use crate::session::recovery::ResilienceController;
use crate::session::session_command::{SessionCommand, StateListener};
use crate::session::timers::{TimerKind, Timers, Wakeup};
use crate::signaling::{SignalingRelay, SignalingTransport, TransportEvent};
use anyhow::Context;
use std::sync::Arc;
use tether_core::{
    ConnectionState, Observed, Role, RoomId, SenderId, SessionDescription, SignalPayload,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// The single task that owns everything belonging to one peer manager.
///
/// Public operations, connection callbacks, inbound signals and timers all
/// arrive as messages, so session state is only ever touched from [`Session::run`].
pub(crate) struct Session {
    pub(super) role: Role,
    pub(super) room: RoomId,
    pub(super) sender_id: SenderId,
    pub(super) config: PeerConfig,
    relay: Arc<dyn SignalingRelay>,
    connector: Arc<dyn Connector>,

    command_rx: mpsc::Receiver<SessionCommand>,
    wakeup_rx: mpsc::UnboundedReceiver<Wakeup>,
    pub(super) timers: Timers,

    /// Bumped for every connection built.
    pub(super) epoch: u64,
    pub(super) connection: Option<Box<dyn PeerConnection>>,
    connection_rx: Option<mpsc::UnboundedReceiver<ConnectionEvent>>,
    pub(super) transport: Option<SignalingTransport>,
    transport_rx: Option<mpsc::UnboundedReceiver<TransportEvent>>,

    pub(super) candidates: CandidateBuffer,
    pub(super) remote_described: bool,
    pub(super) offer_applied: bool,
    /// SDP of the last offer applied, so a relayed duplicate is not answered twice.
    pub(super) remote_offer: Option<String>,
    /// An offer went out and no answer has been applied for it yet.
    pub(super) awaiting_answer: bool,
    pub(super) candidates_sent: usize,
    pub(super) candidates_received: usize,

    pub(super) local_stream: Option<LocalStream>,
    pub(super) sink: Option<Arc<dyn MediaSink>>,
    pub(super) remote_stream: RemoteStream,

    pub(super) resilience: ResilienceController,
    pub(super) observed: Observed,
    state_tx: watch::Sender<ConnectionState>,
    listeners: Vec<StateListener>,
    closed: bool,
}

impl Session {
    pub fn new(
        role: Role,
        room: RoomId,
        sender_id: SenderId,
        config: PeerConfig,
        relay: Arc<dyn SignalingRelay>,
        connector: Arc<dyn Connector>,
    ) -> (
        Self,
        mpsc::Sender<SessionCommand>,
        watch::Receiver<ConnectionState>,
    ) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (wakeup_tx, wakeup_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);

        let session = Self {
            role,
            room,
            sender_id,
            resilience: ResilienceController::new(config.retry),
            config,
            relay,
            connector,
            command_rx,
            wakeup_rx,
            timers: Timers::new(wakeup_tx),
            epoch: 0,
            connection: None,
            connection_rx: None,
            transport: None,
            transport_rx: None,
            candidates: CandidateBuffer::new(),
            remote_described: false,
            offer_applied: false,
            remote_offer: None,
            awaiting_answer: false,
            candidates_sent: 0,
            candidates_received: 0,
            local_stream: None,
            sink: None,
            remote_stream: RemoteStream::new(),
            observed: Observed::default(),
            state_tx,
            listeners: Vec::new(),
            closed: false,
        };
        (session, command_tx, state_rx)
    }

    pub async fn run(mut self) {
        info!(room = %self.room, role = %self.role, "Session event loop started");

        while !self.closed {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All manager handles dropped. Shutting down session.");
                            self.cleanup().await;
                        }
                    }
                }

                evt = recv_opt(&mut self.connection_rx) => {
                    match evt {
                        Some(e) => self.handle_connection_event(e).await,
                        None => self.connection_rx = None,
                    }
                }

                evt = recv_opt(&mut self.transport_rx) => {
                    match evt {
                        Some(e) => self.handle_transport_event(e).await,
                        None => {
                            warn!("Relay subscription ended unexpectedly");
                            self.transport_rx = None;
                        }
                    }
                }

                Some(wakeup) = self.wakeup_rx.recv() => self.handle_wakeup(wakeup).await,
            }
        }

        info!(room = %self.room, role = %self.role, "Session event loop finished");
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::StartSharing { source, reply } => {
                let _ = reply.send(self.start_sharing(source).await);
            }

            SessionCommand::Join { sink, reply } => {
                let _ = reply.send(self.join(sink).await);
            }

            SessionCommand::Reset { sink, reply } => {
                let _ = reply.send(self.reset_and_reconnect(sink).await);
            }

            SessionCommand::StopSharing { reply } => {
                let res = if self.connection.is_some() {
                    self.end_sharing().await;
                    Ok(())
                } else {
                    Err(PeerError::NotActive)
                };
                let _ = reply.send(res);
            }

            SessionCommand::Cleanup { reply } => {
                self.cleanup().await;
                let _ = reply.send(Ok(()));
            }

            SessionCommand::Subscribe { listener, reply } => {
                self.listeners.push(listener);
                let _ = reply.send(Ok(()));
            }

            SessionCommand::Diagnose { reply } => {
                let _ = reply.send(self.diagnose_now().await);
            }
        }
    }

    async fn handle_wakeup(&mut self, wakeup: Wakeup) {
        if !self.timers.accept(&wakeup) {
            debug!(kind = ?wakeup.kind, "Dropping stale wakeup");
            return;
        }

        match wakeup.kind {
            TimerKind::RequestOffer => {
                if self.offer_applied {
                    self.timers.cancel(TimerKind::RequestOffer);
                } else {
                    debug!(epoch = self.epoch, "No offer yet, requesting again");
                    self.signal(SignalPayload::RequestOffer).await;
                }
            }
            TimerKind::IceGrace => self.on_ice_grace_expired(),
            TimerKind::Recovery => self.run_recovery().await,
            TimerKind::DiagnosticsDetail => self.log_detail(),
            TimerKind::DiagnosticsStats => self.check_stats().await,
            TimerKind::SourceEnded => {
                if self.local_stream.as_ref().is_some_and(LocalStream::is_ended) {
                    info!(room = %self.room, "Local media source ended");
                    self.end_sharing().await;
                }
            }
        }
    }

    async fn start_sharing(&mut self, source: Arc<dyn MediaSource>) -> PeerResult<()> {
        if self.connection.is_some() {
            return Err(PeerError::AlreadyActive);
        }

        let stream = source.acquire().await.map_err(PeerError::Media)?;
        info!(room = %self.room, stream = stream.id(), "Local media acquired");

        self.open_link().await?;

        let attached = match self.connection.as_deref() {
            Some(connection) => connection.attach_local_stream(&stream).await,
            None => Err(anyhow::anyhow!("connection vanished during setup")),
        };
        if let Err(e) = attached {
            self.abandon_link().await;
            return Err(PeerError::Connection(e));
        }

        let mut ended = stream.watch_ended();
        self.timers.watch(TimerKind::SourceEnded, async move {
            let _ = ended.wait_for(|ended| *ended).await;
        });
        self.local_stream = Some(stream);

        if let Err(e) = self.send_offer(false).await {
            self.abandon_link().await;
            return Err(PeerError::Connection(e));
        }
        Ok(())
    }

    async fn join(&mut self, sink: Arc<dyn MediaSink>) -> PeerResult<()> {
        if self.connection.is_some() {
            return Err(PeerError::AlreadyActive);
        }

        self.sink = Some(sink);
        self.start_viewing().await
    }

    async fn reset_and_reconnect(&mut self, sink: Option<Arc<dyn MediaSink>>) -> PeerResult<()> {
        if let Some(sink) = sink {
            self.sink = Some(sink);
        }
        if self.sink.is_none() {
            return Err(PeerError::NotActive);
        }

        info!(room = %self.room, epoch = self.epoch, "Resetting connection from scratch");
        self.release_link().await;
        self.start_viewing().await
    }

    async fn start_viewing(&mut self) -> PeerResult<()> {
        self.open_link().await?;

        if let Err(e) = self.add_receive_only().await {
            self.abandon_link().await;
            return Err(PeerError::Connection(e));
        }

        if let Some(sink) = &self.sink {
            if !self.remote_stream.is_empty() {
                sink.attach(&self.remote_stream);
            }
        }

        self.signal(SignalPayload::RequestOffer).await;
        self.timers
            .every(TimerKind::RequestOffer, self.config.request_offer_interval);
        Ok(())
    }

    /// Broadcasts the end of the share and tears everything down.
    pub(super) async fn end_sharing(&mut self) {
        info!(room = %self.room, "Ending share");

        self.signal(SignalPayload::SessionEnded).await;
        if let Some(transport) = self.transport.as_mut() {
            transport
                .flush(self.transport_rx.as_mut(), self.config.flush_timeout)
                .await;
        }
        self.release_link().await;
        self.local_stream = None;

        self.observed.closed = true;
        self.refresh_state();
    }

    async fn cleanup(&mut self) {
        self.release_link().await;

        if let Some(sink) = self.sink.take() {
            sink.clear();
        }
        self.local_stream = None;
        self.remote_stream = RemoteStream::new();

        self.observed.closed = true;
        self.refresh_state();
        self.closed = true;

        info!(room = %self.room, role = %self.role, "Session cleaned up");
    }

    /// Creates an offer, applies it locally and sends it.
    pub(super) async fn send_offer(&mut self, ice_restart: bool) -> anyhow::Result<()> {
        let connection = self
            .connection
            .as_deref()
            .context("no active connection")?;

        let sdp = connection.create_offer(ice_restart).await?;
        connection
            .set_local_description(SessionDescription::offer(sdp.clone()))
            .await?;

        info!(epoch = self.epoch, ice_restart, "Sending offer");
        self.awaiting_answer = true;
        self.signal(SignalPayload::Offer { sdp }).await;
        Ok(())
    }

    pub(super) async fn signal(&mut self, payload: SignalPayload) {
        match self.transport.as_mut() {
            Some(transport) => transport.send(payload).await,
            None => debug!(kind = payload.kind(), "No transport, dropping signal"),
        }
    }

    pub(super) async fn add_receive_only(&self) -> anyhow::Result<()> {
        let connection = self
            .connection
            .as_deref()
            .context("no active connection")?;

        connection.add_receive_only(MediaKind::Video).await?;
        connection.add_receive_only(MediaKind::Audio).await?;
        Ok(())
    }

    /// Builds a fresh connection and signaling transport.
    async fn open_link(&mut self) -> PeerResult<()> {
        self.open_connection().await?;

        match SignalingTransport::open(self.room.clone(), self.sender_id, self.relay.clone()).await
        {
            Ok((transport, events)) => {
                self.transport = Some(transport);
                self.transport_rx = Some(events);
            }
            Err(e) => {
                self.close_connection().await;
                self.observed = Observed::default();
                return Err(e.into());
            }
        }

        self.resilience.reset();
        self.arm_diagnostics();
        self.refresh_state();
        Ok(())
    }

    /// Replaces only the peer connection. The signaling transport is kept.
    pub(super) async fn open_connection(&mut self) -> PeerResult<()> {
        self.epoch += 1;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let connection = self
            .connector
            .connect(&self.config, event_tx)
            .await
            .map_err(PeerError::Connection)?;

        self.connection = Some(connection);
        self.connection_rx = Some(event_rx);

        self.candidates.clear();
        self.remote_described = false;
        self.offer_applied = false;
        self.remote_offer = None;
        self.awaiting_answer = false;
        self.candidates_sent = 0;
        self.candidates_received = 0;
        self.observed = Observed {
            started: true,
            ..Default::default()
        };

        info!(room = %self.room, role = %self.role, epoch = self.epoch, "Peer connection built");
        Ok(())
    }

    pub(super) async fn close_connection(&mut self) {
        self.connection_rx = None;

        if let Some(connection) = self.connection.take() {
            if let Err(e) = connection.close().await {
                warn!(epoch = self.epoch, "Failed to close peer connection: {:?}", e);
            }
            debug!(epoch = self.epoch, "Peer connection released");
        }

        self.candidates.clear();
        self.remote_described = false;
    }

    /// Cancels every timer and drops the connection and transport.
    pub(super) async fn release_link(&mut self) {
        self.timers.cancel_all();

        self.transport_rx = None;
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }

        self.close_connection().await;
    }

    /// Teardown after a failed setup: back to idle, nothing retained.
    async fn abandon_link(&mut self) {
        self.release_link().await;
        self.local_stream = None;
        self.observed = Observed::default();
        self.refresh_state();
    }

    /// Re-derives the public state and notifies on change.
    pub(super) fn refresh_state(&mut self) {
        let state = self.observed.derive();
        if state == ConnectionState::Connected {
            self.resilience.reset();
        }

        if *self.state_tx.borrow() == state {
            return;
        }

        info!(room = %self.room, role = %self.role, epoch = self.epoch, %state, "Connection state changed");
        self.state_tx.send_replace(state);
        for listener in &self.listeners {
            listener(state);
        }
    }
}

async fn recv_opt<T>(rx: &mut Option<mpsc::UnboundedReceiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
