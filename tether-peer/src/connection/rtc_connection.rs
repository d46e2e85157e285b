use crate::config::PeerConfig;
use crate::connection::{ConnectionEvent, Connector, PeerConnection};
use crate::diagnostics::StatsSnapshot;
use crate::media::{LocalStream, MediaKind, RemoteTrack};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tether_core::{
    IceCandidate, IcePathState, PeerState, SdpKind, SessionDescription, SignalingPhase,
};
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice::candidate::CandidatePairState;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::RTCRtpTransceiverInit;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::stats::StatsReportType;
use webrtc::track::track_remote::TrackRemote;

/// Builds [`RtcConnection`]s backed by webrtc-rs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtcConnector;

#[async_trait]
impl Connector for RtcConnector {
    async fn connect(
        &self,
        config: &PeerConfig,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> Result<Box<dyn PeerConnection>> {
        let conn = RtcConnection::new(config, events).await?;
        Ok(Box::new(conn))
    }
}

pub struct RtcConnection {
    peer_connection: Arc<RTCPeerConnection>,
}

impl RtcConnection {
    /// Creates the peer connection and wires its callbacks into `event_tx`.
    pub async fn new(
        config: &PeerConfig,
        event_tx: mpsc::UnboundedSender<ConnectionEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection state changed: {}", s);
                    if let Some(state) = peer_state(s) {
                        let _ = tx.send(ConnectionEvent::PeerStateChanged(state));
                    }
                })
            },
        ));

        let ice_state_tx = event_tx.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                let tx = ice_state_tx.clone();
                Box::pin(async move {
                    debug!("ICE connection state changed: {}", s);
                    if let Some(state) = ice_state(s) {
                        let _ = tx.send(ConnectionEvent::IceStateChanged(state));
                    }
                })
            },
        ));

        let signaling_tx = event_tx.clone();
        peer_connection.on_signaling_state_change(Box::new(move |s: RTCSignalingState| {
            let tx = signaling_tx.clone();
            Box::pin(async move {
                if let Some(phase) = signaling_phase(s) {
                    let _ = tx.send(ConnectionEvent::SignalingStateChanged(phase));
                }
            })
        }));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else {
                    let _ = tx.send(ConnectionEvent::GatheringComplete);
                    return;
                };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx.send(ConnectionEvent::LocalCandidate(IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                }));
            })
        }));

        let track_tx = event_tx;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => MediaKind::Audio,
                        RTPCodecType::Video => MediaKind::Video,
                        _ => return,
                    };
                    info!("Remote {:?} track {} arrived", kind, track.id());
                    let _ = tx.send(ConnectionEvent::RemoteTrack(RemoteTrack {
                        id: track.id(),
                        stream_id: track.stream_id(),
                        kind,
                        handle: Some(track),
                    }));
                })
            },
        ));

        Ok(Self { peer_connection })
    }
}

#[async_trait]
impl PeerConnection for RtcConnection {
    async fn attach_local_stream(&self, stream: &LocalStream) -> Result<()> {
        for track in stream.tracks() {
            let sender = self
                .peer_connection
                .add_track(Arc::clone(track))
                .await
                .context("Failed to add local track")?;

            // RTCP has to be read for interceptors like NACK to work.
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1500];
                while sender.read(&mut buf).await.is_ok() {}
            });
        }
        debug!("Attached {} track(s) of stream {}", stream.tracks().len(), stream.id());
        Ok(())
    }

    async fn add_receive_only(&self, kind: MediaKind) -> Result<()> {
        let codec_type = match kind {
            MediaKind::Audio => RTPCodecType::Audio,
            MediaKind::Video => RTPCodecType::Video,
        };
        self.peer_connection
            .add_transceiver_from_kind(
                codec_type,
                Some(RTCRtpTransceiverInit {
                    direction: RTCRtpTransceiverDirection::Recvonly,
                    send_encodings: vec![],
                }),
            )
            .await
            .context("Failed to add receive-only transceiver")?;
        Ok(())
    }

    async fn create_offer(&self, ice_restart: bool) -> Result<String> {
        let offer = self
            .peer_connection
            .create_offer(Some(RTCOfferOptions {
                ice_restart,
                ..Default::default()
            }))
            .await?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(answer.sdp)
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(rtc_description(desc)?)
            .await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<StatsSnapshot> {
        let report = self.peer_connection.get_stats().await;
        let mut snapshot = StatsSnapshot::default();

        for stat in report.reports.values() {
            match stat {
                StatsReportType::LocalCandidate(_) => snapshot.local_candidates += 1,
                StatsReportType::RemoteCandidate(_) => snapshot.remote_candidates += 1,
                StatsReportType::CandidatePair(pair) => {
                    snapshot.candidate_pairs += 1;
                    if pair.state == CandidatePairState::Succeeded {
                        snapshot.succeeded_pairs += 1;
                    }
                }
                _ => {}
            }
        }
        Ok(snapshot)
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn rtc_description(desc: SessionDescription) -> Result<RTCSessionDescription> {
    let rtc = match desc.kind {
        SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
    };
    Ok(rtc)
}

fn peer_state(s: RTCPeerConnectionState) -> Option<PeerState> {
    match s {
        RTCPeerConnectionState::New => Some(PeerState::New),
        RTCPeerConnectionState::Connecting => Some(PeerState::Connecting),
        RTCPeerConnectionState::Connected => Some(PeerState::Connected),
        RTCPeerConnectionState::Disconnected => Some(PeerState::Disconnected),
        RTCPeerConnectionState::Failed => Some(PeerState::Failed),
        RTCPeerConnectionState::Closed => Some(PeerState::Closed),
        _ => None,
    }
}

fn ice_state(s: RTCIceConnectionState) -> Option<IcePathState> {
    match s {
        RTCIceConnectionState::New => Some(IcePathState::New),
        RTCIceConnectionState::Checking => Some(IcePathState::Checking),
        RTCIceConnectionState::Connected => Some(IcePathState::Connected),
        RTCIceConnectionState::Completed => Some(IcePathState::Completed),
        RTCIceConnectionState::Disconnected => Some(IcePathState::Disconnected),
        RTCIceConnectionState::Failed => Some(IcePathState::Failed),
        RTCIceConnectionState::Closed => Some(IcePathState::Closed),
        _ => None,
    }
}

fn signaling_phase(s: RTCSignalingState) -> Option<SignalingPhase> {
    match s {
        RTCSignalingState::Stable => Some(SignalingPhase::Stable),
        RTCSignalingState::HaveLocalOffer => Some(SignalingPhase::HaveLocalOffer),
        RTCSignalingState::HaveRemoteOffer => Some(SignalingPhase::HaveRemoteOffer),
        RTCSignalingState::HaveLocalPranswer => Some(SignalingPhase::HaveLocalPranswer),
        RTCSignalingState::HaveRemotePranswer => Some(SignalingPhase::HaveRemotePranswer),
        RTCSignalingState::Closed => Some(SignalingPhase::Closed),
        _ => None,
    }
}
