use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use colored::*;
use std::sync::Arc;
use std::time::Duration;
use tether_core::{ConnectionState, IceServerConfig, RoomId};
use tether_peer::{
    Connector, LocalRelay, LocalStream, MediaSink, MediaSource, PeerConfig, PeerManager,
    RemoteStream, RtcConnector, SignalingRelay,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use webrtc::api::media_engine::MIME_TYPE_VP8;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Peer-to-peer screen share connection manager")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect a host and a viewer inside this process over an in-process relay.
    Loopback {
        /// Room to share in. A random one is used when omitted.
        #[arg(long)]
        room: Option<String>,

        /// How long to keep the share running.
        #[arg(short, long, default_value_t = 15)]
        seconds: u64,

        /// STUN/TURN server url, repeatable. Defaults to public STUN.
        #[arg(long = "stun")]
        stun: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Loopback {
            room,
            seconds,
            stun,
        } => run_loopback(room, seconds, stun).await,
    }
}

async fn run_loopback(room: Option<String>, seconds: u64, stun: Vec<String>) -> Result<()> {
    let room = room.map(RoomId::from).unwrap_or_default();

    let mut config = PeerConfig::default();
    if !stun.is_empty() {
        config = config.with_ice_servers(stun.into_iter().map(IceServerConfig::stun).collect());
    }

    let relay: Arc<dyn SignalingRelay> = Arc::new(LocalRelay::new());
    let connector: Arc<dyn Connector> = Arc::new(RtcConnector);

    let host = PeerManager::host(room.clone(), config.clone(), relay.clone(), connector.clone());
    let viewer = PeerManager::viewer(room.clone(), config, relay, connector);
    print_states("host", &host).await?;
    print_states("viewer", &viewer).await?;

    println!("{} room {}", "🚀 Loopback share in".green().bold(), room);

    host.start_sharing(Arc::new(SyntheticScreen))
        .await
        .context("Host failed to start sharing")?;
    viewer
        .join_as_viewer(Arc::new(ConsoleSink))
        .await
        .context("Viewer failed to join")?;

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
        _ = tokio::signal::ctrl_c() => println!("{}", "Interrupted".yellow()),
    }

    match viewer.diagnose().await {
        Ok(report) => {
            println!(
                "{} local={} remote={} pairs={} succeeded={}",
                "📊 Viewer stats:".cyan(),
                report.snapshot.local_candidates,
                report.snapshot.remote_candidates,
                report.snapshot.candidate_pairs,
                report.snapshot.succeeded_pairs
            );
            for warning in report.warnings {
                println!("   {} {}", "⚠".yellow(), warning);
            }
        }
        Err(e) => warn!("Diagnostics unavailable: {}", e),
    }

    host.stop_sharing().await.context("Host failed to stop")?;
    tokio::time::sleep(Duration::from_millis(500)).await;

    viewer.cleanup().await?;
    host.cleanup().await?;

    println!("{}", "✨ Loopback finished".green().bold());
    Ok(())
}

async fn print_states(label: &'static str, manager: &PeerManager) -> Result<()> {
    manager
        .on_connection_state_change(move |state| {
            println!("{:>8} {}", label.bold(), paint(state));
        })
        .await
        .context("Failed to subscribe to state changes")
}

fn paint(state: ConnectionState) -> ColoredString {
    let text = state.to_string();
    match state {
        ConnectionState::Connected => text.green(),
        ConnectionState::Negotiating => text.cyan(),
        ConnectionState::Disconnected => text.yellow(),
        ConnectionState::Failed => text.red().bold(),
        ConnectionState::Idle | ConnectionState::Closed => text.dimmed(),
    }
}

/// A VP8 track fed with filler frames; enough for the connection to carry media.
struct SyntheticScreen;

#[async_trait]
impl MediaSource for SyntheticScreen {
    async fn acquire(&self) -> Result<LocalStream> {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
            "screen-video".to_owned(),
            "tether-loopback".to_owned(),
        ));

        let writer = track.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(FRAME_INTERVAL);
            loop {
                ticker.tick().await;
                let sample = Sample {
                    data: Bytes::from_static(&[0x10, 0x02, 0x00, 0x9d, 0x01, 0x2a]),
                    duration: FRAME_INTERVAL,
                    ..Default::default()
                };
                if let Err(e) = writer.write_sample(&sample).await {
                    warn!("Synthetic frame writer stopped: {}", e);
                    break;
                }
            }
        });

        info!("Synthetic screen source ready");
        let tracks: Vec<Arc<dyn TrackLocal + Send + Sync>> = vec![track];
        Ok(LocalStream::new("tether-loopback", tracks))
    }
}

struct ConsoleSink;

impl MediaSink for ConsoleSink {
    fn attach(&self, stream: &RemoteStream) {
        for track in stream.tracks() {
            println!(
                "{:>8} {} {:?} track {} (stream {})",
                "viewer".bold(),
                "▶".green(),
                track.kind,
                track.id,
                track.stream_id
            );
        }
    }

    fn clear(&self) {
        println!("{:>8} {}", "viewer".bold(), "■ remote stream cleared".yellow());
    }
}
