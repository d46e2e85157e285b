
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

use tether_core::{RoomId, Role};
use tether_peer::{PeerConfig, PeerManager, RetryPolicy, SignalingRelay};

use crate::utils::FakeConnector;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Default timings with a small retry budget so give-up paths stay short.
pub fn test_config() -> PeerConfig {
    PeerConfig::default().with_retry(RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(4),
    })
}

pub fn spawn_manager(
    role: Role,
    room: &RoomId,
    relay: Arc<dyn SignalingRelay>,
    connector: &FakeConnector,
) -> PeerManager {
    PeerManager::spawn(
        role,
        room.clone(),
        test_config(),
        relay,
        Arc::new(connector.clone()),
    )
}
