use crate::config::RetryPolicy;
use std::time::Duration;
use tether_core::IceServerConfig;
use tether_core::utils::default_ice_servers;

/// Configuration for one peer manager.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// STUN/TURN servers handed to the peer connection.
    pub ice_servers: Vec<IceServerConfig>,
    /// Cadence of the viewer's `RequestOffer` retry until an offer lands.
    pub request_offer_interval: Duration,
    /// How long ICE may sit in `Disconnected` before it counts as failed.
    pub ice_grace_period: Duration,
    /// Delay of the coarse recovery fired by peer-state `Failed`/`Disconnected`.
    pub recovery_delay: Duration,
    pub diagnostics_interval: Duration,
    pub stats_interval: Duration,
    /// How long a stopping host waits for the relay to confirm its
    /// subscription before publishing queued signals anyway.
    pub flush_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            ice_servers: default_ice_servers(),
            request_offer_interval: Duration::from_secs(2),
            ice_grace_period: Duration::from_secs(5),
            recovery_delay: Duration::from_secs(2),
            diagnostics_interval: Duration::from_secs(10),
            stats_interval: Duration::from_secs(30),
            flush_timeout: Duration::from_secs(2),
            retry: RetryPolicy::default(),
        }
    }
}

impl PeerConfig {
    pub fn with_ice_servers(mut self, ice_servers: Vec<IceServerConfig>) -> Self {
        self.ice_servers = ice_servers;
        self
    }

    pub fn with_request_offer_interval(mut self, interval: Duration) -> Self {
        self.request_offer_interval = interval;
        self
    }

    pub fn with_ice_grace_period(mut self, grace: Duration) -> Self {
        self.ice_grace_period = grace;
        self
    }

    pub fn with_recovery_delay(mut self, delay: Duration) -> Self {
        self.recovery_delay = delay;
        self
    }

    pub fn with_diagnostics(mut self, detail: Duration, stats: Duration) -> Self {
        self.diagnostics_interval = detail;
        self.stats_interval = stats;
        self
    }

    pub fn with_flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
