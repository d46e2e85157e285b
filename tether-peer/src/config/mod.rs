mod peer_config;
mod retry_policy;

pub use peer_config::*;
pub use retry_policy::*;
