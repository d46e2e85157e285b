use std::sync::{Arc, Mutex};
use std::time::Duration;
use tether_core::ConnectionState;
use tether_peer::PeerManager;

/// Every state a manager reported through its callback, in order.
#[derive(Clone, Default)]
pub struct StateLog {
    states: Arc<Mutex<Vec<ConnectionState>>>,
}

impl StateLog {
    pub async fn attach(manager: &PeerManager) -> Self {
        let log = Self::default();
        let states = log.states.clone();
        manager
            .on_connection_state_change(move |state| states.lock().unwrap().push(state))
            .await
            .expect("Failed to register state listener");
        log
    }

    pub fn states(&self) -> Vec<ConnectionState> {
        self.states.lock().unwrap().clone()
    }

    pub fn saw(&self, state: ConnectionState) -> bool {
        self.states().contains(&state)
    }
}

/// Waits until `manager` reports `target`, giving up after `secs` seconds.
pub async fn wait_for_state(manager: &PeerManager, target: ConnectionState, secs: u64) -> bool {
    let mut rx = manager.watch_state();
    let waited = tokio::time::timeout(Duration::from_secs(secs), rx.wait_for(|s| *s == target)).await;
    matches!(waited, Ok(Ok(_)))
}

/// Lets the session tasks drain whatever is already queued.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
