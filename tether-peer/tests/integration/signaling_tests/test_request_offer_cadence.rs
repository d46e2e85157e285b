use std::sync::Arc;
use std::time::Duration;

use tether_core::{Role, RoomId, SenderId, SignalPayload};

use crate::integration::{init_tracing, spawn_manager};
use crate::utils::{FakeConnector, MockRelay, RecordingSink, settle};

#[tokio::test(start_paused = true)]
async fn test_request_offer_cadence() {
    init_tracing();

    let room = RoomId::new();
    let (relay, _rx) = MockRelay::new();
    let connector = FakeConnector::new();
    let viewer = spawn_manager(Role::Viewer, &room, Arc::new(relay.clone()), &connector);

    viewer
        .join_as_viewer(Arc::new(RecordingSink::new()))
        .await
        .expect("join_as_viewer failed");
    settle().await;
    assert_eq!(relay.count("request_offer"), 1, "First request goes out on join");

    // Retries at 2 s, 4 s and 6 s.
    tokio::time::sleep(Duration::from_millis(6_500)).await;
    assert_eq!(relay.count("request_offer"), 4);

    relay.deliver_from(
        &room,
        SenderId::new(),
        SignalPayload::Offer {
            sdp: "v=0 host offer".into(),
        },
    );
    settle().await;
    assert_eq!(relay.count("answer"), 1);

    // Once an offer is applied the retry never comes back.
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(relay.count("request_offer"), 4);

    viewer.cleanup().await.expect("cleanup failed");
}
