use std::sync::Arc;

use tether_core::{IceCandidate, Role, RoomId, SenderId, SignalPayload};

use crate::integration::{init_tracing, spawn_manager};
use crate::utils::{FakeConnector, MockRelay, RecordingSink, settle};

#[tokio::test]
async fn test_early_candidates_are_buffered() {
    init_tracing();

    let room = RoomId::new();
    let (relay, _rx) = MockRelay::new();
    let connector = FakeConnector::new().failing_candidate("candidate:2");
    let viewer = spawn_manager(Role::Viewer, &room, Arc::new(relay.clone()), &connector);

    viewer
        .join_as_viewer(Arc::new(RecordingSink::new()))
        .await
        .expect("join_as_viewer failed");
    settle().await;

    let host = SenderId::new();
    for i in 1..=3 {
        relay.deliver_from(
            &room,
            host,
            SignalPayload::IceCandidate(IceCandidate::new(format!("candidate:{i}"))),
        );
    }
    settle().await;
    assert!(
        connector.latest().log().attempted_candidates.is_empty(),
        "Candidates must wait for the remote description"
    );

    relay.deliver_from(
        &room,
        host,
        SignalPayload::Offer {
            sdp: "v=0 host offer".into(),
        },
    );
    settle().await;

    let log = connector.latest().log();
    assert_eq!(
        log.attempted_candidates,
        vec!["candidate:1", "candidate:2", "candidate:3"]
    );
    assert_eq!(log.applied_candidates, vec!["candidate:1", "candidate:3"]);
    assert_eq!(relay.count("answer"), 1, "A bad candidate must not block the answer");

    // With a remote description in place candidates apply on arrival.
    relay.deliver_from(
        &room,
        host,
        SignalPayload::IceCandidate(IceCandidate::new("candidate:4")),
    );
    settle().await;
    assert_eq!(
        connector.latest().log().applied_candidates,
        vec!["candidate:1", "candidate:3", "candidate:4"]
    );

    viewer.cleanup().await.expect("cleanup failed");
}
