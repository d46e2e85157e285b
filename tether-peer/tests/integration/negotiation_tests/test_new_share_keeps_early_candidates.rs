use std::sync::Arc;

use tether_core::{IceCandidate, Role, RoomId, SenderId, SignalPayload};

use crate::integration::{init_tracing, spawn_manager};
use crate::utils::{FakeConnector, MockRelay, RecordingSink, settle};

#[tokio::test]
async fn test_new_share_keeps_early_candidates() {
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

    let first_host = SenderId::new();
    relay.deliver_from(&room, first_host, SignalPayload::Offer { sdp: "o1".into() });
    relay.deliver_from(
        &room,
        first_host,
        SignalPayload::IceCandidate(IceCandidate::new("old:1")),
    );
    relay.deliver_from(&room, first_host, SignalPayload::SessionEnded);
    settle().await;

    // The next host session's candidates race ahead of its offer.
    let second_host = SenderId::new();
    for name in ["new:1", "new:2"] {
        relay.deliver_from(
            &room,
            second_host,
            SignalPayload::IceCandidate(IceCandidate::new(name)),
        );
    }
    settle().await;

    let old = connector.connection(0).log();
    assert_eq!(
        old.applied_candidates,
        vec!["old:1"],
        "Candidates of the new session must not reach the old connection"
    );

    relay.deliver_from(&room, second_host, SignalPayload::Offer { sdp: "o2".into() });
    settle().await;

    assert_eq!(connector.created(), 2);
    let latest = connector.latest().log();
    assert_eq!(latest.applied_candidates, vec!["new:1", "new:2"]);
    assert_eq!(latest.answers, 1);
    assert_eq!(relay.count("answer"), 2);

    viewer.cleanup().await.expect("cleanup failed");
}
