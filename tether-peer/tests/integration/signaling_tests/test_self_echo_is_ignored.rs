use std::sync::Arc;

use tether_core::{ConnectionState, IceCandidate, Role, RoomId, SignalPayload};

use crate::integration::{init_tracing, spawn_manager};
use crate::utils::{FakeConnector, MockRelay, RecordingSink, TestSource, settle};

fn every_signal() -> Vec<SignalPayload> {
    vec![
        SignalPayload::Offer {
            sdp: "v=0 echo".into(),
        },
        SignalPayload::Answer {
            sdp: "v=0 echo".into(),
        },
        SignalPayload::IceCandidate(IceCandidate::new("candidate:echo")),
        SignalPayload::RequestOffer,
        SignalPayload::SessionEnded,
    ]
}

#[tokio::test]
async fn test_self_echo_is_ignored() {
    init_tracing();

    let room = RoomId::new();

    // Host
    let (host_relay, _rx) = MockRelay::new();
    let host_connector = FakeConnector::new();
    let host = spawn_manager(Role::Host, &room, Arc::new(host_relay.clone()), &host_connector);
    host.start_sharing(Arc::new(TestSource::new()))
        .await
        .expect("start_sharing failed");
    settle().await;
    let published_before = host_relay.published().len();

    for signal in every_signal() {
        host_relay.deliver_from(&room, host.sender_id(), signal);
    }
    settle().await;

    let log = host_connector.latest().log();
    assert!(log.remote.is_empty(), "Host applied its own description");
    assert!(log.attempted_candidates.is_empty(), "Host applied its own candidate");
    assert_eq!(log.offers.len(), 1, "Host answered its own offer request");
    assert_eq!(host_relay.published().len(), published_before);

    // Viewer
    let (viewer_relay, _rx) = MockRelay::new();
    let viewer_connector = FakeConnector::new();
    let viewer = spawn_manager(
        Role::Viewer,
        &room,
        Arc::new(viewer_relay.clone()),
        &viewer_connector,
    );
    let sink = Arc::new(RecordingSink::new());
    viewer
        .join_as_viewer(sink.clone())
        .await
        .expect("join_as_viewer failed");
    settle().await;

    for signal in every_signal() {
        viewer_relay.deliver_from(&room, viewer.sender_id(), signal);
    }
    settle().await;

    let log = viewer_connector.latest().log();
    assert!(log.remote.is_empty(), "Viewer applied its own offer");
    assert_eq!(log.answers, 0);
    assert_eq!(sink.clear_count(), 0, "Viewer obeyed its own SessionEnded");
    assert_ne!(viewer.state(), ConnectionState::Disconnected);
    assert_eq!(viewer_relay.count("answer"), 0);

    host.cleanup().await.expect("cleanup failed");
    viewer.cleanup().await.expect("cleanup failed");
}
