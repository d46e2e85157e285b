use std::sync::Arc;
use std::time::Duration;

use tether_core::{IceCandidate, Role, RoomId, SignalPayload};
use tether_peer::ConnectionEvent;

use crate::integration::{init_tracing, spawn_manager};
use crate::utils::{FakeConnector, MockRelay, TestSource, settle};

#[tokio::test(start_paused = true)]
async fn test_queued_signals_flush_in_order() {
    init_tracing();

    let room = RoomId::new();
    let (relay, _published_rx) = MockRelay::manual();
    let connector = FakeConnector::new();
    let host = spawn_manager(Role::Host, &room, Arc::new(relay.clone()), &connector);

    host.start_sharing(Arc::new(TestSource::new()))
        .await
        .expect("start_sharing failed");

    let conn = connector.latest();
    conn.emit(ConnectionEvent::LocalCandidate(IceCandidate::new("candidate:1")));
    conn.emit(ConnectionEvent::LocalCandidate(IceCandidate::new("candidate:2")));
    settle().await;

    assert!(
        relay.published().is_empty(),
        "Nothing may be published before the subscription is confirmed"
    );

    relay.confirm();
    settle().await;

    let published = relay.published();
    assert_eq!(
        relay.published_kinds(),
        vec!["offer", "ice_candidate", "ice_candidate"]
    );

    let candidates: Vec<_> = published
        .iter()
        .filter_map(|e| match &e.signal {
            SignalPayload::IceCandidate(c) => Some(c.candidate.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(candidates, vec!["candidate:1", "candidate:2"]);

    for envelope in &published {
        assert_eq!(envelope.room_id, room);
        assert_eq!(envelope.sender_id, host.sender_id());
    }

    // The queue is flushed once, never again.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(relay.published().len(), 3);

    host.cleanup().await.expect("cleanup failed");
}
