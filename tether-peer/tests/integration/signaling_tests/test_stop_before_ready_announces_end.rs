use std::sync::Arc;

use tether_core::{ConnectionState, Role, RoomId};

use crate::integration::{init_tracing, spawn_manager};
use crate::utils::{FakeConnector, MockRelay, TestSource, settle};

#[tokio::test(start_paused = true)]
async fn test_stop_before_ready_announces_end() {
    init_tracing();

    let room = RoomId::new();
    let (relay, _published_rx) = MockRelay::manual();
    let connector = FakeConnector::new();
    let host = spawn_manager(Role::Host, &room, Arc::new(relay.clone()), &connector);

    host.start_sharing(Arc::new(TestSource::new()))
        .await
        .expect("start_sharing failed");

    let stopping = {
        let host = host.clone();
        tokio::spawn(async move { host.stop_sharing().await })
    };
    settle().await;
    assert!(
        relay.published().is_empty(),
        "Nothing may be published before the subscription is confirmed"
    );

    relay.confirm();
    stopping
        .await
        .expect("stop task panicked")
        .expect("stop_sharing failed");

    assert_eq!(relay.published_kinds(), vec!["offer", "session_ended"]);
    assert_eq!(host.state(), ConnectionState::Closed);
    assert!(connector.latest().is_closed());

    host.cleanup().await.expect("cleanup failed");
}
