use std::sync::Arc;

use tether_core::{ConnectionState, Role, RoomId};
use tether_peer::LocalRelay;

use crate::integration::{init_tracing, spawn_manager};
use crate::utils::{FakeConnector, RecordingSink, TestSource, wait_for_state};

#[tokio::test(start_paused = true)]
async fn test_new_share_rebuilds_viewer() {
    init_tracing();

    let room = RoomId::new();
    let relay = LocalRelay::new();
    let host_connector = FakeConnector::new();
    let viewer_connector = FakeConnector::new();
    let host = spawn_manager(Role::Host, &room, Arc::new(relay.clone()), &host_connector);
    let viewer = spawn_manager(Role::Viewer, &room, Arc::new(relay.clone()), &viewer_connector);

    let source = Arc::new(TestSource::new());
    host.start_sharing(source.clone())
        .await
        .expect("start_sharing failed");
    viewer
        .join_as_viewer(Arc::new(RecordingSink::new()))
        .await
        .expect("join_as_viewer failed");
    assert!(wait_for_state(&viewer, ConnectionState::Connected, 10).await);

    host.stop_sharing().await.expect("stop_sharing failed");
    assert!(wait_for_state(&viewer, ConnectionState::Disconnected, 5).await);

    host.start_sharing(source.clone())
        .await
        .expect("second start_sharing failed");

    assert!(
        wait_for_state(&viewer, ConnectionState::Connected, 10).await,
        "Viewer did not pick up the new share"
    );
    assert!(wait_for_state(&host, ConnectionState::Connected, 10).await);
    assert_eq!(source.acquired(), 2);
    assert_eq!(viewer_connector.created(), 2, "Viewer should use a fresh connection");
    assert!(viewer_connector.connection(0).is_closed());
    assert!(!viewer_connector.latest().is_closed());

    host.cleanup().await.expect("cleanup failed");
    viewer.cleanup().await.expect("cleanup failed");
}
