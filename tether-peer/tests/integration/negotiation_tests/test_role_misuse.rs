use std::sync::Arc;

use tether_core::{Role, RoomId};
use tether_peer::PeerError;

use crate::integration::{init_tracing, spawn_manager};
use crate::utils::{FakeConnector, MockRelay, RecordingSink, TestSource};

#[tokio::test]
async fn test_role_misuse() {
    init_tracing();

    let room = RoomId::new();
    let (relay, _rx) = MockRelay::new();
    let connector = FakeConnector::new();
    let host = spawn_manager(Role::Host, &room, Arc::new(relay.clone()), &connector);
    let viewer = spawn_manager(Role::Viewer, &room, Arc::new(relay.clone()), &connector);

    let err = viewer
        .start_sharing(Arc::new(TestSource::new()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PeerError::WrongRole {
            operation: "start_sharing",
            role: Role::Viewer
        }
    ));
    assert!(matches!(
        viewer.stop_sharing().await,
        Err(PeerError::WrongRole { .. })
    ));
    assert!(matches!(
        host.join_as_viewer(Arc::new(RecordingSink::new())).await,
        Err(PeerError::WrongRole {
            operation: "join_as_viewer",
            role: Role::Host
        })
    ));
    assert!(matches!(
        host.reset_and_reconnect(None).await,
        Err(PeerError::WrongRole { .. })
    ));
    assert_eq!(connector.created(), 0, "Misuse must not touch the connection");

    // Nothing to stop or reset yet.
    assert!(matches!(host.stop_sharing().await, Err(PeerError::NotActive)));
    assert!(matches!(
        viewer.reset_and_reconnect(None).await,
        Err(PeerError::NotActive)
    ));

    viewer
        .join_as_viewer(Arc::new(RecordingSink::new()))
        .await
        .expect("join_as_viewer failed");
    assert!(matches!(
        viewer.join_as_viewer(Arc::new(RecordingSink::new())).await,
        Err(PeerError::AlreadyActive)
    ));
    assert_eq!(connector.created(), 1);

    host.cleanup().await.expect("cleanup failed");
    viewer.cleanup().await.expect("cleanup failed");
}
