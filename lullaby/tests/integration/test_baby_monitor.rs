use std::sync::Arc;

use lullaby::RoomId;
use lullaby_client::{EndReason, NoRecording, PeerPhase, Publisher, Viewer, ViewerPhase};

use crate::integration::{create_loopback_relay, init_tracing};
use crate::utils::{SimCamera, SimConnector, session, spin};

#[tokio::test]
async fn test_publisher_and_two_viewers_end_to_end() {
    init_tracing();

    let (relay, output) = create_loopback_relay();
    let room = RoomId::from("nursery");

    let mut p = output.connect(relay.clone()).await;
    let p_peers = SimConnector::default();
    let mut publisher = Publisher::new(
        room.clone(),
        Arc::new(p.transport.clone()),
        Arc::new(p_peers.clone()),
        Arc::new(SimCamera),
        Box::new(NoRecording),
        p.tx.clone(),
    );
    publisher.start().await.unwrap();
    spin(&relay, &mut [session(&mut publisher, &mut p.rx)]).await;
    assert_eq!(publisher.conn_id(), Some(p.conn));

    let mut v1 = output.connect(relay.clone()).await;
    let mut viewer1 = Viewer::new(
        room.clone(),
        Arc::new(v1.transport.clone()),
        Arc::new(SimConnector::default()),
        v1.tx.clone(),
    );
    viewer1.join().unwrap();
    spin(
        &relay,
        &mut [
            session(&mut publisher, &mut p.rx),
            session(&mut viewer1, &mut v1.rx),
        ],
    )
    .await;

    assert_eq!(viewer1.phase(), ViewerPhase::Connected);
    assert_eq!(viewer1.publisher(), Some(p.conn));
    assert_eq!(publisher.peer_phase(&v1.conn), Some(PeerPhase::Connected));

    // Late joiner: served from the cached offer, then the publisher's own
    // offer for it arrives and is ignored as a duplicate.
    let mut v2 = output.connect(relay.clone()).await;
    let v2_peers = SimConnector::default();
    let mut viewer2 = Viewer::new(
        room.clone(),
        Arc::new(v2.transport.clone()),
        Arc::new(v2_peers.clone()),
        v2.tx.clone(),
    );
    viewer2.join().unwrap();
    spin(
        &relay,
        &mut [
            session(&mut publisher, &mut p.rx),
            session(&mut viewer1, &mut v1.rx),
            session(&mut viewer2, &mut v2.rx),
        ],
    )
    .await;

    assert_eq!(viewer2.phase(), ViewerPhase::Connected);
    assert_eq!(v2_peers.created(), 1);
    assert_eq!(publisher.peer_count(), 2);
    assert_eq!(p_peers.created(), 2);

    let stats = relay.stats().await.unwrap();
    assert_eq!((stats.rooms, stats.publishers, stats.viewers), (1, 1, 2));

    publisher.teardown();
    spin(
        &relay,
        &mut [
            session(&mut publisher, &mut p.rx),
            session(&mut viewer1, &mut v1.rx),
            session(&mut viewer2, &mut v2.rx),
        ],
    )
    .await;

    assert_eq!(p_peers.live(), 0);
    assert_eq!(v2_peers.live(), 0);
    for viewer in [&viewer1, &viewer2] {
        assert_eq!(viewer.phase(), ViewerPhase::Ended);
        assert_eq!(viewer.status().ended, Some(EndReason::StreamEnded));
    }

    // Ended viewers have already left, so the room is gone.
    let stats = relay.stats().await.unwrap();
    assert_eq!(stats.rooms, 0);

    viewer1.leave();
    viewer2.leave();
    assert_eq!(viewer1.phase(), ViewerPhase::Left);
    assert_eq!(viewer2.phase(), ViewerPhase::Left);
}

#[tokio::test]
async fn test_restarted_publisher_serves_only_rejoined_viewers() {
    init_tracing();

    let (relay, output) = create_loopback_relay();
    let room = RoomId::from("nursery");

    let mut p = output.connect(relay.clone()).await;
    let p_peers = SimConnector::default();
    let mut publisher = Publisher::new(
        room.clone(),
        Arc::new(p.transport.clone()),
        Arc::new(p_peers.clone()),
        Arc::new(SimCamera),
        Box::new(NoRecording),
        p.tx.clone(),
    );
    let mut v = output.connect(relay.clone()).await;
    let mut viewer = Viewer::new(
        room.clone(),
        Arc::new(v.transport.clone()),
        Arc::new(SimConnector::default()),
        v.tx.clone(),
    );

    publisher.start().await.unwrap();
    viewer.join().unwrap();
    spin(
        &relay,
        &mut [
            session(&mut publisher, &mut p.rx),
            session(&mut viewer, &mut v.rx),
        ],
    )
    .await;
    assert_eq!(viewer.phase(), ViewerPhase::Connected);

    publisher.teardown();
    spin(
        &relay,
        &mut [
            session(&mut publisher, &mut p.rx),
            session(&mut viewer, &mut v.rx),
        ],
    )
    .await;
    assert_eq!(viewer.phase(), ViewerPhase::Ended);

    // The ended viewer is no longer in the room, so nobody gets an offer.
    publisher.start().await.unwrap();
    spin(
        &relay,
        &mut [
            session(&mut publisher, &mut p.rx),
            session(&mut viewer, &mut v.rx),
        ],
    )
    .await;
    assert_eq!(publisher.peer_count(), 0);
    assert_eq!(p_peers.live(), 0);
    assert_eq!(viewer.phase(), ViewerPhase::Ended);

    viewer.join().unwrap();
    spin(
        &relay,
        &mut [
            session(&mut publisher, &mut p.rx),
            session(&mut viewer, &mut v.rx),
        ],
    )
    .await;
    assert_eq!(viewer.phase(), ViewerPhase::Connected);
    assert_eq!(publisher.peer_count(), 1);
    assert_eq!(publisher.peer_phase(&v.conn), Some(PeerPhase::Connected));
}

#[tokio::test]
async fn test_viewer_waits_for_publisher() {
    init_tracing();

    let (relay, output) = create_loopback_relay();
    let room = RoomId::from("nursery");

    let mut v = output.connect(relay.clone()).await;
    let mut viewer = Viewer::new(
        room.clone(),
        Arc::new(v.transport.clone()),
        Arc::new(SimConnector::default()),
        v.tx.clone(),
    );
    viewer.join().unwrap();
    spin(&relay, &mut [session(&mut viewer, &mut v.rx)]).await;
    assert_eq!(viewer.phase(), ViewerPhase::AwaitingPublisher);

    let mut p = output.connect(relay.clone()).await;
    let mut publisher = Publisher::new(
        room,
        Arc::new(p.transport.clone()),
        Arc::new(SimConnector::default()),
        Arc::new(SimCamera),
        Box::new(NoRecording),
        p.tx.clone(),
    );
    publisher.start().await.unwrap();
    spin(
        &relay,
        &mut [
            session(&mut publisher, &mut p.rx),
            session(&mut viewer, &mut v.rx),
        ],
    )
    .await;

    assert_eq!(viewer.phase(), ViewerPhase::Connected);
    assert_eq!(publisher.peer_phase(&v.conn), Some(PeerPhase::Connected));
}
