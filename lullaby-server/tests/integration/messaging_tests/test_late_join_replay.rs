use lullaby_core::{ConnId, Role, RoomId, ServerMessage};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{is_signal, is_signal_from, offer, settle};

#[tokio::test]
async fn test_late_viewer_receives_cached_offer() {
    init_tracing();

    let (relay, _rx, signaling) = create_test_relay();
    let room = RoomId::from("R1");
    let (publisher, early, late) = (ConnId::new(), ConnId::new(), ConnId::new());

    relay.join(publisher, room.clone(), Role::Publisher).await.unwrap();
    relay.join(early, room.clone(), Role::Viewer).await.unwrap();
    relay
        .signal(publisher, Some(early), room.clone(), offer("o1"))
        .await
        .unwrap();
    settle(&relay).await.unwrap();

    let publisher_traffic = signaling.count_for(&publisher, |_| true).await;

    relay.join(late, room.clone(), Role::Viewer).await.unwrap();
    settle(&relay).await.unwrap();

    assert_eq!(
        signaling.messages_for(&late).await,
        vec![ServerMessage::Signal {
            from: publisher,
            data: offer("o1")
        }]
    );
    // The replay needs nothing from the publisher beyond the peer-joined notice.
    assert_eq!(
        signaling.count_for(&publisher, |_| true).await,
        publisher_traffic + 1
    );
}

#[tokio::test]
async fn test_only_latest_offer_is_replayed() {
    init_tracing();

    let (relay, _rx, signaling) = create_test_relay();
    let room = RoomId::from("R1");
    let (publisher, late) = (ConnId::new(), ConnId::new());

    relay.join(publisher, room.clone(), Role::Publisher).await.unwrap();
    relay.signal(publisher, None, room.clone(), offer("o1")).await.unwrap();
    relay.signal(publisher, None, room.clone(), offer("o2")).await.unwrap();
    relay.join(late, room.clone(), Role::Viewer).await.unwrap();
    settle(&relay).await.unwrap();

    assert_eq!(signaling.count_for(&late, is_signal).await, 1);
    assert_eq!(
        signaling
            .count_for(&late, is_signal_from(publisher, offer("o2")))
            .await,
        1
    );
}

#[tokio::test]
async fn test_offer_is_multicast_to_every_viewer() {
    init_tracing();

    let (relay, _rx, signaling) = create_test_relay();
    let room = RoomId::from("R1");
    let publisher = ConnId::new();
    let viewers = [ConnId::new(), ConnId::new()];

    relay.join(publisher, room.clone(), Role::Publisher).await.unwrap();
    for v in viewers {
        relay.join(v, room.clone(), Role::Viewer).await.unwrap();
    }
    relay
        .signal(publisher, Some(viewers[0]), room.clone(), offer("o1"))
        .await
        .unwrap();
    settle(&relay).await.unwrap();

    for v in viewers {
        assert_eq!(
            signaling
                .count_for(&v, is_signal_from(publisher, offer("o1")))
                .await,
            1
        );
    }
}
