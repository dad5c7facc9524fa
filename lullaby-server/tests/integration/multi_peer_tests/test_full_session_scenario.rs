use lullaby_core::{ConnId, Role, RoomId, ServerMessage};

use crate::integration::{create_test_relay, init_tracing};
use crate::utils::{is_stream_ended, offer, settle};

/// Publisher P streams into R1, V1 watches from the start, V2 joins late,
/// then P drops off the network.
#[tokio::test]
async fn test_publisher_two_viewers_late_join_and_publisher_loss() {
    init_tracing();

    let (relay, _rx, signaling) = create_test_relay();
    let r1 = RoomId::from("R1");
    let (p, v1, v2) = (ConnId::new(), ConnId::new(), ConnId::new());

    relay.join(p, r1.clone(), Role::Publisher).await.unwrap();
    let stats = settle(&relay).await.unwrap();
    assert_eq!((stats.rooms, stats.publishers, stats.viewers), (1, 1, 0));

    relay.join(v1, r1.clone(), Role::Viewer).await.unwrap();
    settle(&relay).await.unwrap();
    assert_eq!(
        signaling.messages_for(&v1).await,
        vec![ServerMessage::PublisherAvailable { publisher_id: p }]
    );

    relay.signal(p, Some(v1), r1.clone(), offer("O1")).await.unwrap();
    settle(&relay).await.unwrap();
    assert_eq!(
        signaling.messages_for(&v1).await.last(),
        Some(&ServerMessage::Signal {
            from: p,
            data: offer("O1")
        })
    );

    relay.join(v2, r1.clone(), Role::Viewer).await.unwrap();
    settle(&relay).await.unwrap();
    assert_eq!(
        signaling.messages_for(&v2).await,
        vec![ServerMessage::Signal {
            from: p,
            data: offer("O1")
        }]
    );
    let joined_v2 = ServerMessage::PeerJoined {
        id: v2,
        role: Role::Viewer,
    };
    assert_eq!(signaling.messages_for(&v1).await.last(), Some(&joined_v2));
    assert_eq!(signaling.messages_for(&p).await.last(), Some(&joined_v2));

    relay.disconnect(p).await.unwrap();
    let stats = settle(&relay).await.unwrap();

    assert_eq!(signaling.count_for(&v1, is_stream_ended).await, 1);
    assert_eq!(signaling.count_for(&v2, is_stream_ended).await, 1);
    assert_eq!((stats.publishers, stats.viewers), (0, 2));

    relay.leave(v1, r1.clone()).await.unwrap();
    relay.disconnect(v2).await.unwrap();
    assert_eq!(settle(&relay).await.unwrap().rooms, 0);
}
