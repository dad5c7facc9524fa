use crate::RelayError;
use crate::config::RoomPolicy;
use crate::room::Room;
use lullaby_core::{ConnId, Role, RoomId, ServerMessage, SessionDescription};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info};

/// One message the relay must hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub to: ConnId,
    pub message: ServerMessage,
}

impl Delivery {
    pub fn new(to: ConnId, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub rooms: usize,
    pub publishers: usize,
    pub viewers: usize,
}

/// Single-owner arena of rooms.
///
/// Every operation is atomic with respect to the registry and returns the
/// deliveries it produced; sending them is the caller's job.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    policy: RoomPolicy,
}

impl RoomRegistry {
    pub fn new(policy: RoomPolicy) -> Self {
        Self {
            rooms: HashMap::new(),
            policy,
        }
    }

    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        self.rooms.values().fold(RegistryStats::default(), |mut acc, room| {
            acc.rooms += 1;
            acc.publishers += usize::from(room.publisher().is_some());
            acc.viewers += room.viewer_count();
            acc
        })
    }

    pub fn join(
        &mut self,
        room_id: RoomId,
        role: Role,
        conn: ConnId,
    ) -> Result<Vec<Delivery>, RelayError> {
        self.join_at(room_id, role, conn, Instant::now())
    }

    pub(crate) fn join_at(
        &mut self,
        room_id: RoomId,
        role: Role,
        conn: ConnId,
        now: Instant,
    ) -> Result<Vec<Delivery>, RelayError> {
        self.policy.validate(&room_id)?;

        let room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            info!("Creating new room: {}", room_id);
            Room::new(room_id.clone(), now)
        });

        let mut out = Vec::new();

        match role {
            Role::Publisher => {
                let replaced = room.publisher().filter(|p| *p != conn);
                if let Some(previous) = replaced {
                    info!(
                        "Publisher {} replaces {} in room {}",
                        conn, previous, room_id
                    );
                    // The old stream is gone for every viewer. They rejoin to
                    // be introduced to the new publisher.
                    out.extend(stream_ended(room));
                }
                room.set_publisher(conn);
                info!("Publisher {} is streaming in room {}", conn, room_id);

                // Viewers already waiting are introduced to the publisher so
                // it can offer to them.
                for viewer in room.viewers().filter(|_| replaced.is_none()) {
                    out.push(Delivery::new(
                        viewer,
                        ServerMessage::PublisherAvailable { publisher_id: conn },
                    ));
                    out.push(Delivery::new(
                        conn,
                        ServerMessage::PeerJoined {
                            id: viewer,
                            role: Role::Viewer,
                        },
                    ));
                }
            }
            Role::Viewer => {
                if room.clear_publisher(conn, now) {
                    out.extend(stream_ended(room));
                }
                room.add_viewer(conn);
                info!("Viewer {} joined room {}", conn, room_id);

                match (room.publisher(), room.cached_offer()) {
                    (Some(publisher), Some(offer)) => {
                        debug!("Replaying cached offer to late viewer {}", conn);
                        out.push(Delivery::new(
                            conn,
                            ServerMessage::Signal {
                                from: publisher,
                                data: offer.clone(),
                            },
                        ));
                    }
                    (Some(publisher), None) => {
                        out.push(Delivery::new(
                            conn,
                            ServerMessage::PublisherAvailable {
                                publisher_id: publisher,
                            },
                        ));
                    }
                    _ => {}
                }
            }
        }

        out.extend(
            room.others(conn)
                .map(|other| Delivery::new(other, ServerMessage::PeerJoined { id: conn, role })),
        );

        Ok(out)
    }

    pub fn relay_signal(
        &mut self,
        from: ConnId,
        to: Option<ConnId>,
        room_id: &RoomId,
        data: SessionDescription,
    ) -> Result<Vec<Delivery>, RelayError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RelayError::UnknownRoom(room_id.clone()))?;

        if !room.contains(&from) {
            return Err(RelayError::NotAMember {
                room: room_id.clone(),
                conn: from,
            });
        }

        if data.is_offer() && room.publisher() == Some(from) {
            debug!("Caching offer from publisher {} in room {}", from, room_id);
            room.cache_offer(data.clone());

            return Ok(room
                .viewers()
                .map(|viewer| {
                    Delivery::new(
                        viewer,
                        ServerMessage::Signal {
                            from,
                            data: data.clone(),
                        },
                    )
                })
                .collect());
        }

        let message = ServerMessage::Signal { from, data };

        match to {
            Some(target) if room.contains(&target) => Ok(vec![Delivery::new(target, message)]),
            Some(target) => Err(RelayError::UnknownTarget {
                room: room_id.clone(),
                target,
            }),
            None => Ok(room
                .others(from)
                .map(|other| Delivery::new(other, message.clone()))
                .collect()),
        }
    }

    pub fn leave(&mut self, room_id: &RoomId, conn: ConnId) -> Result<Vec<Delivery>, RelayError> {
        self.leave_at(room_id, conn, Instant::now())
    }

    pub(crate) fn leave_at(
        &mut self,
        room_id: &RoomId,
        conn: ConnId,
        now: Instant,
    ) -> Result<Vec<Delivery>, RelayError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RelayError::UnknownRoom(room_id.clone()))?;

        if !room.contains(&conn) {
            return Err(RelayError::NotAMember {
                room: room_id.clone(),
                conn,
            });
        }

        let out = detach(room, conn, now);
        self.remove_if_empty(room_id);
        Ok(out)
    }

    /// Drops `conn` from every room it belongs to.
    pub fn disconnect(&mut self, conn: ConnId) -> Vec<Delivery> {
        self.disconnect_at(conn, Instant::now())
    }

    pub(crate) fn disconnect_at(&mut self, conn: ConnId, now: Instant) -> Vec<Delivery> {
        let member_of: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|room| room.contains(&conn))
            .map(|room| room.id().clone())
            .collect();

        let mut out = Vec::new();
        for room_id in member_of {
            if let Some(room) = self.rooms.get_mut(&room_id) {
                out.extend(detach(room, conn, now));
            }
            self.remove_if_empty(&room_id);
        }
        out
    }

    /// Evicts rooms that have been publisherless for at least `ttl`.
    pub fn sweep_orphans(&mut self, now: Instant, ttl: std::time::Duration) -> Vec<Delivery> {
        let expired: Vec<RoomId> = self
            .rooms
            .values()
            .filter(|room| room.publisher().is_none())
            .filter(|room| {
                room.orphaned_since()
                    .is_some_and(|since| now.saturating_duration_since(since) >= ttl)
            })
            .map(|room| room.id().clone())
            .collect();

        let mut out = Vec::new();
        for room_id in expired {
            let Some(room) = self.rooms.remove(&room_id) else {
                continue;
            };
            info!(
                "Room {} expired after {:?} without a publisher",
                room_id, ttl
            );
            out.extend(room.viewers().map(|viewer| {
                Delivery::new(
                    viewer,
                    ServerMessage::RoomExpired {
                        room: room_id.clone(),
                    },
                )
            }));
        }
        out
    }

    fn remove_if_empty(&mut self, room_id: &RoomId) {
        if self.rooms.get(room_id).is_some_and(Room::is_empty) {
            self.rooms.remove(room_id);
            info!("Cleaned up empty room {}", room_id);
        }
    }
}

fn stream_ended(room: &Room) -> Vec<Delivery> {
    room.viewers()
        .map(|viewer| Delivery::new(viewer, ServerMessage::StreamEnded {}))
        .collect()
}

fn detach(room: &mut Room, conn: ConnId, now: Instant) -> Vec<Delivery> {
    let mut out = Vec::new();

    if room.clear_publisher(conn, now) {
        info!("Publisher {} left room {}: stream ended", conn, room.id());
        out.extend(stream_ended(room));
    } else if room.remove_viewer(&conn) {
        info!("Viewer {} left room {}", conn, room.id());
    }

    out.extend(
        room.others(conn)
            .map(|other| Delivery::new(other, ServerMessage::PeerLeft { id: conn })),
    );
    out
}
