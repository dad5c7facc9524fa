use std::net::SocketAddr;
use std::time::Duration;

use lullaby_core::RoomId;

use crate::RelayError;

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Address the HTTP/WebSocket listener binds to
    pub bind_addr: SocketAddr,

    /// Capacity of the command channel feeding the session relay
    pub command_capacity: usize,

    pub room_policy: RoomPolicy,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 4000)),
            command_capacity: 1024,
            room_policy: RoomPolicy::default(),
        }
    }
}

impl RelayConfig {
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity.max(1);
        self
    }

    pub fn room_policy(mut self, policy: RoomPolicy) -> Self {
        self.room_policy = policy;
        self
    }
}

/// Policy applied to room ids and to rooms left without a publisher.
///
/// The defaults accept any non-empty room id and keep publisherless rooms
/// alive for as long as they hold viewers.
#[derive(Debug, Clone)]
pub struct RoomPolicy {
    /// Longest accepted room id in bytes (None = unlimited)
    pub max_room_id_len: Option<usize>,

    /// Evict rooms that have had no publisher for this long (None = never)
    pub orphan_room_ttl: Option<Duration>,

    /// How often the orphan sweep runs when a TTL is set. The relay raises
    /// anything below one millisecond to one millisecond.
    pub sweep_interval: Duration,
}

impl Default for RoomPolicy {
    fn default() -> Self {
        Self {
            max_room_id_len: None,
            orphan_room_ttl: None,
            sweep_interval: Duration::from_secs(30),
        }
    }
}

impl RoomPolicy {
    pub fn max_room_id_len(mut self, len: usize) -> Self {
        self.max_room_id_len = Some(len);
        self
    }

    pub fn orphan_room_ttl(mut self, ttl: Duration) -> Self {
        self.orphan_room_ttl = Some(ttl);
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn validate(&self, room: &RoomId) -> Result<(), RelayError> {
        if room.as_str().is_empty() {
            return Err(RelayError::RejectedRoomId("empty room id".to_owned()));
        }

        match self.max_room_id_len {
            Some(max) if room.as_str().len() > max => Err(RelayError::RejectedRoomId(format!(
                "room id is {} bytes, limit is {}",
                room.as_str().len(),
                max
            ))),
            _ => Ok(()),
        }
    }
}
