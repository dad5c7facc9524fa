use lullaby_core::{ConnId, RoomId, SessionDescription};
use std::collections::BTreeSet;
use std::time::Instant;

/// Authoritative record for one room.
///
/// Only the registry mutates it; everything outside sees it through `&Room`.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    publisher: Option<ConnId>,
    cached_offer: Option<SessionDescription>,
    viewers: BTreeSet<ConnId>,
    created_at: Instant,
    /// When the room last lost (or never had) a publisher
    orphaned_since: Option<Instant>,
}

impl Room {
    pub(crate) fn new(id: RoomId, now: Instant) -> Self {
        Self {
            id,
            publisher: None,
            cached_offer: None,
            viewers: BTreeSet::new(),
            created_at: now,
            orphaned_since: Some(now),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn publisher(&self) -> Option<ConnId> {
        self.publisher
    }

    pub fn cached_offer(&self) -> Option<&SessionDescription> {
        self.cached_offer.as_ref()
    }

    pub fn viewers(&self) -> impl Iterator<Item = ConnId> + '_ {
        self.viewers.iter().copied()
    }

    pub fn viewer_count(&self) -> usize {
        self.viewers.len()
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn orphaned_since(&self) -> Option<Instant> {
        self.orphaned_since
    }

    pub fn is_empty(&self) -> bool {
        self.publisher.is_none() && self.viewers.is_empty()
    }

    pub fn contains(&self, conn: &ConnId) -> bool {
        self.publisher.as_ref() == Some(conn) || self.viewers.contains(conn)
    }

    /// Every member except `conn`, publisher first.
    pub fn others(&self, conn: ConnId) -> impl Iterator<Item = ConnId> + '_ {
        self.publisher
            .into_iter()
            .chain(self.viewers.iter().copied())
            .filter(move |member| *member != conn)
    }

    /// Installs `conn` as the publisher. A different previous publisher is
    /// dropped together with its cached offer.
    pub(crate) fn set_publisher(&mut self, conn: ConnId) {
        if self.publisher != Some(conn) {
            self.cached_offer = None;
        }
        self.viewers.remove(&conn);
        self.publisher = Some(conn);
        self.orphaned_since = None;
    }

    pub(crate) fn add_viewer(&mut self, conn: ConnId) {
        self.viewers.insert(conn);
    }

    pub(crate) fn cache_offer(&mut self, offer: SessionDescription) {
        self.cached_offer = Some(offer);
    }

    /// Clears the publisher and its offer. Returns false if `conn` was not
    /// the publisher.
    pub(crate) fn clear_publisher(&mut self, conn: ConnId, now: Instant) -> bool {
        if self.publisher != Some(conn) {
            return false;
        }
        self.publisher = None;
        self.cached_offer = None;
        self.orphaned_since = Some(now);
        true
    }

    pub(crate) fn remove_viewer(&mut self, conn: &ConnId) -> bool {
        self.viewers.remove(conn)
    }
}
