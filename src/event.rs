/// Event records for the discrete-event engine.
///
/// An `Event` says *when* something happens, *who* receives it and an
/// entity-defined `kind`. Events are immutable once built; the store wraps
/// them with an [`EventId`] at insertion so equal timestamps are delivered
/// in insertion order.

use std::fmt;

use crate::entity::Owner;
use crate::time::VirtualTime;

// ── Event ID ──────────────────────────────────────────────────────────

/// Insertion sequence number assigned by the pending-event store.
///
/// Ids are strictly increasing within one scheduler, which makes them the
/// tie-break between events sharing a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(u64);

impl EventId {
    #[inline]
    pub fn new(raw: u64) -> Self {
        EventId(raw)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

/// Mints strictly increasing [`EventId`]s.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventIdGen {
    next: u64,
}

impl EventIdGen {
    pub(crate) fn next_id(&mut self) -> EventId {
        let id = EventId(self.next);
        self.next += 1;
        id
    }

    pub(crate) fn peek(&self) -> EventId {
        EventId(self.next)
    }
}

// ── Event Kind ────────────────────────────────────────────────────────

/// Opaque event discriminator.
///
/// The engine never looks inside a kind. Each entity family decides what
/// the values mean, usually by converting its own enum with `From` and
/// `TryFrom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EventKind(u32);

impl EventKind {
    /// Kind carried by the scheduler's self-seeded terminal event.
    pub const HORIZON: EventKind = EventKind(0);

    #[inline]
    pub const fn new(raw: u32) -> Self {
        EventKind(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "kind#{}", self.0)
    }
}

// ── Event ─────────────────────────────────────────────────────────────

/// A scheduled occurrence: deliver `kind` to `owner` at `timestamp`.
///
/// Fields are private so an event cannot change between insertion and
/// delivery. Cloning is cheap: the owner is a weak handle.
#[derive(Clone)]
pub struct Event {
    timestamp: VirtualTime,
    owner: Owner,
    kind: EventKind,
}

impl Event {
    pub fn new(timestamp: VirtualTime, owner: Owner, kind: EventKind) -> Self {
        Event {
            timestamp,
            owner,
            kind,
        }
    }

    #[inline]
    pub fn timestamp(&self) -> VirtualTime {
        self.timestamp
    }

    #[inline]
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// A new event for the same owner, e.g. an entity rescheduling itself.
    pub fn follow_up(&self, timestamp: VirtualTime, kind: EventKind) -> Event {
        Event::new(timestamp, self.owner.clone(), kind)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("timestamp", &self.timestamp)
            .field("owner", &self.owner)
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_monotonic() {
        let mut gen = EventIdGen::default();
        let a = gen.next_id();
        let b = gen.next_id();
        assert_eq!(a.raw(), 0);
        assert_eq!(b.raw(), 1);
        assert!(a < b);
        assert_eq!(gen.peek(), EventId::new(2));
    }

    #[test]
    fn test_kind_is_opaque_value() {
        let k = EventKind::new(3);
        assert_eq!(k.raw(), 3);
        assert_ne!(k, EventKind::HORIZON);
        assert_eq!(k.to_string(), "kind#3");
    }

    #[test]
    fn test_follow_up_keeps_owner() {
        let e = Event::new(VirtualTime::new(1), Owner::detached(), EventKind::new(3));
        let next = e.follow_up(VirtualTime::new(6), EventKind::new(1));
        assert_eq!(next.timestamp(), VirtualTime::new(6));
        assert_eq!(next.kind(), EventKind::new(1));
        assert!(next.owner().is_detached());
        assert_eq!(e.timestamp(), VirtualTime::new(1));
    }

    #[test]
    fn test_display_ids() {
        assert_eq!(EventId::new(42).to_string(), "E#42");
    }
}
