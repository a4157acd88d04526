/// Time-ordered store of not-yet-delivered events.
///
/// A `BinaryHeap` with reversed `Ord` acts as a min-heap keyed by
/// `(timestamp, event_id)`. Ids are minted here at insertion, so events
/// sharing a timestamp come out in the order they went in.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::entity::Target;
use crate::error::{SimError, SimResult};
use crate::event::{Event, EventId, EventIdGen};
use crate::time::VirtualTime;

// ── Pending ───────────────────────────────────────────────────────────

/// An event sitting in the store, together with its sequence id and the
/// strong handle to whoever will receive it.
pub struct Pending {
    id: EventId,
    event: Event,
    target: Target,
}

impl Pending {
    #[inline]
    pub fn id(&self) -> EventId {
        self.id
    }

    #[inline]
    pub fn event(&self) -> &Event {
        &self.event
    }

    #[inline]
    pub fn timestamp(&self) -> VirtualTime {
        self.event.timestamp()
    }

    pub(crate) fn into_parts(self) -> (EventId, Event, Target) {
        (self.id, self.event, self.target)
    }

    /// `true` if the receiving entity is mutably borrowed right now.
    pub(crate) fn target_busy(&self) -> bool {
        match &self.target {
            Target::Scheduler => false,
            Target::Entity(handle) => handle.try_borrow_mut().is_err(),
        }
    }

    fn key(&self) -> (VirtualTime, EventId) {
        (self.event.timestamp(), self.id)
    }
}

impl std::fmt::Debug for Pending {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pending")
            .field("id", &self.id)
            .field("event", &self.event)
            .finish()
    }
}

// Reversed so that BinaryHeap pops the smallest key first.
impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Pending {}

// ── PendingEventStore ─────────────────────────────────────────────────

/// Min-ordered multiset of pending events, exclusively owned by a scheduler.
#[derive(Default)]
pub struct PendingEventStore {
    heap: BinaryHeap<Pending>,
    ids: EventIdGen,
}

impl PendingEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event. Fails with [`SimError::InvalidOwner`] if its owner is
    /// detached or already dropped. Timestamps are not checked against any
    /// clock.
    pub fn insert(&mut self, event: Event) -> SimResult<EventId> {
        let target = event
            .owner()
            .resolve()
            .ok_or(SimError::InvalidOwner {
                timestamp: event.timestamp(),
                kind: event.kind(),
            })?;
        Ok(self.push(event, target))
    }

    /// Queue an event whose target is already resolved.
    pub(crate) fn push(&mut self, event: Event, target: Target) -> EventId {
        let id = self.ids.next_id();
        debug!(%id, at = %event.timestamp(), kind = %event.kind(), "event queued");
        self.heap.push(Pending { id, event, target });
        id
    }

    /// Put back an event taken out by `extract_min`, keeping its id.
    pub(crate) fn restore(&mut self, pending: Pending) {
        self.heap.push(pending);
    }

    /// Remove and return the earliest event (lowest id among ties).
    pub fn extract_min(&mut self) -> SimResult<Pending> {
        self.heap.pop().ok_or(SimError::EmptyStore)
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Timestamp of the event `extract_min` would return next.
    pub fn peek_time(&self) -> Option<VirtualTime> {
        self.heap.peek().map(Pending::timestamp)
    }

    /// The id the next inserted event will receive.
    pub fn next_event_id(&self) -> EventId {
        self.ids.peek()
    }

    /// Undelivered events in delivery order, without removing them.
    pub fn snapshot(&self) -> Vec<(EventId, &Event)> {
        let mut entries: Vec<&Pending> = self.heap.iter().collect();
        entries.sort_by_key(|p| p.key());
        entries.into_iter().map(|p| (p.id, &p.event)).collect()
    }
}

impl std::fmt::Debug for PendingEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingEventStore")
            .field("len", &self.heap.len())
            .field("next_id", &self.ids.peek())
            .finish()
    }
}
