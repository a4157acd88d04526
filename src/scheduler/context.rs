//! `SchedulerContext` — what an entity sees while it handles an event.

use crate::entity::Owner;
use crate::error::{SimError, SimResult};
use crate::event::{Event, EventId, EventKind};
use crate::store::PendingEventStore;
use crate::time::VirtualTime;

/// Mutable view handed to [`ReactiveEntity::receive_event`].
///
/// It borrows only the pending store, so an entity can queue new work but
/// cannot extract events or move the clock.
///
/// [`ReactiveEntity::receive_event`]: crate::entity::ReactiveEntity::receive_event
pub struct SchedulerContext<'a> {
    pub(crate) store: &'a mut PendingEventStore,
    pub(crate) now: VirtualTime,
    pub(crate) horizon: VirtualTime,
    pub(crate) event_id: EventId,
}

impl<'a> SchedulerContext<'a> {
    /// Logical time of the delivery in progress.
    #[inline]
    pub fn now(&self) -> VirtualTime {
        self.now
    }

    #[inline]
    pub fn horizon(&self) -> VirtualTime {
        self.horizon
    }

    /// Id of the event being delivered.
    #[inline]
    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn pending_count(&self) -> usize {
        self.store.len()
    }

    /// Queue a fully built event. Past timestamps are accepted.
    pub fn insert(&mut self, event: Event) -> SimResult<EventId> {
        self.store.insert(event)
    }

    /// Queue `kind` for `owner` at an absolute time.
    pub fn schedule_at(
        &mut self,
        at: VirtualTime,
        owner: Owner,
        kind: EventKind,
    ) -> SimResult<EventId> {
        self.store.insert(Event::new(at, owner, kind))
    }

    /// Queue `kind` for `owner`, `delay` ticks after now.
    pub fn schedule_after(
        &mut self,
        delay: u64,
        owner: Owner,
        kind: EventKind,
    ) -> SimResult<EventId> {
        let at = self.now.plus(delay).ok_or(SimError::TimeOverflow {
            now: self.now,
            delay,
        })?;
        self.schedule_at(at, owner, kind)
    }
}
