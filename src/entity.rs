//! Reactive entities and the handles events use to reach them.
//!
//! An entity joins the simulation the moment an event it owns is inserted;
//! there is no registration step. Events carry a weak [`Owner`] handle, and
//! the pending store upgrades it to a strong one at insertion, so an entity
//! stays alive for as long as it has work queued.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::EntityFault;
use crate::event::Event;
use crate::scheduler::SchedulerContext;

// ── EntityId ──────────────────────────────────────────────────────────

/// Diagnostic identifier of an entity. Never used for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(u64);

impl EntityId {
    /// Reserved for the scheduler's own terminal-event host.
    pub const SCHEDULER: EntityId = EntityId(u64::MAX);

    #[inline]
    pub const fn new(id: u64) -> Self {
        EntityId(id)
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == EntityId::SCHEDULER {
            f.write_str("scheduler")
        } else {
            write!(f, "{:03}", self.0)
        }
    }
}

// ── ReactiveEntity ────────────────────────────────────────────────────

/// Anything the scheduler can deliver events to.
///
/// # Contract
///
/// `receive_event` is called exactly once per delivered event, with the
/// clock already advanced (`ctx.now()`). Implementations update their own
/// last-observed time, branch on `event.kind()` and may schedule any number
/// of new events through `ctx`. Returning an error aborts the whole run.
///
/// # Example
///
/// ```rust
/// use simdes::{entity, Event, EventKind, EntityId, Owner, ReactiveEntity,
///              Scheduler, SchedulerContext, VirtualTime};
/// use simdes::error::EntityFault;
///
/// struct Blinker { id: EntityId, blinks: u32 }
///
/// impl ReactiveEntity for Blinker {
///     fn id(&self) -> EntityId { self.id }
///     fn receive_event(
///         &mut self,
///         ctx: &mut SchedulerContext<'_>,
///         event: &Event,
///     ) -> Result<(), EntityFault> {
///         self.blinks += 1;
///         ctx.schedule_after(2, event.owner().clone(), event.kind())?;
///         Ok(())
///     }
/// }
///
/// let blinker = entity::share(Blinker { id: EntityId::new(1), blinks: 0 });
/// let mut sched = Scheduler::new(VirtualTime::new(5));
/// sched
///     .insert(Event::new(VirtualTime::ZERO, Owner::of(&blinker), EventKind::new(1)))
///     .unwrap();
/// sched.run().unwrap();
/// assert_eq!(blinker.borrow().blinks, 3); // t = 0, 2, 4
/// ```
pub trait ReactiveEntity {
    fn id(&self) -> EntityId;

    /// React to a delivered event.
    fn receive_event(
        &mut self,
        ctx: &mut SchedulerContext<'_>,
        event: &Event,
    ) -> Result<(), EntityFault>;
}

/// Shared handle to a type-erased entity.
pub type EntityRef = Rc<RefCell<dyn ReactiveEntity>>;

/// Wrap an entity so events can own it while setup code keeps a typed handle.
pub fn share<E: ReactiveEntity>(entity: E) -> Rc<RefCell<E>> {
    Rc::new(RefCell::new(entity))
}

// ── Owner ─────────────────────────────────────────────────────────────

/// The receiver named by an [`Event`].
#[derive(Clone)]
pub struct Owner(OwnerRef);

#[derive(Clone)]
enum OwnerRef {
    Scheduler,
    Entity(Weak<RefCell<dyn ReactiveEntity>>),
    Detached,
}

impl Owner {
    /// Owner pointing at a shared entity.
    pub fn of<E: ReactiveEntity + 'static>(handle: &Rc<RefCell<E>>) -> Self {
        let weak: Weak<RefCell<E>> = Rc::downgrade(handle);
        Owner(OwnerRef::Entity(weak))
    }

    /// Owner pointing at an already type-erased entity.
    pub fn of_dyn(handle: &EntityRef) -> Self {
        Owner(OwnerRef::Entity(Rc::downgrade(handle)))
    }

    /// An owner that refers to nothing. Inserting an event with it fails.
    pub fn detached() -> Self {
        Owner(OwnerRef::Detached)
    }

    /// The scheduler itself; only its terminal event uses this.
    pub(crate) fn scheduler() -> Self {
        Owner(OwnerRef::Scheduler)
    }

    pub fn is_scheduler(&self) -> bool {
        matches!(self.0, OwnerRef::Scheduler)
    }

    pub fn is_detached(&self) -> bool {
        matches!(self.0, OwnerRef::Detached)
    }

    /// `true` while the owner can still receive events.
    pub fn is_live(&self) -> bool {
        match &self.0 {
            OwnerRef::Scheduler => true,
            OwnerRef::Entity(weak) => weak.strong_count() > 0,
            OwnerRef::Detached => false,
        }
    }

    /// Upgrade to the strong delivery target, if the owner is still live.
    pub(crate) fn resolve(&self) -> Option<Target> {
        match &self.0 {
            OwnerRef::Scheduler => Some(Target::Scheduler),
            OwnerRef::Entity(weak) => weak.upgrade().map(Target::Entity),
            OwnerRef::Detached => None,
        }
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            OwnerRef::Scheduler => f.write_str("Owner::Scheduler"),
            OwnerRef::Entity(weak) if weak.strong_count() > 0 => f.write_str("Owner::Entity"),
            OwnerRef::Entity(_) => f.write_str("Owner::Entity(dropped)"),
            OwnerRef::Detached => f.write_str("Owner::Detached"),
        }
    }
}

/// Strong delivery target held by a pending event.
#[derive(Clone)]
pub(crate) enum Target {
    Scheduler,
    Entity(EntityRef),
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert(EntityId);

    impl ReactiveEntity for Inert {
        fn id(&self) -> EntityId {
            self.0
        }

        fn receive_event(
            &mut self,
            _ctx: &mut SchedulerContext<'_>,
            _event: &Event,
        ) -> Result<(), EntityFault> {
            Ok(())
        }
    }

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId::new(7).to_string(), "007");
        assert_eq!(EntityId::new(1234).to_string(), "1234");
        assert_eq!(EntityId::SCHEDULER.to_string(), "scheduler");
    }

    #[test]
    fn test_live_owner_resolves() {
        let handle = share(Inert(EntityId::new(1)));
        let owner = Owner::of(&handle);
        assert!(owner.is_live());
        match owner.resolve() {
            Some(Target::Entity(rc)) => {
                assert_eq!(rc.borrow().id(), EntityId::new(1));
                assert_eq!(Rc::strong_count(&handle), 2);
            }
            _ => panic!("expected an entity target"),
        }
    }

    #[test]
    fn test_dropped_owner_does_not_resolve() {
        let handle = share(Inert(EntityId::new(1)));
        let owner = Owner::of(&handle);
        drop(handle);
        assert!(!owner.is_live());
        assert!(owner.resolve().is_none());
        assert_eq!(format!("{:?}", owner), "Owner::Entity(dropped)");
    }

    #[test]
    fn test_detached_owner() {
        let owner = Owner::detached();
        assert!(owner.is_detached());
        assert!(!owner.is_scheduler());
        assert!(owner.resolve().is_none());
    }

    #[test]
    fn test_of_dyn_matches_of() {
        let handle: EntityRef = share(Inert(EntityId::new(2)));
        let owner = Owner::of_dyn(&handle);
        match owner.resolve() {
            Some(Target::Entity(rc)) => assert_eq!(rc.borrow().id(), EntityId::new(2)),
            _ => panic!("expected an entity target"),
        }
    }
}
