//! Error types for the simulation engine.
//!
//! Every fallible public API returns [`SimResult`]. Store exhaustion and
//! invalid owners are engine errors; anything an entity's handler raises
//! is wrapped in [`SimError::Entity`] and aborts the run.

use thiserror::Error;

use crate::entity::EntityId;
use crate::event::{EventId, EventKind};
use crate::time::VirtualTime;

/// Failure raised by an entity's event handler.
pub type EntityFault = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum SimError {
    /// `extract_min` was called on a store with no pending events.
    #[error("pending event store is empty")]
    EmptyStore,

    /// The event names no live entity (detached owner, or the entity was
    /// dropped before the event was inserted).
    #[error("event {kind} at {timestamp} has no live owner")]
    InvalidOwner {
        timestamp: VirtualTime,
        kind: EventKind,
    },

    /// An entity's handler failed while reacting to an event.
    #[error("entity {entity} failed handling an event at {time}: {source}")]
    Entity {
        entity: EntityId,
        time: VirtualTime,
        #[source]
        source: EntityFault,
    },

    /// The owning entity was already mutably borrowed when its event came due.
    #[error("entity owning {event_id} is already borrowed at {time}")]
    EntityBusy { event_id: EventId, time: VirtualTime },

    /// `run` or `step` was called on a scheduler that has already finished.
    #[error("scheduler has terminated and cannot be restarted")]
    AlreadyTerminated,

    #[error("scheduling {delay} ticks after {now} overflows the clock")]
    TimeOverflow { now: VirtualTime, delay: u64 },
}

/// Convenience alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_owner_display() {
        let e = SimError::InvalidOwner {
            timestamp: VirtualTime::new(4),
            kind: EventKind::new(2),
        };
        assert_eq!(e.to_string(), "event kind#2 at T=4 has no live owner");
    }

    #[test]
    fn test_entity_fault_keeps_source() {
        let e = SimError::Entity {
            entity: EntityId::new(7),
            time: VirtualTime::new(9),
            source: "sensor jammed".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("007"));
        assert!(msg.contains("T=9"));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn test_overflow_display() {
        let e = SimError::TimeOverflow {
            now: VirtualTime::MAX,
            delay: 1,
        };
        assert!(e.to_string().contains("overflows"));
    }
}
