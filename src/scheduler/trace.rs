//! DeliveryRecord — one line of the optional delivery trace.

use crate::entity::EntityId;
use crate::event::{EventId, EventKind};
use crate::time::VirtualTime;

/// A record of a single delivered event.
///
/// Appended by the scheduler on every delivery when tracing is enabled.
/// Handy for ordering assertions and post-mortem debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct DeliveryRecord {
    /// Clock value at delivery.
    pub time: VirtualTime,
    pub event_id: EventId,
    /// Entity that received the event.
    pub entity: EntityId,
    pub kind: EventKind,
}

impl std::fmt::Display for DeliveryRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[T={} E#{} {}] {}",
            self.time.ticks(),
            self.event_id.raw(),
            self.entity,
            self.kind,
        )
    }
}
