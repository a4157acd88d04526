//! Logical simulation time.
//!
//! The clock only moves when the scheduler delivers an event: it jumps
//! straight to the event's timestamp. Nothing here reads wall-clock time.

use std::fmt;

/// A point on the simulation's logical time axis, measured in ticks.
///
/// Timestamps, the logical clock and the horizon all share this type so
/// that they cannot be confused with event ids or entity ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualTime(u64);

impl VirtualTime {
    /// Start of every run.
    pub const ZERO: VirtualTime = VirtualTime(0);

    /// Latest representable instant.
    pub const MAX: VirtualTime = VirtualTime(u64::MAX);

    #[inline]
    pub const fn new(ticks: u64) -> Self {
        VirtualTime(ticks)
    }

    #[inline]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// The instant `delay` ticks after `self`, or `None` on overflow.
    #[inline]
    pub fn plus(self, delay: u64) -> Option<VirtualTime> {
        self.0.checked_add(delay).map(VirtualTime)
    }

    #[inline]
    pub fn is_before(self, other: VirtualTime) -> bool {
        self.0 < other.0
    }

    /// Ticks elapsed since `earlier`. `None` if `earlier` is actually later.
    #[inline]
    pub fn duration_since(self, earlier: VirtualTime) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl From<u64> for VirtualTime {
    fn from(ticks: u64) -> Self {
        VirtualTime(ticks)
    }
}

impl fmt::Display for VirtualTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T={}", self.0)
    }
}
