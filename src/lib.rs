//! # simdes — minimal discrete-event simulation engine
//!
//! A scheduler that advances a logical clock by jumping to the timestamp
//! of the next pending event, hands that event to the entity that owns
//! it, and lets the entity react by scheduling more events. Single
//! threaded, no wall-clock time: the same inputs always give the same run.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │          Scheduler            │ ← clock, horizon, run loop
//! │  ┌────────────────────────┐  │
//! │  │   PendingEventStore     │  │ ← min-heap, FIFO among ties
//! │  │  ┌──────────────────┐  │  │
//! │  │  │      Events       │  │  │ ← (timestamp, owner, kind)
//! │  │  └──────────────────┘  │  │
//! │  └────────────────────────┘  │
//! └──────────────┬───────────────┘
//!                │ receive_event(ctx, event)
//!        ┌───────▼────────┐
//!        │ ReactiveEntity  │ ← schedules follow-ups through ctx
//!        └────────────────┘
//! ```

pub mod agent;
pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod scheduler;
pub mod store;
pub mod time;

// Re-exports for convenience.
pub use config::SimulationConfig;
pub use entity::{EntityId, EntityRef, Owner, ReactiveEntity};
pub use error::{SimError, SimResult};
pub use event::{Event, EventId, EventKind};
pub use scheduler::{
    DeliveryRecord, RunOutcome, RunSummary, Scheduler, SchedulerContext, SchedulerState,
};
pub use store::PendingEventStore;
pub use time::VirtualTime;
