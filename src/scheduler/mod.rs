//! The scheduler: logical clock, pending store and dispatch loop.
//!
//! # Module structure
//!
//! | Sub-module | Contents |
//! |---|---|
//! | [`context`] | [`SchedulerContext`], the scheduling API entities see |
//! | [`trace`] | [`DeliveryRecord`] |
//!
//! # Termination
//!
//! A scheduler seeds one terminal event at its horizon when it is built.
//! `run` keeps delivering the earliest pending event and stops right after
//! delivering one whose timestamp is at or past the horizon, or as soon as
//! the store is empty. The terminal event is therefore always delivered,
//! exactly once, unless the store runs dry first.

pub mod context;
pub mod trace;

pub use context::SchedulerContext;
pub use trace::DeliveryRecord;

use tracing::{info, instrument, warn};

use crate::config::SimulationConfig;
use crate::entity::{EntityId, Owner, ReactiveEntity, Target};
use crate::error::{EntityFault, SimError, SimResult};
use crate::event::{Event, EventId, EventKind};
use crate::store::PendingEventStore;
use crate::time::VirtualTime;


// ── State ─────────────────────────────────────────────────────────────

/// Lifecycle of a scheduler. There is no way back from `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum SchedulerState {
    Constructed,
    Running,
    Terminated,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum RunOutcome {
    /// An event at or past the horizon was delivered.
    HorizonReached,
    /// The store emptied before the horizon.
    Exhausted,
}

/// Totals reported when `run` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub delivered: u64,
    /// Events delivered after their own timestamp had already passed.
    pub late: u64,
    pub final_time: VirtualTime,
    /// Events still queued (never delivered).
    pub pending: usize,
}

// ── Horizon sentinel ──────────────────────────────────────────────────

type HorizonHook = Box<dyn FnMut(VirtualTime)>;

/// The scheduler's own entity: receives the terminal event.
#[derive(Default)]
struct HorizonSentinel {
    reached_at: Option<VirtualTime>,
    hook: Option<HorizonHook>,
}

impl ReactiveEntity for HorizonSentinel {
    fn id(&self) -> EntityId {
        EntityId::SCHEDULER
    }

    fn receive_event(
        &mut self,
        ctx: &mut SchedulerContext<'_>,
        _event: &Event,
    ) -> Result<(), EntityFault> {
        self.reached_at = Some(ctx.now());
        info!(time = %ctx.now(), "max time reached, simulation terminating");
        if let Some(hook) = self.hook.as_mut() {
            hook(ctx.now());
        }
        Ok(())
    }
}

// ── Scheduler ─────────────────────────────────────────────────────────

/// Discrete-event scheduler.
///
/// Owns the pending store and the logical clock. Entities reach it only
/// through [`Scheduler::insert`] before the run and [`SchedulerContext`]
/// during it.
pub struct Scheduler {
    pending: PendingEventStore,
    clock: VirtualTime,
    horizon: VirtualTime,
    state: SchedulerState,
    outcome: Option<RunOutcome>,
    sentinel: HorizonSentinel,
    delivered: u64,
    late: u64,
    trace: Option<Vec<DeliveryRecord>>,
}

impl Scheduler {
    /// Build a scheduler with its terminal event queued at `horizon`.
    pub fn new(horizon: VirtualTime) -> Self {
        let mut pending = PendingEventStore::new();
        pending.push(
            Event::new(horizon, Owner::scheduler(), EventKind::HORIZON),
            Target::Scheduler,
        );
        Scheduler {
            pending,
            clock: VirtualTime::ZERO,
            horizon,
            state: SchedulerState::Constructed,
            outcome: None,
            sentinel: HorizonSentinel::default(),
            delivered: 0,
            late: 0,
            trace: None,
        }
    }

    /// Build a scheduler from a [`SimulationConfig`].
    pub fn with_config(config: &SimulationConfig) -> Self {
        let mut sched = Self::new(config.horizon);
        if config.trace {
            sched.enable_trace();
        }
        sched
    }

    /// Install an end-of-run hook, called once when the terminal event fires.
    pub fn on_horizon<F>(mut self, hook: F) -> Self
    where
        F: FnMut(VirtualTime) + 'static,
    {
        self.sentinel.hook = Some(Box::new(hook));
        self
    }

    /// Start recording a [`DeliveryRecord`] for every delivery.
    pub fn enable_trace(&mut self) {
        self.trace.get_or_insert_with(Vec::new);
    }

    /// Queue an event. This is the only way work enters the simulation.
    pub fn insert(&mut self, event: Event) -> SimResult<EventId> {
        self.pending.insert(event)
    }

    /// Current logical time.
    pub fn now(&self) -> VirtualTime {
        self.clock
    }

    /// Maximum simulation time.
    pub fn horizon(&self) -> VirtualTime {
        self.horizon
    }

    /// Where the scheduler is in its lifecycle.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// `None` until the run ends, and also when it was aborted by a fault.
    pub fn outcome(&self) -> Option<RunOutcome> {
        self.outcome
    }

    /// `true` once the scheduler has terminated, for any reason.
    pub fn is_finished(&self) -> bool {
        self.state == SchedulerState::Terminated
    }

    /// Time at which the terminal event fired, if it has.
    pub fn horizon_reached(&self) -> Option<VirtualTime> {
        self.sentinel.reached_at
    }

    /// Events handed to a receiver so far, terminal event included.
    pub fn events_delivered(&self) -> u64 {
        self.delivered
    }

    /// Events delivered after their timestamp had passed.
    pub fn late_events(&self) -> u64 {
        self.late
    }

    /// The undelivered events.
    pub fn pending(&self) -> &PendingEventStore {
        &self.pending
    }

    /// Recorded deliveries, if tracing was enabled.
    pub fn trace(&self) -> Option<&[DeliveryRecord]> {
        self.trace.as_deref()
    }

    /// Deliver exactly one event.
    ///
    /// Returns `Ok(None)` when the store was already empty; the scheduler is
    /// then terminated. Delivering an event at or past the horizon also
    /// terminates it, after the delivery.
    pub fn step(&mut self) -> SimResult<Option<DeliveryRecord>> {
        match self.state {
            SchedulerState::Terminated => return Err(SimError::AlreadyTerminated),
            SchedulerState::Constructed => self.state = SchedulerState::Running,
            SchedulerState::Running => {}
        }

        if self.pending.is_empty() || self.horizon.is_before(self.clock) {
            self.finish(RunOutcome::Exhausted);
            return Ok(None);
        }

        let next = self.pending.extract_min()?;
        if next.target_busy() {
            let err = SimError::EntityBusy {
                event_id: next.id(),
                time: next.timestamp(),
            };
            self.pending.restore(next);
            self.state = SchedulerState::Terminated;
            return Err(err);
        }

        let (event_id, event, target) = next.into_parts();
        let timestamp = event.timestamp();
        if timestamp.is_before(self.clock) {
            self.late += 1;
            warn!(
                %event_id,
                scheduled = %timestamp,
                now = %self.clock,
                "event scheduled in the past, delivering at current time"
            );
        } else {
            self.clock = timestamp;
        }

        let entity = match self.dispatch(event_id, &event, target) {
            Ok(entity) => entity,
            Err(err) => {
                self.state = SchedulerState::Terminated;
                return Err(err);
            }
        };
        self.delivered += 1;

        let record = DeliveryRecord {
            time: self.clock,
            event_id,
            entity,
            kind: event.kind(),
        };
        if let Some(trace) = self.trace.as_mut() {
            trace.push(record.clone());
        }

        if timestamp >= self.horizon {
            self.finish(RunOutcome::HorizonReached);
        }
        Ok(Some(record))
    }

    /// Run until the horizon is delivered or the store empties.
    ///
    /// An entity fault aborts the run and is returned as
    /// [`SimError::Entity`]; the scheduler is terminated either way. An
    /// event whose receiver is busy stays queued and the clock keeps the
    /// time of the last delivery.
    #[instrument(name = "run", skip(self), fields(horizon = %self.horizon))]
    pub fn run(&mut self) -> SimResult<RunSummary> {
        if self.state == SchedulerState::Terminated {
            return Err(SimError::AlreadyTerminated);
        }
        info!(pending = self.pending.len(), "simulation starting");

        let outcome = loop {
            self.step()?;
            if let Some(outcome) = self.outcome {
                break outcome;
            }
        };

        let summary = RunSummary {
            outcome,
            delivered: self.delivered,
            late: self.late,
            final_time: self.clock,
            pending: self.pending.len(),
        };
        info!(
            ?summary.outcome,
            delivered = summary.delivered,
            final_time = %summary.final_time,
            left_pending = summary.pending,
            "simulation finished"
        );
        Ok(summary)
    }

    fn finish(&mut self, outcome: RunOutcome) {
        self.state = SchedulerState::Terminated;
        self.outcome = Some(outcome);
    }

    /// Hand `event` to its owner; returns the id of whoever received it.
    fn dispatch(&mut self, event_id: EventId, event: &Event, target: Target) -> SimResult<EntityId> {
        let now = self.clock;
        let mut ctx = SchedulerContext {
            store: &mut self.pending,
            now,
            horizon: self.horizon,
            event_id,
        };

        match target {
            Target::Scheduler => {
                tracing::trace!(time = %now, %event_id, "delivering terminal event");
                self.sentinel
                    .receive_event(&mut ctx, event)
                    .map_err(|source| SimError::Entity {
                        entity: EntityId::SCHEDULER,
                        time: now,
                        source,
                    })?;
                Ok(EntityId::SCHEDULER)
            }
            Target::Entity(handle) => {
                let mut entity = handle
                    .try_borrow_mut()
                    .map_err(|_| SimError::EntityBusy { event_id, time: now })?;
                let id = entity.id();
                tracing::trace!(time = %now, %event_id, entity = %id, kind = %event.kind(), "delivering");
                let result = entity
                    .receive_event(&mut ctx, event)
                    .map_err(|source| SimError::Entity {
                        entity: id,
                        time: now,
                        source,
                    });
                drop(entity);
                result.map(|()| id)
            }
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("clock", &self.clock)
            .field("horizon", &self.horizon)
            .field("state", &self.state)
            .field("pending", &self.pending.len())
            .field("delivered", &self.delivered)
            .finish()
    }
}
