//! `Agent` — a demo entity family that moves, senses and reports.
//!
//! Agents own three kinds of events. `Message` is the only one that keeps
//! an agent busy on its own: each report schedules the next one a random
//! number of ticks later, drawn from the agent's seeded RNG, so two runs
//! with the same seeds produce the same history.

use std::cell::RefCell;
use std::rc::Rc;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::entity::{self, EntityId, Owner, ReactiveEntity};
use crate::error::{EntityFault, SimResult};
use crate::event::{Event, EventId, EventKind};
use crate::scheduler::{Scheduler, SchedulerContext};
use crate::time::VirtualTime;

/// Meaning of an agent's event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum AgentAction {
    Move = 1,
    Sense = 2,
    Message = 3,
}

impl From<AgentAction> for EventKind {
    fn from(action: AgentAction) -> Self {
        EventKind::new(action as u32)
    }
}

impl TryFrom<EventKind> for AgentAction {
    type Error = EventKind;

    fn try_from(kind: EventKind) -> Result<Self, Self::Error> {
        match kind.raw() {
            1 => Ok(AgentAction::Move),
            2 => Ok(AgentAction::Sense),
            3 => Ok(AgentAction::Message),
            _ => Err(kind),
        }
    }
}

/// One status line emitted on a `Message` event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusReport {
    pub time: VirtualTime,
    pub agent: EntityId,
    pub pos_x: f64,
    pub pos_y: f64,
}

impl std::fmt::Display for StatusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Time: {} Agent: {} pos_x: {} pos_y: {}",
            self.time.ticks(),
            self.agent,
            self.pos_x,
            self.pos_y
        )
    }
}

/// A moving agent that reports its position at random intervals.
#[derive(Debug, Clone)]
pub struct Agent {
    id: EntityId,
    /// Time of the last event this agent received.
    pub last_seen: VirtualTime,
    pub pos_x: f64,
    pub pos_y: f64,
    /// Velocity in units per tick.
    pub vel_x: f64,
    pub vel_y: f64,
    last_move: VirtualTime,
    /// Number of `Sense` events handled.
    pub sweeps: u32,
    pub reports: Vec<StatusReport>,
    max_gap: u64,
    rng: ChaCha8Rng,
}

impl Agent {
    /// An agent at the origin. `max_gap` bounds the delay between reports.
    pub fn new(id: EntityId, seed: u64, max_gap: u64) -> Self {
        Agent {
            id,
            last_seen: VirtualTime::ZERO,
            pos_x: 0.0,
            pos_y: 0.0,
            vel_x: 0.0,
            vel_y: 0.0,
            last_move: VirtualTime::ZERO,
            sweeps: 0,
            reports: Vec::new(),
            max_gap: max_gap.max(1),
            rng: ChaCha8Rng::seed_from_u64(seed ^ id.raw()),
        }
    }

    /// Set the velocity applied on each `Move`.
    pub fn with_velocity(mut self, vel_x: f64, vel_y: f64) -> Self {
        self.vel_x = vel_x;
        self.vel_y = vel_y;
        self
    }

    /// Queue the first report at t=1; without it the agent never acts.
    pub fn seed_initial(handle: &Rc<RefCell<Agent>>, sched: &mut Scheduler) -> SimResult<EventId> {
        sched.insert(Event::new(
            VirtualTime::new(1),
            Owner::of(handle),
            AgentAction::Message.into(),
        ))
    }

    /// Share `agent` and queue its first report.
    pub fn spawn(agent: Agent, sched: &mut Scheduler) -> SimResult<Rc<RefCell<Agent>>> {
        let handle = entity::share(agent);
        Self::seed_initial(&handle, sched)?;
        Ok(handle)
    }

    fn on_move(&mut self, now: VirtualTime) {
        let elapsed = now.duration_since(self.last_move).unwrap_or(0) as f64;
        self.pos_x += self.vel_x * elapsed;
        self.pos_y += self.vel_y * elapsed;
        self.last_move = now;
    }

    fn on_sense(&mut self, now: VirtualTime) {
        self.sweeps += 1;
        debug!(agent = %self.id, time = %now, sweep = self.sweeps, "sensor sweep");
    }

    fn on_message(&mut self, ctx: &mut SchedulerContext<'_>, event: &Event) -> SimResult<()> {
        let report = StatusReport {
            time: ctx.now(),
            agent: self.id,
            pos_x: self.pos_x,
            pos_y: self.pos_y,
        };
        info!("{}", report);
        self.reports.push(report);

        let gap = self.rng.gen_range(1..=self.max_gap);
        ctx.schedule_after(gap, event.owner().clone(), AgentAction::Message.into())?;
        Ok(())
    }
}

impl ReactiveEntity for Agent {
    fn id(&self) -> EntityId {
        self.id
    }

    fn receive_event(
        &mut self,
        ctx: &mut SchedulerContext<'_>,
        event: &Event,
    ) -> Result<(), EntityFault> {
        self.last_seen = ctx.now();
        match AgentAction::try_from(event.kind()) {
            Ok(AgentAction::Move) => self.on_move(ctx.now()),
            Ok(AgentAction::Sense) => self.on_sense(ctx.now()),
            Ok(AgentAction::Message) => self.on_message(ctx, event)?,
            Err(kind) => debug!(agent = %self.id, %kind, "ignoring unknown event kind"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_fleet(seed: u64, horizon: u64) -> Vec<Vec<u64>> {
        let mut sched = Scheduler::new(VirtualTime::new(horizon));
        let agents: Vec<_> = [0, 7]
            .into_iter()
            .map(|id| Agent::spawn(Agent::new(EntityId::new(id), seed, 10), &mut sched).unwrap())
            .collect();
        sched.run().unwrap();
        agents
            .iter()
            .map(|a| a.borrow().reports.iter().map(|r| r.time.ticks()).collect())
            .collect()
    }

    #[test]
    fn test_kind_round_trip() {
        for action in [AgentAction::Move, AgentAction::Sense, AgentAction::Message] {
            let kind: EventKind = action.into();
            assert_eq!(AgentAction::try_from(kind), Ok(action));
        }
        assert_eq!(
            AgentAction::try_from(EventKind::new(9)),
            Err(EventKind::new(9))
        );
    }

    #[test]
    fn test_reports_start_at_one_and_respect_gap() {
        let runs = run_fleet(42, 200);
        for times in runs {
            assert_eq!(times.first(), Some(&1));
            for pair in times.windows(2) {
                let gap = pair[1] - pair[0];
                assert!((1..=10).contains(&gap), "gap {} out of range", gap);
            }
            assert!(times.iter().all(|t| *t < 200));
        }
    }

    #[test]
    fn test_same_seed_same_history() {
        assert_eq!(run_fleet(7, 300), run_fleet(7, 300));
    }

    #[test]
    fn test_move_integrates_velocity() {
        let mut sched = Scheduler::new(VirtualTime::new(20));
        let agent = entity::share(Agent::new(EntityId::new(1), 0, 10).with_velocity(2.0, -1.0));
        sched
            .insert(Event::new(
                VirtualTime::new(5),
                Owner::of(&agent),
                AgentAction::Move.into(),
            ))
            .unwrap();
        sched.run().unwrap();

        let a = agent.borrow();
        assert_eq!((a.pos_x, a.pos_y), (10.0, -5.0));
        assert_eq!(a.last_seen, VirtualTime::new(5));
        assert!(a.reports.is_empty());
    }

    #[test]
    fn test_sense_counts_sweeps() {
        let mut sched = Scheduler::new(VirtualTime::new(20));
        let agent = entity::share(Agent::new(EntityId::new(3), 0, 10));
        for t in [2, 8] {
            sched
                .insert(Event::new(
                    VirtualTime::new(t),
                    Owner::of(&agent),
                    AgentAction::Sense.into(),
                ))
                .unwrap();
        }
        sched.run().unwrap();
        assert_eq!(agent.borrow().sweeps, 2);
        assert_eq!(agent.borrow().last_seen, VirtualTime::new(8));
    }

    #[test]
    fn test_unknown_kind_only_updates_clock() {
        let mut sched = Scheduler::new(VirtualTime::new(20));
        let agent = entity::share(Agent::new(EntityId::new(1), 0, 10));
        sched
            .insert(Event::new(VirtualTime::new(4), Owner::of(&agent), EventKind::new(99)))
            .unwrap();
        let summary = sched.run().unwrap();

        assert_eq!(agent.borrow().last_seen, VirtualTime::new(4));
        assert_eq!(summary.delivered, 2);
    }

    #[test]
    fn test_report_display() {
        let r = StatusReport {
            time: VirtualTime::new(3),
            agent: EntityId::new(7),
            pos_x: 0.0,
            pos_y: 1.5,
        };
        assert_eq!(r.to_string(), "Time: 3 Agent: 007 pos_x: 0 pos_y: 1.5");
    }
}
