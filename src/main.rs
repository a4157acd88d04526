//! simdes demo CLI
//!
//! Runs a small fleet of reporting agents until the horizon.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use simdes::agent::Agent;
use simdes::config::DEFAULT_HORIZON;
use simdes::{EntityId, ReactiveEntity, RunOutcome, Scheduler, SimulationConfig};

#[derive(Parser, Debug)]
#[command(name = "simdes", about = "Discrete-event simulation demo")]
struct Args {
    /// Maximum simulation time
    #[arg(long, default_value_t = DEFAULT_HORIZON)]
    horizon: u64,

    /// Agent ids, comma separated
    #[arg(long, value_delimiter = ',', default_values_t = vec![0u64, 7])]
    agents: Vec<u64>,

    /// Seed for the agents' random report gaps
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Largest gap between two reports of one agent
    #[arg(long, default_value_t = 10)]
    max_gap: u64,

    /// Print every delivery after the run
    #[arg(long)]
    trace: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = SimulationConfig::new(args.horizon).with_trace(args.trace);

    let mut sched = Scheduler::with_config(&config).on_horizon(|t| {
        println!("Max time of {} has been reached. Simulation is terminating.", t.ticks());
    });

    let mut fleet = Vec::with_capacity(args.agents.len());
    for id in &args.agents {
        let agent = Agent::new(EntityId::new(*id), args.seed, args.max_gap);
        match Agent::spawn(agent, &mut sched) {
            Ok(handle) => fleet.push(handle),
            Err(e) => {
                error!("failed to seed agent {}: {}", id, e);
                std::process::exit(1);
            }
        }
    }

    let summary = match sched.run() {
        Ok(summary) => summary,
        Err(e) => {
            error!("simulation aborted: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(trace) = sched.trace() {
        for record in trace {
            println!("{}", record);
        }
    }

    if args.json {
        let outcome = match summary.outcome {
            RunOutcome::HorizonReached => "horizon_reached",
            RunOutcome::Exhausted => "exhausted",
        };
        let agents: Vec<serde_json::Value> = fleet
            .iter()
            .map(|a| {
                let a = a.borrow();
                serde_json::json!({
                    "id": a.id().raw(),
                    "reports": a.reports.len(),
                    "last_seen": a.last_seen.ticks(),
                })
            })
            .collect();
        let report = serde_json::json!({
            "horizon": args.horizon,
            "seed": args.seed,
            "outcome": outcome,
            "delivered": summary.delivered,
            "late": summary.late,
            "final_time": summary.final_time.ticks(),
            "pending": summary.pending,
            "agents": agents,
        });
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("failed to encode summary: {}", e),
        }
    } else {
        info!(
            "{} events delivered, stopped at {} ({:?}), {} left pending",
            summary.delivered, summary.final_time, summary.outcome, summary.pending
        );
    }
}
