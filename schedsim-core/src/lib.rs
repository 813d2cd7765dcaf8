//! Schedsim Core - Deterministic CPU/IO scheduling simulation.

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]
//!
//! Processes made of alternating CPU and IO bursts move between a ready
//! queue, a wait queue, a pool of CPU slots and a pool of IO slots under a
//! pluggable scheduling policy. Time is a discrete tick counter and every run
//! is fully reproducible.
//!
//! # Features
//!
//! - **Five Policies**: FCFS, Round Robin, SJF, SRTF and Priority with aging
//! - **Fixed Step Order**: Every policy plugs into the same eight-phase tick
//! - **Structured Trace**: Every transition recorded with a queue snapshot
//! - **Invariant Checking**: Conservation and burst-kind checks after each step
//! - **Statistics**: Throughput, response, waiting, turnaround and utilization
//!
//! # Example
//!
//! ```rust
//! use schedsim_core::{Burst, PolicyConfig, Process, Scheduler, SchedulerConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SchedulerConfig::with_policy(PolicyConfig::round_robin(2));
//! let mut scheduler = Scheduler::new(config)?;
//!
//! scheduler.submit(Process::new("P1", vec![Burst::cpu(5)], 0, 0))?;
//! scheduler.submit(Process::new(
//!     "P2",
//!     vec![Burst::cpu(1), Burst::io("disk", 3), Burst::cpu(1)],
//!     0,
//!     1,
//! ))?;
//!
//! let stats = scheduler.run()?;
//! assert_eq!(stats.finished_count, 2);
//! println!("{}", stats.summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod policy;
pub mod process;
pub mod workload;

pub use config::{ConfigError, PolicyConfig, SchedulerConfig};
pub use engine::{
    EventType, Invariant, InvariantViolation, Scheduler, SchedulerError, SchedulerEvent,
    SchedulerStats, Snapshot,
};
pub use policy::{SchedulingPolicy, build_policy};
pub use process::{Burst, BurstKind, Process, ProcessState};
pub use workload::{ProcessSpec, WorkloadError, parse_workload};
