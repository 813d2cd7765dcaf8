//! Deterministic scheduling engine.
//!
//! A single [`Scheduler`] owns the clock, the ready and wait queues, the CPU
//! and IO slots, and the finished list. Processes move between them by
//! ownership transfer, so a process is never held by two containers.

mod clock;
mod context;
mod events;
mod invariants;
mod resources;
mod scheduler;
mod state;
mod stats;

pub use clock::{ClockHandle, SimulationClock};
pub use context::SchedulerContext;
pub use events::{EventRecorder, EventType, SchedulerEvent};
pub use invariants::{ConservationInvariant, DeviceBurstInvariant, Invariant, InvariantViolation};
pub use resources::{Resource, ResourceFault, ResourceType};
pub use scheduler::{Scheduler, SchedulerError};
pub use state::{SchedulerState, Snapshot};
pub use stats::SchedulerStats;

#[cfg(test)]
mod tests;
