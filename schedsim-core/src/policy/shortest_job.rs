//! Non-preemptive shortest job first.

use super::{SchedulingPolicy, burst_key, insert_sorted};
use crate::engine::{SchedulerContext, SchedulerError};
use crate::process::Process;

/// Keeps the ready queue sorted by the full length of each process's next
/// CPU burst. Running processes are never interrupted.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShortestJobFirst;

impl SchedulingPolicy for ShortestJobFirst {
    fn name(&self) -> &'static str {
        "Shortest Job First"
    }

    fn on_enqueue(
        &mut self,
        ctx: &mut SchedulerContext,
        process: Process,
    ) -> Result<(), SchedulerError> {
        insert_sorted(ctx, process, burst_key)
    }
}
