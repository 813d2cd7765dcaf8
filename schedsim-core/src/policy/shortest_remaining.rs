//! Preemptive shortest remaining time first.

use super::{SchedulingPolicy, insert_sorted, remaining_key};
use crate::engine::{EventType, SchedulerContext, SchedulerError};
use crate::process::Process;

/// Keeps the ready queue sorted by remaining CPU time and swaps a running
/// process out when the queue head needs strictly less.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShortestRemainingTimeFirst;

impl SchedulingPolicy for ShortestRemainingTimeFirst {
    fn name(&self) -> &'static str {
        "Shortest Remaining Time First"
    }

    fn on_enqueue(
        &mut self,
        ctx: &mut SchedulerContext,
        process: Process,
    ) -> Result<(), SchedulerError> {
        insert_sorted(ctx, process, remaining_key)
    }

    /// Preempts CPUs in index order. Equal remaining times never preempt.
    fn on_preempt_check(&mut self, ctx: &mut SchedulerContext) -> Result<(), SchedulerError> {
        for cpu in 0..ctx.state.cpus.len() {
            // The CPU's counter is authoritative while a burst runs.
            let Some(running_remaining) = ctx.state.cpus[cpu].remaining() else {
                continue;
            };
            let Some(head_remaining) = ctx
                .state
                .ready_queue
                .front()
                .and_then(Process::cpu_remaining)
            else {
                continue;
            };
            if running_remaining <= head_remaining {
                continue;
            }

            let label = ctx.state.cpus[cpu].label();
            let preempted = ctx.preempt_cpu(cpu)?;
            let pid = preempted.pid().to_string();
            ctx.record(
                EventType::PreemptCpu,
                format!(
                    "{pid} preempted from {label} (remaining {running_remaining} > {head_remaining})"
                ),
                Some(&pid),
                Some(&label),
            );
            insert_sorted(ctx, preempted, remaining_key)?;

            if let Some(next) = ctx.state.ready_queue.pop_front() {
                ctx.dispatch_cpu(cpu, next)?;
            }
        }
        Ok(())
    }
}
