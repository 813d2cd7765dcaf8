//! Round robin with a fixed time slice.

use super::SchedulingPolicy;
use crate::engine::{EventType, SchedulerContext, SchedulerError};
use crate::process::Process;

/// FIFO queue where a process may hold a CPU for at most `quantum`
/// consecutive ticks before going back to the tail.
#[derive(Debug, Clone, Copy)]
pub struct RoundRobin {
    quantum: u32,
}

impl RoundRobin {
    /// Creates the policy with the given time slice.
    pub fn new(quantum: u32) -> Self {
        Self { quantum }
    }

    /// Time slice in ticks.
    pub fn quantum(&self) -> u32 {
        self.quantum
    }
}

impl SchedulingPolicy for RoundRobin {
    fn name(&self) -> &'static str {
        "Round Robin"
    }

    fn on_enqueue(
        &mut self,
        ctx: &mut SchedulerContext,
        process: Process,
    ) -> Result<(), SchedulerError> {
        ctx.state.ready_queue.push_back(process);
        Ok(())
    }

    /// Charges one tick of slice to every running process and requeues the
    /// ones whose slice is spent.
    ///
    /// Processes that completed their burst this tick were already released
    /// by the CPU and are not charged.
    fn on_preempt_check(&mut self, ctx: &mut SchedulerContext) -> Result<(), SchedulerError> {
        for cpu in 0..ctx.state.cpus.len() {
            let Some(running) = ctx.state.cpus[cpu].current_mut() else {
                continue;
            };
            if running.use_quantum_tick() < self.quantum {
                continue;
            }

            let label = ctx.state.cpus[cpu].label();
            let mut process = ctx.preempt_cpu(cpu)?;
            process.reset_quantum();
            let pid = process.pid().to_string();
            ctx.state.ready_queue.push_back(process);
            ctx.record(
                EventType::PreemptCpu,
                format!("{pid} preempted from {label} after quantum {}", self.quantum),
                Some(&pid),
                Some(&label),
            );
        }
        Ok(())
    }

    fn select_next(&mut self, ctx: &mut SchedulerContext) -> Option<Process> {
        let mut process = ctx.state.ready_queue.pop_front()?;
        process.reset_quantum();
        Some(process)
    }
}
