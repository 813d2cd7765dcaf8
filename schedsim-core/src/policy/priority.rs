//! Static priority with optional aging.

use super::{SchedulingPolicy, priority_key};
use crate::engine::{EventType, SchedulerContext, SchedulerError};
use crate::process::Process;

/// Non-preemptive priority scheduling. Lower values run first.
///
/// With aging enabled, every `aging_interval` ticks each ready process has
/// its priority value lowered by `aging_delta` (floored at zero) and the
/// queue is re-sorted.
#[derive(Debug, Clone, Copy)]
pub struct PriorityPolicy {
    aging: bool,
    aging_interval: u64,
    aging_delta: u32,
}

impl PriorityPolicy {
    /// Creates the policy. Aging parameters are ignored unless `aging` is set.
    pub fn new(aging: bool, aging_interval: u64, aging_delta: u32) -> Self {
        Self {
            aging,
            aging_interval,
            aging_delta,
        }
    }

    fn aging_due(&self, now: u64) -> bool {
        self.aging && self.aging_interval > 0 && now != 0 && now % self.aging_interval == 0
    }
}

impl SchedulingPolicy for PriorityPolicy {
    fn name(&self) -> &'static str {
        "Priority"
    }

    fn on_enqueue(
        &mut self,
        ctx: &mut SchedulerContext,
        process: Process,
    ) -> Result<(), SchedulerError> {
        let key = priority_key(&process);
        let index = ctx
            .state
            .ready_queue
            .iter()
            .position(|queued| priority_key(queued) > key)
            .unwrap_or(ctx.state.ready_queue.len());
        ctx.state.ready_queue.insert(index, process);
        Ok(())
    }

    fn on_preempt_check(&mut self, ctx: &mut SchedulerContext) -> Result<(), SchedulerError> {
        if !self.aging_due(ctx.now()) || ctx.state.ready_queue.is_empty() {
            return Ok(());
        }

        let mut aged = 0usize;
        for process in &mut ctx.state.ready_queue {
            if process.age(self.aging_delta) {
                aged += 1;
            }
        }
        if aged == 0 {
            return Ok(());
        }

        ctx.state
            .ready_queue
            .make_contiguous()
            .sort_by_cached_key(priority_key);

        tracing::debug!(
            tick = ctx.now(),
            aged,
            delta = self.aging_delta,
            "Ready queue aged"
        );
        ctx.record(
            EventType::Aging,
            format!("aged {aged} ready processes by {}", self.aging_delta),
            None,
            None,
        );
        Ok(())
    }
}
