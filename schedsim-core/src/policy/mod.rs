//! Scheduling policies plugged into the shared dispatch skeleton.
//!
//! A policy only decides queue order, dispatch selection and preemption. The
//! engine drives the tick phases and calls the hooks at fixed points, so each
//! policy can be exercised on its own against a [`SchedulerContext`].

mod fcfs;
mod priority;
mod round_robin;
mod shortest_job;
mod shortest_remaining;

pub use fcfs::FirstComeFirstServed;
pub use priority::PriorityPolicy;
pub use round_robin::RoundRobin;
pub use shortest_job::ShortestJobFirst;
pub use shortest_remaining::ShortestRemainingTimeFirst;

use crate::config::PolicyConfig;
use crate::engine::{SchedulerContext, SchedulerError};
use crate::process::Process;

/// Hooks a scheduling policy provides to the engine.
pub trait SchedulingPolicy {
    /// Display name used in statistics.
    fn name(&self) -> &'static str;

    /// Inserts a newly admitted process into the ready queue.
    ///
    /// # Errors
    /// Returns `SchedulerError::InvariantViolation` if the process cannot be
    /// ordered by this policy.
    fn on_enqueue(
        &mut self,
        ctx: &mut SchedulerContext,
        process: Process,
    ) -> Result<(), SchedulerError>;

    /// Re-inserts a process whose next burst is CPU work.
    ///
    /// # Errors
    /// Same as [`SchedulingPolicy::on_enqueue`].
    fn on_requeue(
        &mut self,
        ctx: &mut SchedulerContext,
        process: Process,
    ) -> Result<(), SchedulerError> {
        self.on_enqueue(ctx, process)
    }

    /// Reorders or preempts after completed bursts are routed and before new
    /// CPU dispatch.
    ///
    /// # Errors
    /// Returns `SchedulerError::InvariantViolation` on an illegal transfer.
    fn on_preempt_check(&mut self, _ctx: &mut SchedulerContext) -> Result<(), SchedulerError> {
        Ok(())
    }

    /// Removes the next process to run from the ready queue.
    fn select_next(&mut self, ctx: &mut SchedulerContext) -> Option<Process> {
        ctx.state.ready_queue.pop_front()
    }
}

/// Instantiates the policy described by `config`.
pub fn build_policy(config: &PolicyConfig) -> Box<dyn SchedulingPolicy> {
    match *config {
        PolicyConfig::Fcfs => Box::new(FirstComeFirstServed),
        PolicyConfig::RoundRobin { quantum } => Box::new(RoundRobin::new(quantum)),
        PolicyConfig::ShortestJobFirst => Box::new(ShortestJobFirst),
        PolicyConfig::ShortestRemainingTimeFirst => Box::new(ShortestRemainingTimeFirst),
        PolicyConfig::Priority {
            aging,
            aging_interval,
            aging_delta,
        } => Box::new(PriorityPolicy::new(aging, aging_interval, aging_delta)),
    }
}

/// Inserts `process` after every queued process whose key is not greater.
///
/// Equal keys keep arrival order in the queue.
pub(crate) fn insert_sorted<K, F>(
    ctx: &mut SchedulerContext,
    process: Process,
    key: F,
) -> Result<(), SchedulerError>
where
    K: Ord,
    F: Fn(&Process) -> Option<K>,
{
    let Some(new_key) = key(&process) else {
        let pid = process.pid().to_string();
        return Err(ctx
            .violation("OrderedInsert", format!("{pid} has no CPU burst to order by"))
            .with_process(pid)
            .into());
    };

    let mut index = ctx.state.ready_queue.len();
    let mut unkeyed = None;
    for (position, queued) in ctx.state.ready_queue.iter().enumerate() {
        match key(queued) {
            Some(queued_key) if queued_key > new_key => {
                index = position;
                break;
            }
            Some(_) => {}
            None => {
                unkeyed = Some(queued.pid().to_string());
                break;
            }
        }
    }

    if let Some(pid) = unkeyed {
        return Err(ctx
            .violation(
                "OrderedInsert",
                format!("queued {pid} has no CPU burst to order by"),
            )
            .with_process(pid)
            .into());
    }

    ctx.state.ready_queue.insert(index, process);
    Ok(())
}

/// Shortest-job ordering key: burst length, then arrival, then pid.
pub(crate) fn burst_key(process: &Process) -> Option<(u32, u64, String)> {
    Some((
        process.cpu_burst_duration()?,
        process.arrival_time(),
        process.pid().to_string(),
    ))
}

/// Shortest-remaining ordering key: remaining CPU time, then arrival, then pid.
pub(crate) fn remaining_key(process: &Process) -> Option<(u32, u64, String)> {
    Some((
        process.cpu_remaining()?,
        process.arrival_time(),
        process.pid().to_string(),
    ))
}

/// Priority ordering key: priority value, then arrival, then pid.
pub(crate) fn priority_key(process: &Process) -> (u32, u64, String) {
    (
        process.priority(),
        process.arrival_time(),
        process.pid().to_string(),
    )
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::process::Burst;

    #[test]
    fn test_insert_sorted_places_by_key_and_keeps_ties_stable() {
        let mut ctx = SchedulerContext::new(1, 1, false);
        for process in [
            cpu_process("P3", 5, 0, 0),
            cpu_process("P1", 2, 0, 0),
            cpu_process("P2", 5, 0, 0),
            cpu_process("P4", 1, 0, 7),
        ] {
            insert_sorted(&mut ctx, process, burst_key).unwrap();
        }

        assert_eq!(ready_pids(&ctx), vec!["P4", "P1", "P2", "P3"]);
    }

    #[test]
    fn test_insert_sorted_rejects_io_head() {
        let mut ctx = SchedulerContext::new(1, 1, false);
        let process = Process::new("P1", vec![Burst::io("disk", 2)], 0, 0);

        let err = insert_sorted(&mut ctx, process, remaining_key).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::InvariantViolation(ref v) if v.invariant == "OrderedInsert"
        ));
    }

    #[test]
    fn test_build_policy_names() {
        assert_eq!(build_policy(&PolicyConfig::Fcfs).name(), "First Come First Serve");
        assert_eq!(build_policy(&PolicyConfig::round_robin(2)).name(), "Round Robin");
        assert_eq!(build_policy(&PolicyConfig::ShortestJobFirst).name(), "Shortest Job First");
        assert_eq!(
            build_policy(&PolicyConfig::ShortestRemainingTimeFirst).name(),
            "Shortest Remaining Time First"
        );
        assert_eq!(build_policy(&PolicyConfig::priority()).name(), "Priority");
    }
}
