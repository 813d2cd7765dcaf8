//! First come, first served.

use super::SchedulingPolicy;
use crate::engine::{SchedulerContext, SchedulerError};
use crate::process::Process;

/// Tail insertion and head dispatch. The base behavior every other policy
/// refines.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstComeFirstServed;

impl SchedulingPolicy for FirstComeFirstServed {
    fn name(&self) -> &'static str {
        "First Come First Serve"
    }

    fn on_enqueue(
        &mut self,
        ctx: &mut SchedulerContext,
        process: Process,
    ) -> Result<(), SchedulerError> {
        ctx.state.ready_queue.push_back(process);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_support::*;

    #[test]
    fn test_enqueue_appends_and_dispatches_head() {
        let mut ctx = SchedulerContext::new(1, 1, false);
        let mut policy = FirstComeFirstServed;

        policy.on_enqueue(&mut ctx, cpu_process("P2", 1, 0, 0)).unwrap();
        policy.on_enqueue(&mut ctx, cpu_process("P1", 9, 0, 0)).unwrap();
        policy.on_requeue(&mut ctx, cpu_process("P3", 1, 0, 0)).unwrap();
        assert_eq!(ready_pids(&ctx), vec!["P2", "P1", "P3"]);

        let next = policy.select_next(&mut ctx).unwrap();
        assert_eq!(next.pid(), "P2");
    }

    #[test]
    fn test_preempt_check_is_noop() {
        let mut ctx = SchedulerContext::new(1, 1, false);
        let mut policy = FirstComeFirstServed;
        ctx.dispatch_cpu(0, cpu_process("P1", 3, 0, 0)).unwrap();
        policy.on_enqueue(&mut ctx, cpu_process("P2", 1, 0, 0)).unwrap();

        policy.on_preempt_check(&mut ctx).unwrap();
        assert!(ctx.state.cpus[0].is_busy());
        assert_eq!(ready_pids(&ctx), vec!["P2"]);
    }
}
