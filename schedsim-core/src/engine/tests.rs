//! Tests for the scheduler engine.

use std::sync::Arc;

use crate::config::{PolicyConfig, SchedulerConfig};
use crate::engine::{
    EventType, Invariant, InvariantViolation, Scheduler, SchedulerError, SchedulerState,
};
use crate::process::{Burst, Process, ProcessState};
use crate::workload::WorkloadError;

fn fcfs() -> Scheduler {
    Scheduler::new(SchedulerConfig::default()).unwrap()
}

fn cpu_only(pid: &str, duration: u32, arrival: u64) -> Process {
    Process::new(pid, vec![Burst::cpu(duration)], 0, arrival)
}

fn event_types_for(scheduler: &Scheduler, pid: &str) -> Vec<(u64, EventType)> {
    scheduler
        .events()
        .iter()
        .filter(|e| e.process_id.as_deref() == Some(pid))
        .map(|e| (e.time, e.event_type))
        .collect()
}

#[test]
fn test_cpu_io_cpu_plan_is_routed_through_wait_queue() {
    let mut scheduler = fcfs();
    scheduler
        .submit(Process::new(
            "P1",
            vec![Burst::cpu(2), Burst::io("disk", 3), Burst::cpu(1)],
            0,
            0,
        ))
        .unwrap();

    let stats = scheduler.run().unwrap();

    assert_eq!(
        event_types_for(&scheduler, "P1"),
        vec![
            (0, EventType::Enqueue),
            (0, EventType::DispatchCpu),
            (2, EventType::CpuToIo),
            (2, EventType::DispatchIo),
            (5, EventType::IoToReady),
            (5, EventType::DispatchCpu),
            (6, EventType::Finished),
        ]
    );

    let finished = &scheduler.finished()[0];
    assert_eq!(finished.finish_time(), Some(6));
    assert_eq!(finished.wait_time(), 0);
    assert_eq!(finished.io_time(), 0);
    assert_eq!(stats.context_switches, 2);
    assert_eq!(stats.cpu_utilization, 0.5);
}

#[test]
fn test_io_contention_accrues_io_time() {
    let mut scheduler = fcfs();
    scheduler
        .add_process(Process::new("P1", vec![Burst::io("disk", 3)], 0, 0))
        .unwrap();
    scheduler
        .add_process(Process::new("P2", vec![Burst::io("net", 2)], 0, 0))
        .unwrap();
    assert_eq!(scheduler.snapshot().wait, vec!["P1", "P2"]);

    scheduler.run().unwrap();

    let finished: Vec<_> = scheduler
        .finished()
        .iter()
        .map(|p| (p.pid().to_string(), p.finish_time(), p.io_time()))
        .collect();
    assert_eq!(
        finished,
        vec![
            ("P1".to_string(), Some(3), 0),
            ("P2".to_string(), Some(5), 3),
        ]
    );
    assert_eq!(scheduler.context_switches(), 0);
}

#[test]
fn test_io_first_process_is_admitted_to_wait_queue() {
    let mut scheduler = fcfs();
    scheduler
        .add_process(Process::new(
            "P1",
            vec![Burst::io("disk", 2), Burst::cpu(1)],
            0,
            0,
        ))
        .unwrap();

    let snapshot = scheduler.snapshot();
    assert!(snapshot.ready.is_empty());
    assert_eq!(snapshot.wait, vec!["P1"]);
    assert_eq!(
        scheduler.events()[0].description,
        "P1 added to wait queue"
    );
    assert_eq!(
        scheduler.state().wait_queue[0].state(),
        ProcessState::Waiting
    );
}

#[test]
fn test_empty_plan_finishes_on_admission() {
    let mut scheduler = fcfs();
    scheduler.add_process(Process::new("P1", vec![], 0, 0)).unwrap();

    assert!(scheduler.is_complete());
    assert_eq!(scheduler.finished()[0].state(), ProcessState::Finished);
    assert_eq!(scheduler.events()[0].event_type, EventType::Finished);
}

#[test]
fn test_duplicate_pid_is_rejected() {
    let mut scheduler = fcfs();
    scheduler.add_process(cpu_only("P1", 2, 0)).unwrap();
    scheduler.submit(cpu_only("P2", 2, 5)).unwrap();

    for duplicate in ["P1", "P2"] {
        let err = scheduler.submit(cpu_only(duplicate, 1, 0)).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::Workload(WorkloadError::DuplicatePid { ref pid }) if pid == duplicate
        ));
    }
}

#[test]
fn test_zero_length_burst_is_rejected() {
    let mut scheduler = fcfs();
    let err = scheduler
        .add_process(Process::new("P1", vec![Burst::cpu(2), Burst::cpu(0)], 0, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        SchedulerError::Workload(WorkloadError::ZeroDuration { index: 1, .. })
    ));
    assert!(scheduler.state().admitted.is_empty());
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = Scheduler::new(SchedulerConfig::with_devices(0, 1, PolicyConfig::Fcfs)).unwrap_err();
    assert!(matches!(err, SchedulerError::Configuration(_)));

    let err = Scheduler::new(SchedulerConfig::with_policy(PolicyConfig::round_robin(0)))
        .unwrap_err();
    assert!(err.to_string().contains("quantum must be positive"));
}

#[test]
fn test_empty_workload_reports_zero_stats() {
    let mut scheduler = fcfs();
    let stats = scheduler.run().unwrap();

    assert_eq!(stats.total_time, 0);
    assert_eq!(stats.finished_count, 0);
    assert_eq!(stats.throughput, 0.0);
    assert_eq!(stats.avg_waiting_time, 0.0);
    assert_eq!(stats.cpu_utilization, 0.0);
    assert!(scheduler.events().is_empty());
}

#[test]
fn test_cpus_are_dispatched_in_index_order() {
    let config = SchedulerConfig::with_devices(2, 1, PolicyConfig::Fcfs);
    let mut scheduler = Scheduler::new(config).unwrap();
    scheduler
        .submit_all(["P1", "P2", "P3"].map(|pid| cpu_only(pid, 2, 0)))
        .unwrap();

    scheduler.run().unwrap();

    let dispatches: Vec<_> = scheduler
        .events()
        .iter()
        .filter(|e| e.event_type == EventType::DispatchCpu)
        .map(|e| (e.time, e.process_id.clone(), e.device_id.clone()))
        .collect();
    assert_eq!(
        dispatches,
        vec![
            (0, Some("P1".to_string()), Some("CPU0".to_string())),
            (0, Some("P2".to_string()), Some("CPU1".to_string())),
            (2, Some("P3".to_string()), Some("CPU0".to_string())),
        ]
    );

    let order: Vec<_> = scheduler.finished().iter().map(|p| p.pid()).collect();
    assert_eq!(order, vec!["P1", "P2", "P3"]);
}

#[test]
fn test_arrival_gap_advances_clock_without_work() {
    let mut scheduler = fcfs();
    scheduler.submit(cpu_only("P1", 1, 3)).unwrap();
    assert_eq!(scheduler.pending(), 1);

    let stats = scheduler.run().unwrap();

    let process = &scheduler.finished()[0];
    assert_eq!(process.first_run(), Some(3));
    assert_eq!(process.response_time(), 0);
    assert_eq!(process.finish_time(), Some(4));
    assert_eq!(process.turnaround_time(), 1);
    assert_eq!(stats.cpu_utilization, 1.0);
    assert_eq!(scheduler.events()[0].time, 3);
}

#[test]
fn test_step_records_snapshot_event() {
    let mut scheduler = fcfs();
    scheduler.add_process(cpu_only("P1", 3, 0)).unwrap();
    scheduler.add_process(cpu_only("P2", 1, 0)).unwrap();

    scheduler.step().unwrap();

    let last = scheduler.events().last().unwrap();
    assert_eq!(last.event_type, EventType::Tick);
    assert_eq!(last.time, 0);
    assert_eq!(last.snapshot.cpus, vec![Some("P1".to_string())]);
    assert_eq!(last.snapshot.ready, vec!["P2"]);
    assert_eq!(scheduler.now(), 1);
    assert_eq!(scheduler.clock().now(), 1);
}

#[test]
fn test_verbose_timeline() {
    let config = SchedulerConfig {
        verbose: true,
        ..SchedulerConfig::default()
    };
    let mut scheduler = Scheduler::new(config).unwrap();
    scheduler.submit(cpu_only("P1", 1, 0)).unwrap();
    scheduler.run().unwrap();

    let timeline = scheduler.timeline();
    assert!(timeline.contains("time=0   | P1 added to ready queue"));
    assert!(timeline.contains("time=0   | P1 dispatched to CPU0"));
    assert!(timeline.contains("Cpus:[CPU0:P1]"));
    assert!(timeline.contains("time=1   | P1 finished"));
}

#[test]
fn test_event_counts_by_type() {
    let mut scheduler = Scheduler::new(SchedulerConfig::with_policy(PolicyConfig::round_robin(2)))
        .unwrap();
    scheduler.submit(cpu_only("P1", 5, 0)).unwrap();
    scheduler.run().unwrap();

    let counts = scheduler.event_counts();
    assert_eq!(counts.get("enqueue"), Some(&1));
    assert_eq!(counts.get("dispatch_cpu"), Some(&3));
    assert_eq!(counts.get("preempt_cpu"), Some(&2));
    assert_eq!(counts.get("finished"), Some(&1));
    assert_eq!(counts.get("tick"), Some(&6));
}

#[test]
fn test_runs_are_reproducible() {
    let workload = || {
        vec![
            Process::new("A", vec![Burst::cpu(3), Burst::io("disk", 2), Burst::cpu(2)], 1, 0),
            Process::new("B", vec![Burst::cpu(1), Burst::io("net", 4)], 0, 1),
            Process::new("C", vec![Burst::cpu(5)], 2, 2),
        ]
    };
    let config = SchedulerConfig::with_devices(2, 1, PolicyConfig::round_robin(2));

    let mut first = Scheduler::new(config.clone()).unwrap();
    first.submit_all(workload()).unwrap();
    let first_stats = first.run().unwrap();

    let mut second = Scheduler::new(config).unwrap();
    second.submit_all(workload()).unwrap();
    let second_stats = second.run().unwrap();

    assert_eq!(first_stats, second_stats);
    assert_eq!(first.events(), second.events());
}

#[test]
fn test_reset_allows_independent_run() {
    let mut scheduler = Scheduler::new(SchedulerConfig::with_policy(PolicyConfig::ShortestJobFirst))
        .unwrap();
    scheduler
        .submit_all(vec![cpu_only("P1", 4, 0), cpu_only("P2", 2, 0)])
        .unwrap();
    let before = scheduler.run().unwrap();

    scheduler.reset();
    assert_eq!(scheduler.now(), 0);
    assert!(scheduler.finished().is_empty());
    assert!(scheduler.events().is_empty());

    scheduler
        .submit_all(vec![cpu_only("P1", 4, 0), cpu_only("P2", 2, 0)])
        .unwrap();
    let after = scheduler.run().unwrap();
    assert_eq!(before, after);
}

struct ClockLimit(u64);

impl Invariant for ClockLimit {
    fn check(&self, state: &SchedulerState) -> Result<(), InvariantViolation> {
        if state.now() >= self.0 {
            return Err(InvariantViolation::new(
                self.name(),
                format!("clock reached {}", state.now()),
                state,
            ));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "ClockLimit"
    }
}

#[test]
fn test_custom_invariant_aborts_run() {
    let mut scheduler = fcfs();
    scheduler.add_invariant(Arc::new(ClockLimit(2)));
    scheduler.submit(cpu_only("P1", 5, 0)).unwrap();

    let err = scheduler.run().unwrap_err();
    let SchedulerError::InvariantViolation(violation) = err else {
        panic!("expected invariant violation");
    };
    assert_eq!(violation.invariant, "ClockLimit");
    assert_eq!(violation.tick, 2);
    assert_eq!(violation.snapshot.cpus, vec![Some("P1".to_string())]);
    assert_eq!(scheduler.now(), 2);
}

#[test]
fn test_policy_name_and_stats_label() {
    let mut scheduler =
        Scheduler::new(SchedulerConfig::with_policy(PolicyConfig::priority())).unwrap();
    scheduler.submit(cpu_only("P1", 1, 0)).unwrap();
    let stats = scheduler.run().unwrap();

    assert_eq!(scheduler.policy_name(), "Priority");
    assert!(stats.summary().contains("--- Priority Scheduler Statistics ---"));
}
