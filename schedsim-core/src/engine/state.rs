//! Containers that own every process during a run.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use serde::Serialize;

use super::clock::ClockHandle;
use super::resources::{Resource, ResourceType};
use crate::process::Process;

/// Queues, resource pools and the finished list of one engine.
///
/// Each admitted process lives in exactly one of these containers. Moving a
/// process means removing it from its source before inserting it anywhere
/// else, so ownership is never shared.
#[derive(Debug)]
pub struct SchedulerState {
    /// Processes waiting for a CPU
    pub ready_queue: VecDeque<Process>,
    /// Processes waiting for an IO device
    pub wait_queue: VecDeque<Process>,
    /// CPU slots, in index order
    pub cpus: Vec<Resource>,
    /// IO slots, in index order
    pub io_devices: Vec<Resource>,
    /// Completed processes, in completion order
    pub finished: Vec<Process>,
    /// Pids handed to the engine so far
    pub admitted: BTreeSet<String>,
    clock: ClockHandle,
}

impl SchedulerState {
    /// Creates empty containers with the given number of CPU and IO slots.
    pub fn new(num_cpus: usize, num_ios: usize, clock: ClockHandle) -> Self {
        Self {
            ready_queue: VecDeque::new(),
            wait_queue: VecDeque::new(),
            cpus: (0..num_cpus)
                .map(|id| Resource::new(id, ResourceType::Cpu, clock.clone()))
                .collect(),
            io_devices: (0..num_ios)
                .map(|id| Resource::new(id, ResourceType::Io, clock.clone()))
                .collect(),
            finished: Vec::new(),
            admitted: BTreeSet::new(),
            clock,
        }
    }

    /// Current tick of the owning engine.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Returns true if no queue holds a process and every resource is free.
    pub fn is_idle(&self) -> bool {
        self.ready_queue.is_empty()
            && self.wait_queue.is_empty()
            && !self.cpus.iter().any(Resource::is_busy)
            && !self.io_devices.iter().any(Resource::is_busy)
    }

    /// Adds one tick of residency to every queued process.
    pub(crate) fn record_residency(&mut self) {
        for process in &mut self.ready_queue {
            process.record_wait_tick();
        }
        for process in &mut self.wait_queue {
            process.record_io_tick();
        }
    }

    /// Iterates every process currently held, in container order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.ready_queue
            .iter()
            .chain(self.wait_queue.iter())
            .chain(self.cpus.iter().filter_map(Resource::current))
            .chain(self.io_devices.iter().filter_map(Resource::current))
            .chain(self.finished.iter())
    }

    /// Point-in-time view of queue contents and resource occupancy.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            clock: self.now(),
            ready: self
                .ready_queue
                .iter()
                .map(|p| p.pid().to_string())
                .collect(),
            wait: self.wait_queue.iter().map(|p| p.pid().to_string()).collect(),
            cpus: self.cpus.iter().map(occupant).collect(),
            ios: self.io_devices.iter().map(occupant).collect(),
        }
    }
}

fn occupant(resource: &Resource) -> Option<String> {
    resource.current().map(|p| p.pid().to_string())
}

/// Queue and resource occupancy at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Tick the snapshot was taken at
    pub clock: u64,
    /// Ready queue pids, head first
    pub ready: Vec<String>,
    /// Wait queue pids, head first
    pub wait: Vec<String>,
    /// Pid on each CPU by index
    pub cpus: Vec<Option<String>>,
    /// Pid on each IO device by index
    pub ios: Vec<Option<String>>,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  [Ready: {}]  [Wait: {}]  Cpus:[{}]  Ios:[{}]",
            join_or_empty(&self.ready),
            join_or_empty(&self.wait),
            join_slots("CPU", &self.cpus),
            join_slots("IO", &self.ios),
        )
    }
}

fn join_or_empty(pids: &[String]) -> String {
    if pids.is_empty() {
        "empty".to_string()
    } else {
        pids.join(", ")
    }
}

fn join_slots(prefix: &str, slots: &[Option<String>]) -> String {
    slots
        .iter()
        .enumerate()
        .map(|(id, slot)| format!("{prefix}{id}:{}", slot.as_deref().unwrap_or("idle")))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::SimulationClock;
    use crate::process::Burst;

    #[test]
    fn test_snapshot_reflects_containers() {
        let clock = SimulationClock::new();
        let mut state = SchedulerState::new(2, 1, clock.handle());

        state
            .ready_queue
            .push_back(Process::new("P1", vec![Burst::cpu(1)], 0, 0));
        state
            .wait_queue
            .push_back(Process::new("P2", vec![Burst::io("disk", 1)], 0, 0));
        state.cpus[1]
            .assign(Process::new("P3", vec![Burst::cpu(4)], 0, 0))
            .unwrap();

        let snapshot = state.snapshot();
        assert_eq!(snapshot.ready, vec!["P1"]);
        assert_eq!(snapshot.wait, vec!["P2"]);
        assert_eq!(snapshot.cpus, vec![None, Some("P3".to_string())]);
        assert_eq!(snapshot.ios, vec![None]);
        assert!(!state.is_idle());
        assert_eq!(state.processes().count(), 3);
    }

    #[test]
    fn test_snapshot_display_format() {
        let snapshot = Snapshot {
            clock: 3,
            ready: vec!["P1".to_string(), "P2".to_string()],
            wait: Vec::new(),
            cpus: vec![Some("P3".to_string())],
            ios: vec![None],
        };

        assert_eq!(
            snapshot.to_string(),
            "  [Ready: P1, P2]  [Wait: empty]  Cpus:[CPU0:P3]  Ios:[IO0:idle]"
        );
    }

    #[test]
    fn test_residency_accrues_per_queue() {
        let clock = SimulationClock::new();
        let mut state = SchedulerState::new(1, 1, clock.handle());
        state
            .ready_queue
            .push_back(Process::new("P1", vec![Burst::cpu(1)], 0, 0));
        state
            .wait_queue
            .push_back(Process::new("P2", vec![Burst::io("disk", 1)], 0, 0));

        state.record_residency();
        state.record_residency();

        assert_eq!(state.ready_queue[0].wait_time(), 2);
        assert_eq!(state.ready_queue[0].io_time(), 0);
        assert_eq!(state.wait_queue[0].io_time(), 2);
    }
}
