//! Simulated processes and their burst plans.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;

/// Kind of demand a burst places on the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BurstKind {
    /// Needs a CPU slot
    Cpu,
    /// Needs an IO slot
    Io,
}

impl fmt::Display for BurstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BurstKind::Cpu => write!(f, "CPU"),
            BurstKind::Io => write!(f, "IO"),
        }
    }
}

/// A contiguous unit of CPU or IO demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Burst {
    /// CPU work lasting `duration` ticks
    Cpu {
        /// Length in ticks
        duration: u32,
    },
    /// IO of the given device kind lasting `duration` ticks
    Io {
        /// Device kind, e.g. `disk`
        kind: String,
        /// Length in ticks
        duration: u32,
    },
}

impl Burst {
    /// Creates a CPU burst.
    pub fn cpu(duration: u32) -> Self {
        Burst::Cpu { duration }
    }

    /// Creates an IO burst.
    pub fn io(kind: impl Into<String>, duration: u32) -> Self {
        Burst::Io {
            kind: kind.into(),
            duration,
        }
    }

    /// Returns the full length of the burst in ticks.
    pub fn duration(&self) -> u32 {
        match self {
            Burst::Cpu { duration } | Burst::Io { duration, .. } => *duration,
        }
    }

    /// Returns whether this burst needs a CPU or an IO device.
    pub fn kind(&self) -> BurstKind {
        match self {
            Burst::Cpu { .. } => BurstKind::Cpu,
            Burst::Io { .. } => BurstKind::Io,
        }
    }
}

/// Lifecycle state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Created, not yet admitted
    New,
    /// In the ready queue
    Ready,
    /// On a CPU
    Running,
    /// In the wait queue or on an IO device
    Waiting,
    /// Every burst completed
    Finished,
}

/// A synthetic process moving through the scheduler.
///
/// State and timing fields are only changed by the engine while it moves the
/// process between containers. Outside the crate a process is read-only
/// once handed over.
#[derive(Debug, Clone, Serialize)]
pub struct Process {
    pid: String,
    bursts: VecDeque<Burst>,
    priority: u32,
    arrival_time: u64,
    state: ProcessState,
    wait_time: u64,
    io_time: u64,
    first_run: Option<u64>,
    response_time: u64,
    finish_time: Option<u64>,
    turnaround_time: u64,
    quantum_used: u32,
    /// Ticks left on the head burst after it was interrupted
    burst_remaining: Option<u32>,
}

impl Process {
    /// Creates a new process in the `New` state.
    pub fn new(
        pid: impl Into<String>,
        bursts: Vec<Burst>,
        priority: u32,
        arrival_time: u64,
    ) -> Self {
        Self {
            pid: pid.into(),
            bursts: bursts.into(),
            priority,
            arrival_time,
            state: ProcessState::New,
            wait_time: 0,
            io_time: 0,
            first_run: None,
            response_time: 0,
            finish_time: None,
            turnaround_time: 0,
            quantum_used: 0,
            burst_remaining: None,
        }
    }

    /// Unique process id.
    pub fn pid(&self) -> &str {
        &self.pid
    }

    /// Bursts not yet completed, head first.
    pub fn bursts(&self) -> &VecDeque<Burst> {
        &self.bursts
    }

    /// Current priority. Lower values are scheduled first.
    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Tick the process becomes known to the engine.
    pub fn arrival_time(&self) -> u64 {
        self.arrival_time
    }

    /// Lifecycle state.
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Ticks spent in the ready queue.
    pub fn wait_time(&self) -> u64 {
        self.wait_time
    }

    /// Ticks spent in the wait queue.
    pub fn io_time(&self) -> u64 {
        self.io_time
    }

    /// Tick of the first CPU dispatch, if it happened.
    pub fn first_run(&self) -> Option<u64> {
        self.first_run
    }

    /// Ticks from arrival to first CPU dispatch.
    pub fn response_time(&self) -> u64 {
        self.response_time
    }

    /// Tick the last burst completed, if it did.
    pub fn finish_time(&self) -> Option<u64> {
        self.finish_time
    }

    /// Ticks from arrival to finish.
    pub fn turnaround_time(&self) -> u64 {
        self.turnaround_time
    }

    /// Consecutive CPU ticks used in the current round robin slice.
    pub fn quantum_used(&self) -> u32 {
        self.quantum_used
    }

    /// Peeks the head of the burst plan. `None` means the process is done.
    pub fn current_burst(&self) -> Option<&Burst> {
        self.bursts.front()
    }

    /// Ticks still owed to the head burst, accounting for interruptions.
    pub fn remaining_in_burst(&self) -> Option<u32> {
        let head = self.current_burst()?;
        Some(self.burst_remaining.unwrap_or_else(|| head.duration()))
    }

    /// Remaining ticks of the head burst when it is CPU work.
    pub fn cpu_remaining(&self) -> Option<u32> {
        match self.current_burst()? {
            Burst::Cpu { .. } => self.remaining_in_burst(),
            Burst::Io { .. } => None,
        }
    }

    /// Full length of the head burst when it is CPU work.
    pub fn cpu_burst_duration(&self) -> Option<u32> {
        match self.current_burst()? {
            Burst::Cpu { duration } => Some(*duration),
            Burst::Io { .. } => None,
        }
    }

    /// Returns true once every burst has completed.
    pub fn is_done(&self) -> bool {
        self.bursts.is_empty()
    }

    pub(crate) fn set_state(&mut self, state: ProcessState) {
        self.state = state;
    }

    /// Drops the completed head burst.
    pub(crate) fn advance_burst(&mut self) -> Option<Burst> {
        self.burst_remaining = None;
        self.bursts.pop_front()
    }

    pub(crate) fn save_progress(&mut self, remaining: u32) {
        self.burst_remaining = Some(remaining);
    }

    pub(crate) fn record_wait_tick(&mut self) {
        self.wait_time += 1;
    }

    pub(crate) fn record_io_tick(&mut self) {
        self.io_time += 1;
    }

    /// Records the first CPU dispatch. Later dispatches are ignored.
    pub(crate) fn mark_dispatched(&mut self, now: u64) {
        if self.first_run.is_none() {
            self.first_run = Some(now);
            self.response_time = now.saturating_sub(self.arrival_time);
        }
    }

    pub(crate) fn mark_finished(&mut self, now: u64) {
        self.state = ProcessState::Finished;
        self.finish_time = Some(now);
        self.turnaround_time = now.saturating_sub(self.arrival_time);
    }

    pub(crate) fn use_quantum_tick(&mut self) -> u32 {
        self.quantum_used += 1;
        self.quantum_used
    }

    pub(crate) fn reset_quantum(&mut self) {
        self.quantum_used = 0;
    }

    /// Lowers the priority value by `delta`, floored at zero.
    ///
    /// Returns true if the priority changed.
    pub(crate) fn age(&mut self, delta: u32) -> bool {
        let aged = self.priority.saturating_sub(delta);
        let changed = aged != self.priority;
        self.priority = aged;
        changed
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pid)
    }
}
