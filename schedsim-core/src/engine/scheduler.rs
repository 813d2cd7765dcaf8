//! Tick-driven scheduler engine.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::clock::ClockHandle;
use super::context::SchedulerContext;
use super::events::{EventType, SchedulerEvent};
use super::invariants::{ConservationInvariant, DeviceBurstInvariant, Invariant, InvariantViolation};
use super::resources::ResourceType;
use super::state::{SchedulerState, Snapshot};
use super::stats::SchedulerStats;
use crate::config::{ConfigError, SchedulerConfig};
use crate::policy::{SchedulingPolicy, build_policy};
use crate::process::{Burst, BurstKind, Process, ProcessState};
use crate::workload::WorkloadError;

/// Errors that can occur while building or running a scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Construction parameters out of range
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// Engine defect detected, the run cannot continue
    #[error("{0}")]
    InvariantViolation(Box<InvariantViolation>),

    /// Process rejected at submission
    #[error("Invalid workload: {0}")]
    Workload(#[from] WorkloadError),
}

impl From<InvariantViolation> for SchedulerError {
    fn from(violation: InvariantViolation) -> Self {
        SchedulerError::InvariantViolation(Box::new(violation))
    }
}

/// Discrete-time CPU/IO scheduler.
///
/// Every step runs the same fixed phases:
///
/// 1. Tick CPUs and route released processes
/// 2. Tick IO devices and route released processes
/// 3. Policy preemption and reordering
/// 4. Dispatch idle CPUs from the ready queue
/// 5. Dispatch idle IO devices from the wait queue
/// 6. Account ready and wait residency
/// 7. Record the step snapshot
/// 8. Check invariants and advance the clock
///
/// Resources are only ticked when the previous tick was a step as well. The
/// first step of a busy period has nothing in flight to work.
pub struct Scheduler {
    config: SchedulerConfig,
    policy: Box<dyn SchedulingPolicy>,
    ctx: SchedulerContext,
    /// Submitted processes not yet admitted, ordered by arrival time
    pending: VecDeque<Process>,
    /// Processes submitted or admitted since the last reset
    known: usize,
    invariants: Vec<Arc<dyn Invariant>>,
    last_step: Option<u64>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("policy", &self.policy.name())
            .field("now", &self.ctx.now())
            .field("pending", &self.pending.len())
            .field("known", &self.known)
            .field("finished", &self.ctx.state.finished.len())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Creates a scheduler running the policy named in `config`.
    ///
    /// # Errors
    /// - `SchedulerError::Configuration` - Device counts or policy parameters
    ///   out of range
    pub fn new(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        let policy = build_policy(&config.policy);
        Self::with_policy(config, policy)
    }

    /// Creates a scheduler driving a caller-supplied policy.
    ///
    /// `config.policy` is only used for validation and display.
    ///
    /// # Errors
    /// - `SchedulerError::Configuration` - Device counts or policy parameters
    ///   out of range
    pub fn with_policy(
        config: SchedulerConfig,
        policy: Box<dyn SchedulingPolicy>,
    ) -> Result<Self, SchedulerError> {
        config.validate()?;

        let mut invariants: Vec<Arc<dyn Invariant>> = Vec::new();
        if config.check_invariants {
            invariants.push(Arc::new(ConservationInvariant));
            invariants.push(Arc::new(DeviceBurstInvariant));
        }

        tracing::debug!(
            policy = policy.name(),
            cpus = config.num_cpus,
            ios = config.num_ios,
            verbose = config.verbose,
            "Scheduler created"
        );

        Ok(Self {
            ctx: SchedulerContext::new(config.num_cpus, config.num_ios, config.verbose),
            config,
            policy,
            pending: VecDeque::new(),
            known: 0,
            invariants,
            last_step: None,
        })
    }

    /// Adds an invariant checked after every step.
    pub fn add_invariant(&mut self, invariant: Arc<dyn Invariant>) {
        self.invariants.push(invariant);
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Display name of the active policy.
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Admits `process` immediately, regardless of its arrival time.
    ///
    /// A process whose next burst is CPU work goes to the ready queue in the
    /// policy's order. One starting with IO goes to the wait queue and one
    /// with no bursts finishes at once.
    ///
    /// # Errors
    /// - `SchedulerError::Workload` - Duplicate pid or zero-length burst
    /// - `SchedulerError::InvariantViolation` - The policy could not order it
    pub fn add_process(&mut self, process: Process) -> Result<(), SchedulerError> {
        self.accept(&process)?;
        self.known += 1;
        self.admit(process)
    }

    /// Queues `process` for admission once the clock reaches its arrival
    /// time. Used by [`Scheduler::run`].
    ///
    /// # Errors
    /// - `SchedulerError::Workload` - Duplicate pid or zero-length burst
    pub fn submit(&mut self, process: Process) -> Result<(), SchedulerError> {
        self.accept(&process)?;
        let arrival = process.arrival_time();
        let index = self
            .pending
            .iter()
            .position(|queued| queued.arrival_time() > arrival)
            .unwrap_or(self.pending.len());
        self.pending.insert(index, process);
        self.known += 1;
        Ok(())
    }

    /// Submits every process, keeping input order among equal arrivals.
    ///
    /// # Errors
    /// Stops at the first rejected process, see [`Scheduler::submit`].
    pub fn submit_all(
        &mut self,
        processes: impl IntoIterator<Item = Process>,
    ) -> Result<(), SchedulerError> {
        for process in processes {
            self.submit(process)?;
        }
        Ok(())
    }

    fn accept(&self, process: &Process) -> Result<(), SchedulerError> {
        let pid = process.pid();
        let duplicate = self.ctx.state.admitted.contains(pid)
            || self.pending.iter().any(|queued| queued.pid() == pid);
        if duplicate {
            return Err(WorkloadError::DuplicatePid {
                pid: pid.to_string(),
            }
            .into());
        }

        if let Some(index) = process.bursts().iter().position(|b| b.duration() == 0) {
            return Err(WorkloadError::ZeroDuration {
                pid: pid.to_string(),
                index,
            }
            .into());
        }
        Ok(())
    }

    fn admit(&mut self, mut process: Process) -> Result<(), SchedulerError> {
        let pid = process.pid().to_string();
        self.ctx.state.admitted.insert(pid.clone());

        match process.current_burst().map(Burst::kind) {
            Some(BurstKind::Cpu) => {
                process.set_state(ProcessState::Ready);
                self.policy.on_enqueue(&mut self.ctx, process)?;
                self.ctx.record(
                    EventType::Enqueue,
                    format!("{pid} added to ready queue"),
                    Some(&pid),
                    None,
                );
            }
            Some(BurstKind::Io) => {
                process.set_state(ProcessState::Waiting);
                self.ctx.state.wait_queue.push_back(process);
                self.ctx.record(
                    EventType::Enqueue,
                    format!("{pid} added to wait queue"),
                    Some(&pid),
                    None,
                );
            }
            None => self.finish(process, None),
        }
        Ok(())
    }

    fn admit_arrivals(&mut self) -> Result<(), SchedulerError> {
        let now = self.ctx.now();
        while self
            .pending
            .front()
            .is_some_and(|process| process.arrival_time() <= now)
        {
            if let Some(process) = self.pending.pop_front() {
                self.admit(process)?;
            }
        }
        Ok(())
    }

    /// Runs one tick of the simulation.
    ///
    /// # Errors
    /// - `SchedulerError::InvariantViolation` - A transfer or post-step check
    ///   failed. The engine state is left as it was at detection.
    pub fn step(&mut self) -> Result<(), SchedulerError> {
        let now = self.ctx.now();

        if self.last_step.is_some_and(|last| last + 1 == now) {
            self.tick_resources(ResourceType::Cpu)?;
            self.tick_resources(ResourceType::Io)?;
        }

        self.policy.on_preempt_check(&mut self.ctx)?;
        self.dispatch_cpus()?;
        self.dispatch_ios()?;

        self.ctx.state.record_residency();
        self.ctx
            .record(EventType::Tick, format!("step {now}"), None, None);
        self.ctx.note_snapshot();

        self.check_invariants()?;
        self.last_step = Some(now);
        self.ctx.advance_clock();
        Ok(())
    }

    fn tick_resources(&mut self, kind: ResourceType) -> Result<(), SchedulerError> {
        let count = match kind {
            ResourceType::Cpu => self.ctx.state.cpus.len(),
            ResourceType::Io => self.ctx.state.io_devices.len(),
        };

        for index in 0..count {
            let resource = match kind {
                ResourceType::Cpu => &mut self.ctx.state.cpus[index],
                ResourceType::Io => &mut self.ctx.state.io_devices[index],
            };
            if let Some(process) = resource.tick() {
                let label = resource.label();
                self.route_released(kind, &label, process)?;
            }
        }
        Ok(())
    }

    /// Sends a process whose burst just completed to its next container.
    fn route_released(
        &mut self,
        from: ResourceType,
        label: &str,
        mut process: Process,
    ) -> Result<(), SchedulerError> {
        let pid = process.pid().to_string();

        match process.current_burst().map(Burst::kind) {
            Some(BurstKind::Io) => {
                process.set_state(ProcessState::Waiting);
                self.ctx.state.wait_queue.push_back(process);
                let event_type = match from {
                    ResourceType::Cpu => EventType::CpuToIo,
                    ResourceType::Io => EventType::IoToIo,
                };
                self.ctx.record(
                    event_type,
                    format!("{pid} moved from {label} to wait queue"),
                    Some(&pid),
                    Some(label),
                );
            }
            Some(BurstKind::Cpu) => {
                process.set_state(ProcessState::Ready);
                self.policy.on_requeue(&mut self.ctx, process)?;
                let event_type = match from {
                    ResourceType::Cpu => EventType::CpuToReady,
                    ResourceType::Io => EventType::IoToReady,
                };
                self.ctx.record(
                    event_type,
                    format!("{pid} moved from {label} to ready queue"),
                    Some(&pid),
                    Some(label),
                );
            }
            None => self.finish(process, Some(label)),
        }
        Ok(())
    }

    fn finish(&mut self, mut process: Process, device: Option<&str>) {
        process.mark_finished(self.ctx.now());
        let pid = process.pid().to_string();
        let description = format!(
            "{pid} finished (turnaround {}, waited {})",
            process.turnaround_time(),
            process.wait_time()
        );
        self.ctx.state.finished.push(process);
        self.ctx
            .record(EventType::Finished, description, Some(&pid), device);
    }

    fn dispatch_cpus(&mut self) -> Result<(), SchedulerError> {
        for index in 0..self.ctx.state.cpus.len() {
            if self.ctx.state.cpus[index].is_busy() {
                continue;
            }
            let Some(process) = self.policy.select_next(&mut self.ctx) else {
                break;
            };
            self.ctx.dispatch_cpu(index, process)?;
        }
        Ok(())
    }

    fn dispatch_ios(&mut self) -> Result<(), SchedulerError> {
        for index in 0..self.ctx.state.io_devices.len() {
            if self.ctx.state.io_devices[index].is_busy() {
                continue;
            }
            let Some(process) = self.ctx.state.wait_queue.pop_front() else {
                break;
            };
            self.ctx.dispatch_io(index, process)?;
        }
        Ok(())
    }

    fn check_invariants(&self) -> Result<(), SchedulerError> {
        for invariant in &self.invariants {
            if let Err(violation) = invariant.check(&self.ctx.state) {
                tracing::error!(
                    invariant = invariant.name(),
                    tick = violation.tick,
                    process = violation.process_id.as_deref(),
                    device = violation.device_id.as_deref(),
                    "{}",
                    violation.description
                );
                return Err(violation.into());
            }
        }
        Ok(())
    }

    /// Returns true once every known process has finished.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty() && self.ctx.state.finished.len() == self.known
    }

    /// Runs until every known process has finished.
    ///
    /// Each tick first admits submitted processes whose arrival time has come.
    /// Ticks where nothing is queued or running only advance the clock.
    ///
    /// # Errors
    /// - `SchedulerError::InvariantViolation` - The run was aborted
    pub fn run(&mut self) -> Result<SchedulerStats, SchedulerError> {
        tracing::info!(
            policy = self.policy.name(),
            processes = self.known,
            cpus = self.config.num_cpus,
            ios = self.config.num_ios,
            "Simulation starting"
        );

        if let Err(err) = self.run_to_completion() {
            tracing::error!(tick = self.ctx.now(), "Simulation aborted: {err}");
            return Err(err);
        }

        let stats = self.stats();
        tracing::info!(
            policy = self.policy.name(),
            total_time = stats.total_time,
            finished = stats.finished_count,
            context_switches = stats.context_switches,
            "Simulation complete"
        );
        Ok(stats)
    }

    fn run_to_completion(&mut self) -> Result<(), SchedulerError> {
        loop {
            self.admit_arrivals()?;
            if self.is_complete() {
                return Ok(());
            }

            if !self.ctx.state.is_idle() {
                self.step()?;
            } else if !self.pending.is_empty() {
                self.ctx.advance_clock();
            } else {
                let finished = self.ctx.state.finished.len();
                return Err(self
                    .ctx
                    .violation(
                        "Conservation",
                        format!(
                            "engine idle with {finished} of {} processes finished",
                            self.known
                        ),
                    )
                    .into());
            }
        }
    }

    /// Returns the engine to time zero with empty containers, dropping any
    /// pending arrivals and the recorded trace.
    pub fn reset(&mut self) {
        self.ctx.reset();
        self.pending.clear();
        self.known = 0;
        self.last_step = None;
    }

    /// Statistics as of the current tick.
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats::compute(
            self.policy.name(),
            self.ctx.now(),
            &self.ctx.state.cpus,
            &self.ctx.state.io_devices,
            &self.ctx.state.finished,
            self.ctx.context_switches(),
        )
    }

    /// Every event recorded so far, in order.
    pub fn events(&self) -> &[SchedulerEvent] {
        self.ctx.recorder().events()
    }

    /// Number of recorded events per event type name.
    pub fn event_counts(&self) -> BTreeMap<&'static str, u64> {
        self.ctx.recorder().counts_by_type()
    }

    /// Human-readable trace, one line per event.
    pub fn timeline(&self) -> String {
        self.ctx.recorder().timeline()
    }

    /// Current queue contents and resource occupancy.
    pub fn snapshot(&self) -> Snapshot {
        self.ctx.state.snapshot()
    }

    /// Read-only view of the engine containers.
    pub fn state(&self) -> &SchedulerState {
        &self.ctx.state
    }

    /// Finished processes in completion order.
    pub fn finished(&self) -> &[Process] {
        &self.ctx.state.finished
    }

    /// CPU dispatches performed so far.
    pub fn context_switches(&self) -> u64 {
        self.ctx.context_switches()
    }

    /// Current tick.
    pub fn now(&self) -> u64 {
        self.ctx.now()
    }

    /// Read-only view of the engine clock.
    pub fn clock(&self) -> ClockHandle {
        self.ctx.clock_handle()
    }

    /// Submitted processes still waiting for their arrival time.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}
