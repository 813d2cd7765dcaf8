//! Mutable engine data exposed to scheduling policies.

use super::clock::{ClockHandle, SimulationClock};
use super::events::{EventRecorder, EventType, SchedulerEvent};
use super::invariants::InvariantViolation;
use super::resources::ResourceFault;
use super::scheduler::SchedulerError;
use super::state::SchedulerState;
use crate::process::{Process, ProcessState};

/// Everything a policy hook may touch during a step.
///
/// The engine owns one context and lends it to the active policy, which lets
/// policies move processes and record events without re-implementing the
/// tick skeleton.
#[derive(Debug)]
pub struct SchedulerContext {
    clock: SimulationClock,
    /// Queues and resources
    pub state: SchedulerState,
    recorder: EventRecorder,
    context_switches: u64,
}

impl SchedulerContext {
    pub(crate) fn new(num_cpus: usize, num_ios: usize, verbose: bool) -> Self {
        let clock = SimulationClock::new();
        let state = SchedulerState::new(num_cpus, num_ios, clock.handle());
        Self {
            clock,
            state,
            recorder: EventRecorder::new(verbose),
            context_switches: 0,
        }
    }

    /// Current tick.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Read-only view of the engine clock.
    pub fn clock_handle(&self) -> ClockHandle {
        self.clock.handle()
    }

    pub(crate) fn advance_clock(&mut self) {
        self.clock.tick();
    }

    /// Events and timeline recorded so far.
    pub fn recorder(&self) -> &EventRecorder {
        &self.recorder
    }

    /// CPU dispatches performed so far.
    pub fn context_switches(&self) -> u64 {
        self.context_switches
    }

    /// Returns the context to time zero with empty containers.
    pub(crate) fn reset(&mut self) {
        let num_cpus = self.state.cpus.len();
        let num_ios = self.state.io_devices.len();
        self.clock.reset();
        self.state = SchedulerState::new(num_cpus, num_ios, self.clock.handle());
        self.recorder.clear();
        self.context_switches = 0;
    }

    /// Appends an event with a snapshot of the current containers.
    pub fn record(
        &mut self,
        event_type: EventType,
        description: impl Into<String>,
        process_id: Option<&str>,
        device_id: Option<&str>,
    ) {
        let event = SchedulerEvent {
            time: self.now(),
            description: description.into(),
            event_type,
            process_id: process_id.map(str::to_string),
            device_id: device_id.map(str::to_string),
            snapshot: self.state.snapshot(),
        };
        self.recorder.record(event);
    }

    pub(crate) fn note_snapshot(&mut self) {
        let snapshot = self.state.snapshot();
        self.recorder.note_snapshot(&snapshot);
    }

    /// Builds a violation stamped with the current tick and containers.
    pub fn violation(
        &self,
        invariant: &str,
        description: impl Into<String>,
    ) -> InvariantViolation {
        InvariantViolation::new(invariant, description, &self.state)
    }

    fn resource_fault(&self, fault: ResourceFault) -> SchedulerError {
        let violation = match &fault {
            ResourceFault::Busy {
                device, incoming, ..
            } => self
                .violation("ExclusiveAssignment", fault.to_string())
                .with_process(incoming.clone())
                .with_device(device.clone()),
            ResourceFault::BurstMismatch { device, pid, .. } => self
                .violation("DeviceBurst", fault.to_string())
                .with_process(pid.clone())
                .with_device(device.clone()),
        };
        violation.into()
    }

    /// Assigns `process` to CPU `cpu` and counts a context switch.
    ///
    /// # Errors
    /// - `SchedulerError::InvariantViolation` - The CPU does not exist, is
    ///   busy, or the process is not on a CPU burst
    pub fn dispatch_cpu(&mut self, cpu: usize, mut process: Process) -> Result<(), SchedulerError> {
        let pid = process.pid().to_string();
        if cpu >= self.state.cpus.len() {
            return Err(self
                .violation("ExclusiveAssignment", format!("CPU{cpu} does not exist"))
                .with_process(pid)
                .into());
        }
        let resource = &mut self.state.cpus[cpu];
        let label = resource.label();

        process.mark_dispatched(self.clock.now());
        if let Err(fault) = resource.assign(process) {
            return Err(self.resource_fault(fault));
        }

        self.context_switches += 1;
        self.record(
            EventType::DispatchCpu,
            format!("{pid} dispatched to {label}"),
            Some(&pid),
            Some(&label),
        );
        Ok(())
    }

    /// Assigns `process` to IO device `io`.
    ///
    /// # Errors
    /// - `SchedulerError::InvariantViolation` - The device does not exist, is
    ///   busy, or the process is not on an IO burst
    pub fn dispatch_io(&mut self, io: usize, process: Process) -> Result<(), SchedulerError> {
        let pid = process.pid().to_string();
        if io >= self.state.io_devices.len() {
            return Err(self
                .violation("ExclusiveAssignment", format!("IO{io} does not exist"))
                .with_process(pid)
                .into());
        }
        let resource = &mut self.state.io_devices[io];
        let label = resource.label();

        if let Err(fault) = resource.assign(process) {
            return Err(self.resource_fault(fault));
        }

        self.record(
            EventType::DispatchIo,
            format!("{pid} dispatched to {label}"),
            Some(&pid),
            Some(&label),
        );
        Ok(())
    }

    /// Detaches the running process from CPU `cpu` and marks it ready.
    ///
    /// The caller decides where the process goes next.
    ///
    /// # Errors
    /// - `SchedulerError::InvariantViolation` - The CPU is idle or its
    ///   process is not on a CPU burst
    pub fn preempt_cpu(&mut self, cpu: usize) -> Result<Process, SchedulerError> {
        let occupant = self.state.cpus.get(cpu).map(|resource| {
            (
                resource.label(),
                resource
                    .current()
                    .map(|p| (p.pid().to_string(), p.cpu_remaining().is_some())),
            )
        });

        let label = match occupant {
            Some((label, Some((_, true)))) => label,
            Some((label, Some((pid, false)))) => {
                return Err(self
                    .violation("Preemption", format!("{pid} is not on a CPU burst"))
                    .with_process(pid)
                    .with_device(label)
                    .into());
            }
            Some((label, None)) => {
                return Err(self
                    .violation("Preemption", format!("{label} has no process to preempt"))
                    .with_device(label)
                    .into());
            }
            None => {
                return Err(self
                    .violation("Preemption", format!("CPU{cpu} does not exist"))
                    .into());
            }
        };

        let Some(mut process) = self.state.cpus[cpu].detach() else {
            return Err(self
                .violation("Preemption", format!("{label} lost its process"))
                .with_device(label)
                .into());
        };
        process.set_state(ProcessState::Ready);
        tracing::debug!(
            tick = self.now(),
            pid = process.pid(),
            device = %label,
            remaining = process.cpu_remaining(),
            "Process preempted"
        );
        Ok(process)
    }
}
