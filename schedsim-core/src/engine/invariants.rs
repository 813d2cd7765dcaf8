//! Invariant checking framework for simulation validation.

use std::collections::BTreeMap;
use std::fmt;

use super::state::{SchedulerState, Snapshot};

/// Violation of an engine invariant.
///
/// Carries enough context to diagnose the engine defect that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Name of the violated invariant
    pub invariant: String,
    /// Detailed description of the violation
    pub description: String,
    /// Tick the violation was detected at
    pub tick: u64,
    /// Offending process, if one is known
    pub process_id: Option<String>,
    /// Offending resource, if one is known
    pub device_id: Option<String>,
    /// Queue and resource contents at detection time
    pub snapshot: Snapshot,
}

impl InvariantViolation {
    /// Creates a violation stamped with the state's current tick and contents.
    pub fn new(
        invariant: impl Into<String>,
        description: impl Into<String>,
        state: &SchedulerState,
    ) -> Self {
        let snapshot = state.snapshot();
        Self {
            invariant: invariant.into(),
            description: description.into(),
            tick: snapshot.clock,
            process_id: None,
            device_id: None,
            snapshot,
        }
    }

    /// Attaches the offending process id.
    pub fn with_process(mut self, pid: impl Into<String>) -> Self {
        self.process_id = Some(pid.into());
        self
    }

    /// Attaches the offending device label.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device_id = Some(device.into());
        self
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invariant '{}' violated at tick {}: {}",
            self.invariant, self.tick, self.description
        )?;
        if let Some(pid) = &self.process_id {
            write!(f, " (process {pid})")?;
        }
        if let Some(device) = &self.device_id {
            write!(f, " (device {device})")?;
        }
        write!(f, "\n{}", self.snapshot)
    }
}

/// Trait for checking engine invariants after a step.
pub trait Invariant {
    /// Checks if invariant holds for current state.
    ///
    /// # Errors
    /// Returns `InvariantViolation` if the invariant condition is not met.
    fn check(&self, state: &SchedulerState) -> Result<(), InvariantViolation>;

    /// Returns name of this invariant.
    fn name(&self) -> &str;
}

/// Every admitted process is held by exactly one container.
#[derive(Debug, Default)]
pub struct ConservationInvariant;

impl Invariant for ConservationInvariant {
    fn check(&self, state: &SchedulerState) -> Result<(), InvariantViolation> {
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for process in state.processes() {
            *seen.entry(process.pid()).or_insert(0) += 1;
        }

        if let Some((pid, count)) = seen.iter().find(|(_, count)| **count > 1) {
            return Err(InvariantViolation::new(
                self.name(),
                format!("{pid} is held by {count} containers"),
                state,
            )
            .with_process(*pid));
        }

        if let Some(pid) = state.admitted.iter().find(|pid| !seen.contains_key(pid.as_str())) {
            return Err(InvariantViolation::new(
                self.name(),
                format!("{pid} is not held by any container"),
                state,
            )
            .with_process(pid.clone()));
        }

        if let Some(pid) = seen.keys().find(|pid| !state.admitted.contains(**pid)) {
            return Err(InvariantViolation::new(
                self.name(),
                format!("{pid} is held but was never admitted"),
                state,
            )
            .with_process(*pid));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "Conservation"
    }
}

/// CPU slots hold CPU bursts and IO slots hold IO bursts.
#[derive(Debug, Default)]
pub struct DeviceBurstInvariant;

impl Invariant for DeviceBurstInvariant {
    fn check(&self, state: &SchedulerState) -> Result<(), InvariantViolation> {
        let slots = state.cpus.iter().chain(state.io_devices.iter());
        for resource in slots {
            let Some(process) = resource.current() else {
                continue;
            };
            let head = process.current_burst().map(|burst| burst.kind());
            if head != Some(resource.kind().serves()) {
                let found = head.map_or_else(|| "no".to_string(), |kind| kind.to_string());
                return Err(InvariantViolation::new(
                    self.name(),
                    format!("{} holds a process on a {found} burst", resource.label()),
                    state,
                )
                .with_process(process.pid())
                .with_device(resource.label()));
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "DeviceBurst"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::clock::SimulationClock;
    use crate::process::{Burst, Process};

    fn state_with(clock: &SimulationClock) -> SchedulerState {
        let mut state = SchedulerState::new(1, 1, clock.handle());
        state.admitted.insert("P1".to_string());
        state.admitted.insert("P2".to_string());
        state
            .ready_queue
            .push_back(Process::new("P1", vec![Burst::cpu(2)], 0, 0));
        state.io_devices[0]
            .assign(Process::new("P2", vec![Burst::io("disk", 2)], 0, 0))
            .unwrap();
        state
    }

    #[test]
    fn test_conservation_holds_for_consistent_state() {
        let clock = SimulationClock::new();
        let state = state_with(&clock);
        assert!(ConservationInvariant.check(&state).is_ok());
        assert!(DeviceBurstInvariant.check(&state).is_ok());
    }

    #[test]
    fn test_conservation_detects_duplicate() {
        let clock = SimulationClock::new();
        let mut state = state_with(&clock);
        state
            .wait_queue
            .push_back(Process::new("P1", vec![Burst::cpu(2)], 0, 0));

        let violation = ConservationInvariant.check(&state).unwrap_err();
        assert_eq!(violation.invariant, "Conservation");
        assert_eq!(violation.process_id.as_deref(), Some("P1"));
        assert_eq!(violation.snapshot.wait, vec!["P1"]);
    }

    #[test]
    fn test_conservation_detects_lost_process() {
        let clock = SimulationClock::new();
        let mut state = state_with(&clock);
        state.ready_queue.clear();

        let violation = ConservationInvariant.check(&state).unwrap_err();
        assert!(violation.description.contains("not held"));
    }

    #[test]
    fn test_violation_display_includes_context() {
        let clock = SimulationClock::new();
        let state = state_with(&clock);
        let violation = InvariantViolation::new("Test", "broken", &state)
            .with_process("P1")
            .with_device("CPU0");

        let rendered = violation.to_string();
        assert!(rendered.starts_with("Invariant 'Test' violated at tick 0: broken"));
        assert!(rendered.contains("(process P1)"));
        assert!(rendered.contains("[Ready: P1]"));
    }
}
