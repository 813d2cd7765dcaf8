//! CPU and IO slots that work down one process burst per tick.

use std::fmt;

use thiserror::Error;

use super::clock::ClockHandle;
use crate::process::{BurstKind, Process, ProcessState};

/// Types of resources a process can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// Processor slot
    Cpu,
    /// IO device slot
    Io,
}

impl ResourceType {
    /// Burst kind this resource is able to serve.
    pub fn serves(self) -> BurstKind {
        match self {
            ResourceType::Cpu => BurstKind::Cpu,
            ResourceType::Io => BurstKind::Io,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::Cpu => write!(f, "CPU"),
            ResourceType::Io => write!(f, "IO"),
        }
    }
}

/// Rejected resource assignment.
///
/// Either case means the engine tried an illegal transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceFault {
    /// Resource already holds a process
    #[error("{device} is busy with {occupant}, cannot accept {incoming}")]
    Busy {
        /// Resource label
        device: String,
        /// Process already assigned
        occupant: String,
        /// Process that was refused
        incoming: String,
    },

    /// Head burst of the process cannot run on this resource
    #[error("{device} cannot serve {pid}: head burst is {found}")]
    BurstMismatch {
        /// Resource label
        device: String,
        /// Process that was refused
        pid: String,
        /// Kind of its head burst, or `none`
        found: String,
    },
}

/// A single CPU or IO slot.
///
/// Holds at most one process and counts down its head burst. The process is
/// owned by the slot while assigned, so it cannot sit in a queue at the same
/// time.
#[derive(Debug)]
pub struct Resource {
    id: usize,
    kind: ResourceType,
    current: Option<Process>,
    remaining: u32,
    busy_ticks: u64,
    available_ticks: u64,
    clock: ClockHandle,
}

impl Resource {
    /// Creates an idle resource.
    pub fn new(id: usize, kind: ResourceType, clock: ClockHandle) -> Self {
        Self {
            id,
            kind,
            current: None,
            remaining: 0,
            busy_ticks: 0,
            available_ticks: 0,
            clock,
        }
    }

    /// Index within its pool.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Kind of burst this resource serves.
    pub fn kind(&self) -> ResourceType {
        self.kind
    }

    /// Device label used in events, e.g. `CPU0` or `IO1`.
    pub fn label(&self) -> String {
        format!("{}{}", self.kind, self.id)
    }

    /// Returns true iff a process is assigned.
    pub fn is_busy(&self) -> bool {
        self.current.is_some()
    }

    /// Process currently assigned, if any.
    pub fn current(&self) -> Option<&Process> {
        self.current.as_ref()
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut Process> {
        self.current.as_mut()
    }

    /// Ticks left on the assigned burst.
    pub fn remaining(&self) -> Option<u32> {
        self.current.as_ref().map(|_| self.remaining)
    }

    /// Ticks spent serving a process.
    pub fn busy_ticks(&self) -> u64 {
        self.busy_ticks
    }

    /// Ticks this resource has been ticked at all.
    pub fn available_ticks(&self) -> u64 {
        self.available_ticks
    }

    /// Takes ownership of `process` and starts its head burst.
    ///
    /// # Errors
    ///
    /// - `ResourceFault::Busy` - A process is already assigned
    /// - `ResourceFault::BurstMismatch` - The head burst is missing or of the
    ///   wrong kind for this resource
    pub fn assign(&mut self, mut process: Process) -> Result<(), ResourceFault> {
        if let Some(occupant) = &self.current {
            return Err(ResourceFault::Busy {
                device: self.label(),
                occupant: occupant.pid().to_string(),
                incoming: process.pid().to_string(),
            });
        }

        let head_kind = process.current_burst().map(|burst| burst.kind());
        let remaining = match (head_kind, process.remaining_in_burst()) {
            (Some(kind), Some(remaining)) if kind == self.kind.serves() => remaining,
            _ => {
                return Err(ResourceFault::BurstMismatch {
                    device: self.label(),
                    pid: process.pid().to_string(),
                    found: head_kind.map_or_else(|| "none".to_string(), |k| k.to_string()),
                });
            }
        };

        tracing::trace!(
            tick = self.clock.now(),
            device = %self.label(),
            pid = process.pid(),
            remaining,
            "Resource assigned"
        );

        process.set_state(match self.kind {
            ResourceType::Cpu => ProcessState::Running,
            ResourceType::Io => ProcessState::Waiting,
        });
        self.remaining = remaining;
        self.current = Some(process);
        Ok(())
    }

    /// Works one tick of the assigned burst.
    ///
    /// Returns the process once its burst completes, with the finished burst
    /// already popped from its plan. The caller routes it onward.
    pub fn tick(&mut self) -> Option<Process> {
        self.available_ticks += 1;
        if self.current.is_none() {
            return None;
        }

        self.busy_ticks += 1;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return None;
        }

        let mut process = self.current.take()?;
        process.advance_burst();
        tracing::trace!(
            tick = self.clock.now(),
            device = %self.label(),
            pid = process.pid(),
            "Burst completed"
        );
        Some(process)
    }

    /// Forcibly removes the assigned process before its burst completes.
    ///
    /// The unfinished part of the burst is saved on the process so it
    /// resumes where it stopped.
    pub(crate) fn detach(&mut self) -> Option<Process> {
        let mut process = self.current.take()?;
        process.save_progress(self.remaining);
        self.remaining = 0;
        Some(process)
    }
}
