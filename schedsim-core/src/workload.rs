//! Decoding of externally generated workloads.
//!
//! The wire shape matches the job generator's JSON output:
//!
//! ```json
//! [{"pid": "P1", "priority": 2, "arrival_time": 0,
//!   "bursts": [{"cpu": 4}, {"io": {"type": "disk", "duration": 3}}, {"cpu": 2}]}]
//! ```
//!
//! Reading the file is the caller's job; this module only decodes text.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::process::{Burst, Process};

/// Errors raised while decoding a workload.
#[derive(Debug, Error)]
pub enum WorkloadError {
    /// Input is not a valid workload document
    #[error("Malformed workload: {0}")]
    Json(#[from] serde_json::Error),

    /// Two processes share a pid
    #[error("Duplicate process id: {pid}")]
    DuplicatePid {
        /// Repeated pid
        pid: String,
    },

    /// A burst would never make progress
    #[error("Process {pid} has a zero-length burst at position {index}")]
    ZeroDuration {
        /// Offending process
        pid: String,
        /// Position of the burst in the plan
        index: usize,
    },
}

/// IO burst parameters as written by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoSpec {
    /// Device kind, e.g. `disk` or `network`
    #[serde(rename = "type")]
    pub kind: String,
    /// Length in ticks
    pub duration: u32,
}

/// One burst record, either `{"cpu": n}` or `{"io": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BurstSpec {
    /// CPU burst length in ticks
    #[serde(rename = "cpu")]
    Cpu(u32),
    /// IO burst
    #[serde(rename = "io")]
    Io(IoSpec),
}

impl From<BurstSpec> for Burst {
    fn from(spec: BurstSpec) -> Self {
        match spec {
            BurstSpec::Cpu(duration) => Burst::cpu(duration),
            BurstSpec::Io(io) => Burst::io(io.kind, io.duration),
        }
    }
}

/// One process record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    /// Unique process id
    pub pid: String,
    /// Burst plan, executed front to back
    pub bursts: Vec<BurstSpec>,
    /// Lower values are scheduled first
    #[serde(default)]
    pub priority: u32,
    /// Tick the process becomes known to the engine
    #[serde(default)]
    pub arrival_time: u64,
}

impl ProcessSpec {
    /// Converts the record into a `New` process.
    ///
    /// # Errors
    /// - `WorkloadError::ZeroDuration` - A burst has zero length
    pub fn into_process(self) -> Result<Process, WorkloadError> {
        if let Some(index) = self.bursts.iter().position(|burst| match burst {
            BurstSpec::Cpu(duration) => *duration == 0,
            BurstSpec::Io(io) => io.duration == 0,
        }) {
            return Err(WorkloadError::ZeroDuration {
                pid: self.pid,
                index,
            });
        }

        let bursts = self.bursts.into_iter().map(Burst::from).collect();
        Ok(Process::new(
            self.pid,
            bursts,
            self.priority,
            self.arrival_time,
        ))
    }
}

/// Decodes a JSON workload into processes, keeping input order.
///
/// With `limit` set only the first `limit` records are used.
///
/// # Errors
/// - `WorkloadError::Json` - Input is not a list of process records
/// - `WorkloadError::DuplicatePid` - Two records share a pid
/// - `WorkloadError::ZeroDuration` - A burst has zero length
pub fn parse_workload(json: &str, limit: Option<usize>) -> Result<Vec<Process>, WorkloadError> {
    let specs: Vec<ProcessSpec> = serde_json::from_str(json)?;
    let take = limit.unwrap_or(specs.len());

    let mut seen = HashSet::new();
    let mut processes = Vec::with_capacity(take.min(specs.len()));
    for spec in specs.into_iter().take(take) {
        if !seen.insert(spec.pid.clone()) {
            return Err(WorkloadError::DuplicatePid { pid: spec.pid });
        }
        processes.push(spec.into_process()?);
    }

    tracing::debug!(count = processes.len(), "Workload decoded");
    Ok(processes)
}
