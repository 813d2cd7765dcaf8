//! Structured event trace and human-readable timeline.

use std::collections::BTreeMap;

use serde::Serialize;

use super::state::Snapshot;

/// Types of transitions recorded in the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Process admitted into the engine
    Enqueue,
    /// Process assigned to a CPU
    DispatchCpu,
    /// Process assigned to an IO device
    DispatchIo,
    /// CPU burst done, next burst is CPU
    CpuToReady,
    /// CPU burst done, next burst is IO
    CpuToIo,
    /// IO burst done, next burst is CPU
    IoToReady,
    /// IO burst done, next burst is IO
    IoToIo,
    /// Last burst done
    Finished,
    /// Running process forced off its CPU
    PreemptCpu,
    /// Ready queue priorities aged
    Aging,
    /// End-of-step snapshot
    Tick,
}

impl EventType {
    /// Snake-case name used in trace logs and serialized events.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Enqueue => "enqueue",
            EventType::DispatchCpu => "dispatch_cpu",
            EventType::DispatchIo => "dispatch_io",
            EventType::CpuToReady => "cpu_to_ready",
            EventType::CpuToIo => "cpu_to_io",
            EventType::IoToReady => "io_to_ready",
            EventType::IoToIo => "io_to_io",
            EventType::Finished => "finished",
            EventType::PreemptCpu => "preempt_cpu",
            EventType::Aging => "aging",
            EventType::Tick => "tick",
        }
    }
}

/// One entry of the trace. Never mutated after it is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerEvent {
    /// Tick the transition happened at
    pub time: u64,
    /// Human-readable description
    pub description: String,
    /// Kind of transition
    pub event_type: EventType,
    /// Process involved, if any
    pub process_id: Option<String>,
    /// Device label involved, if any
    pub device_id: Option<String>,
    /// Container contents right after the transition
    pub snapshot: Snapshot,
}

/// Append-only recorder for events and timeline lines.
///
/// With `verbose` set, every entry is also emitted at `info` level and a
/// snapshot line follows each step in the timeline.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Vec<SchedulerEvent>,
    timeline: Vec<String>,
    verbose: bool,
}

impl EventRecorder {
    /// Creates an empty recorder.
    pub fn new(verbose: bool) -> Self {
        Self {
            events: Vec::new(),
            timeline: Vec::new(),
            verbose,
        }
    }

    /// Appends an event and its timeline line.
    ///
    /// `Tick` events are kept in the trace only. The step snapshot line
    /// stands in for them on the timeline.
    pub fn record(&mut self, event: SchedulerEvent) {
        if event.event_type == EventType::Tick {
            tracing::trace!(time = event.time, "Step snapshot recorded");
            self.events.push(event);
            return;
        }

        let line = format!("time={:<3} | {}", event.time, event.description);
        if self.verbose {
            tracing::info!("{line}");
        } else {
            tracing::debug!(
                time = event.time,
                event_type = event.event_type.as_str(),
                process = event.process_id.as_deref(),
                device = event.device_id.as_deref(),
                "{}",
                event.description
            );
        }
        self.timeline.push(line);
        self.events.push(event);
    }

    /// Adds a snapshot line to the timeline when verbose.
    pub fn note_snapshot(&mut self, snapshot: &Snapshot) {
        if self.verbose {
            let line = snapshot.to_string();
            tracing::info!("{line}");
            self.timeline.push(line);
        }
    }

    /// Every event recorded so far, in order.
    pub fn events(&self) -> &[SchedulerEvent] {
        &self.events
    }

    /// Timeline lines joined by newlines.
    pub fn timeline(&self) -> String {
        self.timeline.join("\n")
    }

    /// Number of recorded events per type.
    pub fn counts_by_type(&self) -> BTreeMap<&'static str, u64> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.event_type.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Drops everything recorded. Used between independent runs.
    pub fn clear(&mut self) {
        self.events.clear();
        self.timeline.clear();
    }
}
