//! End-of-run aggregate statistics.

use serde::Serialize;

use super::resources::Resource;
use crate::process::Process;

/// Summary statistics of a run.
///
/// Averages are taken over finished processes. With nothing finished every
/// rate and average is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchedulerStats {
    /// Display name of the policy that produced these numbers
    pub policy: String,
    /// CPU slots in the engine
    pub num_cpus: usize,
    /// IO slots in the engine
    pub num_ios: usize,
    /// Clock value when the statistics were taken
    pub total_time: u64,
    /// Processes that reached `Finished`
    pub finished_count: usize,
    /// Finished processes per tick
    pub throughput: f64,
    /// Mean ticks from arrival to first dispatch
    pub avg_response_time: f64,
    /// CPU dispatches performed
    pub context_switches: u64,
    /// Busy ticks over available ticks, summed across CPUs
    pub cpu_utilization: f64,
    /// Mean ticks spent in the ready queue
    pub avg_waiting_time: f64,
    /// Mean ticks from arrival to finish
    pub avg_turnaround_time: f64,
}

impl SchedulerStats {
    /// Computes statistics from resource counters and finished processes.
    pub fn compute(
        policy: &str,
        now: u64,
        cpus: &[Resource],
        io_devices: &[Resource],
        finished: &[Process],
        context_switches: u64,
    ) -> Self {
        let busy: u64 = cpus.iter().map(Resource::busy_ticks).sum();
        let available: u64 = cpus.iter().map(Resource::available_ticks).sum();
        let count = finished.len();

        Self {
            policy: policy.to_string(),
            num_cpus: cpus.len(),
            num_ios: io_devices.len(),
            total_time: now,
            finished_count: count,
            throughput: ratio(count as u64, now),
            avg_response_time: ratio(
                finished.iter().map(Process::response_time).sum(),
                count as u64,
            ),
            context_switches,
            cpu_utilization: ratio(busy, available),
            avg_waiting_time: ratio(finished.iter().map(Process::wait_time).sum(), count as u64),
            avg_turnaround_time: ratio(
                finished.iter().map(Process::turnaround_time).sum(),
                count as u64,
            ),
        }
    }

    /// Generates human-readable summary.
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str(&format!("\n--- {} Scheduler Statistics ---\n", self.policy));
        summary.push_str(&format!("Throughput: {:.5}\n", self.throughput));
        summary.push_str(&format!(
            "Average Response Time: {:.2}\n",
            self.avg_response_time
        ));
        summary.push_str(&format!("Context Switches: {}\n", self.context_switches));
        summary.push_str(&format!("CPU Utilization: {:.2}\n", self.cpu_utilization));
        summary.push_str(&format!(
            "Average Waiting Time: {:.2}\n",
            self.avg_waiting_time
        ));
        summary.push_str(&format!(
            "Average Turnaround Time: {:.2}\n",
            self.avg_turnaround_time
        ));
        summary
    }
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
