//! CLI command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use schedsim_core::config::{DEFAULT_QUANTUM, quantum_from_env};
use schedsim_core::{
    PolicyConfig, Process, Scheduler, SchedulerConfig, SchedulerStats, parse_workload,
};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run one scheduling policy over a workload
    Run {
        /// Path to a JSON workload file
        workload: PathBuf,
        /// Scheduling policy: fcfs, rr, sjf, srtf or priority
        #[arg(short, long)]
        policy: Option<PolicyConfig>,
        #[command(flatten)]
        options: SimulationArgs,
        /// Print the timeline and per-process results
        #[arg(long)]
        show: bool,
        /// Print statistics and the event trace as JSON instead of text
        #[arg(long)]
        trace_json: bool,
    },
    /// Run every policy over the same workload and compare them
    Compare {
        /// Path to a JSON workload file
        workload: PathBuf,
        #[command(flatten)]
        options: SimulationArgs,
    },
}

/// Device and policy parameters shared by every command.
///
/// Unset values fall back to `SCHEDSIM_*` environment overrides, then to
/// the built-in defaults.
#[derive(Debug, Clone, Default, Args)]
pub struct SimulationArgs {
    /// Number of CPUs
    #[arg(long)]
    pub cpus: Option<usize>,
    /// Number of IO devices
    #[arg(long)]
    pub ios: Option<usize>,
    /// Round robin time slice
    #[arg(short, long)]
    pub quantum: Option<u32>,
    /// Enable priority aging
    #[arg(long)]
    pub aging: bool,
    /// Ticks between aging passes
    #[arg(long)]
    pub aging_interval: Option<u64>,
    /// Priority decrement per aging pass
    #[arg(long)]
    pub aging_delta: Option<u32>,
    /// Only simulate the first N processes of the workload
    #[arg(short, long)]
    pub limit: Option<usize>,
}

impl SimulationArgs {
    /// Fills an unset `--quantum` from the environment.
    ///
    /// An explicit flag always wins.
    pub fn with_env_quantum(mut self, env_quantum: Option<u32>) -> Self {
        self.quantum = self.quantum.or(env_quantum);
        self
    }

    /// Applies the policy parameter flags to `policy`.
    fn shape_policy(&self, policy: PolicyConfig) -> PolicyConfig {
        match policy {
            PolicyConfig::RoundRobin { quantum } => {
                PolicyConfig::round_robin(self.quantum.unwrap_or(quantum))
            }
            PolicyConfig::Priority {
                aging,
                aging_interval,
                aging_delta,
            } => PolicyConfig::Priority {
                aging: aging || self.aging,
                aging_interval: self.aging_interval.unwrap_or(aging_interval),
                aging_delta: self.aging_delta.unwrap_or(aging_delta),
            },
            other => other,
        }
    }

    fn scheduler_config(
        &self,
        base: &SchedulerConfig,
        policy: PolicyConfig,
        verbose: bool,
    ) -> SchedulerConfig {
        SchedulerConfig {
            num_cpus: self.cpus.unwrap_or(base.num_cpus),
            num_ios: self.ios.unwrap_or(base.num_ios),
            verbose: verbose || base.verbose,
            check_invariants: base.check_invariants,
            policy: self.shape_policy(policy),
        }
    }
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            workload,
            policy,
            options,
            show,
            trace_json,
        } => run_simulation(&workload, policy, &options, show, trace_json),
        Commands::Compare { workload, options } => compare_policies(&workload, &options),
    }
}

/// Reads and decodes a workload file.
///
/// # Errors
/// - The file cannot be read
/// - The contents are not a valid workload
pub fn load_workload(path: &Path, limit: Option<usize>) -> Result<Vec<Process>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read workload {}", path.display()))?;
    let processes = parse_workload(&text, limit)
        .with_context(|| format!("Failed to parse workload {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        processes = processes.len(),
        "Workload loaded"
    );
    Ok(processes)
}

/// Runs a single policy and prints its statistics
///
/// # Errors
/// - Workload could not be loaded
/// - Configuration is invalid or the run was aborted
pub fn run_simulation(
    workload: &Path,
    policy: Option<PolicyConfig>,
    options: &SimulationArgs,
    show: bool,
    trace_json: bool,
) -> Result<()> {
    let processes = load_workload(workload, options.limit)?;
    let base = SchedulerConfig::from_env();
    let options = options.clone().with_env_quantum(quantum_from_env());
    let config = options.scheduler_config(&base, policy.unwrap_or(base.policy), show);

    let mut scheduler = Scheduler::new(config)?;
    scheduler.submit_all(processes)?;
    let stats = scheduler.run()?;

    if trace_json {
        let report = serde_json::json!({
            "stats": stats,
            "finished": scheduler.finished(),
            "events": scheduler.events(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if show {
        println!("{}", scheduler.timeline());
        print_finished(&scheduler);
        print_event_counts(&scheduler);
    }
    print!("{}", stats.summary());

    Ok(())
}

fn print_finished(scheduler: &Scheduler) {
    println!("\nFinished Processes");
    println!("{:-<66}", "");
    println!(
        "{:<10} {:>8} {:>8} {:>10} {:>8} {:>8} {:>8}",
        "PID", "Arrival", "Finish", "Turnaround", "Wait", "IO", "Response"
    );
    for process in scheduler.finished() {
        println!(
            "{:<10} {:>8} {:>8} {:>10} {:>8} {:>8} {:>8}",
            process.pid(),
            process.arrival_time(),
            process.finish_time().unwrap_or_default(),
            process.turnaround_time(),
            process.wait_time(),
            process.io_time(),
            process.response_time(),
        );
    }
}

fn print_event_counts(scheduler: &Scheduler) {
    println!("\nEvents");
    println!("{:-<24}", "");
    for (event_type, count) in scheduler.event_counts() {
        println!("{event_type:<16} {count:>7}");
    }
    println!();
}

/// Runs every policy over `processes` with the same device layout.
///
/// # Errors
/// - Configuration is invalid or a run was aborted
pub fn compare_stats(
    processes: &[Process],
    options: &SimulationArgs,
    base: &SchedulerConfig,
) -> Result<Vec<SchedulerStats>> {
    let policies = [
        PolicyConfig::Fcfs,
        PolicyConfig::round_robin(DEFAULT_QUANTUM),
        PolicyConfig::ShortestJobFirst,
        PolicyConfig::ShortestRemainingTimeFirst,
        PolicyConfig::priority(),
    ];

    policies
        .into_iter()
        .map(|policy| {
            let config = options.scheduler_config(base, policy, false);
            let label = config.policy;
            let mut scheduler = Scheduler::new(config)?;
            scheduler.submit_all(processes.iter().cloned())?;
            scheduler
                .run()
                .with_context(|| format!("Simulation with {label} failed"))
        })
        .collect()
}

/// Runs every policy and prints one row per policy
///
/// # Errors
/// - Workload could not be loaded
/// - Configuration is invalid or a run was aborted
pub fn compare_policies(workload: &Path, options: &SimulationArgs) -> Result<()> {
    let processes = load_workload(workload, options.limit)?;
    let base = SchedulerConfig::from_env();
    let options = options.clone().with_env_quantum(quantum_from_env());
    let rows = compare_stats(&processes, &options, &base)?;

    println!("Policy Comparison ({} processes)", processes.len());
    println!("{:-<106}", "");
    println!(
        "{:<30} {:>10} {:>12} {:>9} {:>11} {:>10} {:>16}",
        "Policy", "Throughput", "Avg Response", "Switches", "CPU Util", "Avg Wait", "Avg Turnaround"
    );
    for stats in rows {
        println!(
            "{:<30} {:>10.5} {:>12.2} {:>9} {:>11.2} {:>10.2} {:>16.2}",
            stats.policy,
            stats.throughput,
            stats.avg_response_time,
            stats.context_switches,
            stats.cpu_utilization,
            stats.avg_waiting_time,
            stats.avg_turnaround_time,
        );
    }

    Ok(())
}
