//! Centralized configuration for the scheduler engine.
//!
//! Every tunable parameter is defined here, with defaults matching the
//! reference workloads: one CPU, one IO device, FCFS dispatch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default round robin time slice.
pub const DEFAULT_QUANTUM: u32 = 4;

/// Default number of ticks between aging passes.
pub const DEFAULT_AGING_INTERVAL: u64 = 5;

/// Default priority decrement per aging pass.
pub const DEFAULT_AGING_DELTA: u32 = 1;

/// Invalid construction-time configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// At least one CPU is required
    #[error("num_cpus must be at least 1, got {count}")]
    InvalidCpuCount {
        /// Requested CPU count
        count: usize,
    },

    /// At least one IO device is required
    #[error("num_ios must be at least 1, got {count}")]
    InvalidIoCount {
        /// Requested IO device count
        count: usize,
    },

    /// Round robin needs a positive time slice
    #[error("quantum must be positive, got {quantum}")]
    InvalidQuantum {
        /// Requested time slice
        quantum: u32,
    },

    /// Aging needs a positive interval
    #[error("aging_interval must be positive, got {interval}")]
    InvalidAgingInterval {
        /// Requested interval in ticks
        interval: u64,
    },

    /// Aging needs a positive decrement
    #[error("aging_delta must be positive, got {delta}")]
    InvalidAgingDelta {
        /// Requested decrement
        delta: u32,
    },

    /// Policy name not recognized
    #[error("unknown scheduling policy '{name}' (expected fcfs, rr, sjf, srtf or priority)")]
    UnknownPolicy {
        /// Name as given
        name: String,
    },
}

/// Scheduling policy selection with its parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// First come, first served
    #[default]
    Fcfs,
    /// Round robin with a fixed time slice
    RoundRobin {
        /// Consecutive CPU ticks before a process is requeued
        quantum: u32,
    },
    /// Non-preemptive shortest job first
    ShortestJobFirst,
    /// Preemptive shortest remaining time first
    ShortestRemainingTimeFirst,
    /// Static priority, optionally aged
    Priority {
        /// Lower ready processes' priority values over time
        aging: bool,
        /// Ticks between aging passes
        aging_interval: u64,
        /// Priority decrement per pass
        aging_delta: u32,
    },
}

impl PolicyConfig {
    /// Round robin with the given quantum.
    pub fn round_robin(quantum: u32) -> Self {
        PolicyConfig::RoundRobin { quantum }
    }

    /// Priority scheduling without aging.
    pub fn priority() -> Self {
        PolicyConfig::Priority {
            aging: false,
            aging_interval: DEFAULT_AGING_INTERVAL,
            aging_delta: DEFAULT_AGING_DELTA,
        }
    }

    /// Priority scheduling with aging enabled.
    pub fn priority_with_aging(aging_interval: u64, aging_delta: u32) -> Self {
        PolicyConfig::Priority {
            aging: true,
            aging_interval,
            aging_delta,
        }
    }

    /// Short name used on the command line.
    pub fn short_name(&self) -> &'static str {
        match self {
            PolicyConfig::Fcfs => "fcfs",
            PolicyConfig::RoundRobin { .. } => "rr",
            PolicyConfig::ShortestJobFirst => "sjf",
            PolicyConfig::ShortestRemainingTimeFirst => "srtf",
            PolicyConfig::Priority { .. } => "priority",
        }
    }

    /// Checks policy parameters.
    ///
    /// # Errors
    /// - `ConfigError::InvalidQuantum` - Zero round robin quantum
    /// - `ConfigError::InvalidAgingInterval` - Zero aging interval
    /// - `ConfigError::InvalidAgingDelta` - Zero aging delta
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            PolicyConfig::RoundRobin { quantum } if quantum == 0 => {
                Err(ConfigError::InvalidQuantum { quantum })
            }
            PolicyConfig::Priority { aging_interval, .. } if aging_interval == 0 => {
                Err(ConfigError::InvalidAgingInterval {
                    interval: aging_interval,
                })
            }
            PolicyConfig::Priority { aging_delta, .. } if aging_delta == 0 => {
                Err(ConfigError::InvalidAgingDelta { delta: aging_delta })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for PolicyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyConfig::RoundRobin { quantum } => write!(f, "rr(quantum={quantum})"),
            PolicyConfig::Priority {
                aging: true,
                aging_interval,
                aging_delta,
            } => write!(
                f,
                "priority(aging, interval={aging_interval}, delta={aging_delta})"
            ),
            other => write!(f, "{}", other.short_name()),
        }
    }
}

impl FromStr for PolicyConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fcfs" => Ok(PolicyConfig::Fcfs),
            "rr" | "round_robin" => Ok(PolicyConfig::round_robin(DEFAULT_QUANTUM)),
            "sjf" => Ok(PolicyConfig::ShortestJobFirst),
            "srtf" => Ok(PolicyConfig::ShortestRemainingTimeFirst),
            "priority" => Ok(PolicyConfig::priority()),
            _ => Err(ConfigError::UnknownPolicy {
                name: s.to_string(),
            }),
        }
    }
}

/// Round robin time slice from `SCHEDSIM_QUANTUM`.
///
/// Read independently of `SCHEDSIM_POLICY` so a policy chosen later can
/// still pick it up. Unparseable values are ignored.
pub fn quantum_from_env() -> Option<u32> {
    std::env::var("SCHEDSIM_QUANTUM").ok()?.trim().parse().ok()
}

/// Parses a boolean switch such as `1`, `true`, `yes` or `off`.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Construction-time configuration of a scheduler engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of CPU slots
    pub num_cpus: usize,
    /// Number of IO slots
    pub num_ios: usize,
    /// Emit the human-readable trace at info level
    pub verbose: bool,
    /// Check built-in invariants after every step
    pub check_invariants: bool,
    /// Active scheduling policy
    pub policy: PolicyConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            num_cpus: 1,
            num_ios: 1,
            verbose: false,
            check_invariants: true,
            policy: PolicyConfig::Fcfs,
        }
    }
}

impl SchedulerConfig {
    /// Default device layout with the given policy.
    pub fn with_policy(policy: PolicyConfig) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Multi-device layout with the given policy.
    pub fn with_devices(num_cpus: usize, num_ios: usize, policy: PolicyConfig) -> Self {
        Self {
            num_cpus,
            num_ios,
            policy,
            ..Self::default()
        }
    }

    /// Creates configuration with environment variable overrides.
    ///
    /// Unparseable values are ignored and keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(cpus) = std::env::var("SCHEDSIM_CPUS") {
            if let Ok(count) = cpus.parse::<usize>() {
                config.num_cpus = count;
            }
        }

        if let Ok(ios) = std::env::var("SCHEDSIM_IOS") {
            if let Ok(count) = ios.parse::<usize>() {
                config.num_ios = count;
            }
        }

        if let Ok(verbose) = std::env::var("SCHEDSIM_VERBOSE") {
            if let Some(flag) = parse_flag(&verbose) {
                config.verbose = flag;
            }
        }

        if let Ok(policy) = std::env::var("SCHEDSIM_POLICY") {
            if let Ok(parsed) = policy.parse::<PolicyConfig>() {
                config.policy = parsed;
            }
        }

        if let (Some(value), PolicyConfig::RoundRobin { quantum }) =
            (quantum_from_env(), &mut config.policy)
        {
            *quantum = value;
        }

        config
    }

    /// Checks device counts and policy parameters.
    ///
    /// # Errors
    /// - `ConfigError::InvalidCpuCount` - Fewer than one CPU
    /// - `ConfigError::InvalidIoCount` - Fewer than one IO device
    /// - Any error from [`PolicyConfig::validate`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_cpus < 1 {
            return Err(ConfigError::InvalidCpuCount {
                count: self.num_cpus,
            });
        }
        if self.num_ios < 1 {
            return Err(ConfigError::InvalidIoCount {
                count: self.num_ios,
            });
        }
        self.policy.validate()
    }
}
