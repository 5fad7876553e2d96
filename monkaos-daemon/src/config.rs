//! Configuration loading for monkaos.
//!
//! Configuration is loaded from a TOML file (default: `/etc/monkaos.toml`).
//! Every field has a default, so sections and keys may be omitted.

use crate::error::MonkeyError;
use monkaos_core::{LatencyPolicy, RetryPolicy, Strategy};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/monkaos.toml";

/// Upper bound for `deadline_secs` and `max_latency_secs`: one year.
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Upper bound for `victims_per_schedule`.
pub const MAX_VICTIMS_PER_SCHEDULE: usize = 10_000;

/// Root configuration for monkaos.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Cycle timing.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// What gets terminated and how.
    #[serde(default)]
    pub chaos: ChaosConfig,
    /// Retry behavior while drawing victims.
    #[serde(default)]
    pub selection: SelectionConfig,
}

/// Cycle timing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Hard cutoff for one cycle's execution, in seconds (default: 1).
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    /// Upper bound on a task's delay after cycle start, in seconds (default: 5).
    #[serde(default = "default_max_latency_secs")]
    pub max_latency_secs: u64,
    /// Sleep between cycles, in seconds (default: 10).
    #[serde(default = "default_tick_period_secs")]
    pub tick_period_secs: u64,
    /// Draw each delay at random below `max_latency_secs` (default: true).
    #[serde(default = "default_enable_random_latency")]
    pub enable_random_latency: bool,
    /// What to do when a cycle cannot build its schedule (default: exit).
    #[serde(default)]
    pub on_cycle_failure: CycleFailurePolicy,
    /// Fixed RNG seed for reproducible runs (default: seeded from the OS).
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Chaos configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ChaosConfig {
    /// Victims drawn per cycle (default: 1).
    #[serde(default = "default_victims_per_schedule")]
    pub victims_per_schedule: usize,
    /// Grace period passed to each pod deletion, in seconds (default: 10).
    #[serde(default = "default_termination_grace_period_secs")]
    pub termination_grace_period_secs: u32,
    /// Namespaces that are never touched.
    #[serde(default = "default_excluded_namespaces")]
    pub excluded_namespaces: Vec<String>,
    /// Selection strategy (default: RandomPodRandomNamespace).
    #[serde(default)]
    pub strategy: Strategy,
}

/// Victim selection retry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    /// Empty-namespace retries per selection (default: 10).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Wait between retries, in milliseconds (default: 1000).
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

/// Behavior when a cycle fails to build its schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleFailurePolicy {
    /// Stop the tick loop and exit the process.
    #[default]
    Exit,
    /// Log the failure and wait for the next tick.
    Skip,
}

// Default value functions
fn default_deadline_secs() -> u64 {
    1
}

fn default_max_latency_secs() -> u64 {
    5
}

fn default_tick_period_secs() -> u64 {
    10
}

fn default_enable_random_latency() -> bool {
    true
}

fn default_victims_per_schedule() -> usize {
    1
}

fn default_termination_grace_period_secs() -> u32 {
    10
}

fn default_excluded_namespaces() -> Vec<String> {
    ["kube-system", "kube-public", "kube-node-lease"]
        .iter()
        .map(|ns| ns.to_string())
        .collect()
}

fn default_max_retries() -> u32 {
    monkaos_core::retry::DEFAULT_MAX_RETRIES
}

fn default_retry_backoff_ms() -> u64 {
    monkaos_core::retry::DEFAULT_BACKOFF.as_millis() as u64
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline_secs(),
            max_latency_secs: default_max_latency_secs(),
            tick_period_secs: default_tick_period_secs(),
            enable_random_latency: default_enable_random_latency(),
            on_cycle_failure: CycleFailurePolicy::default(),
            seed: None,
        }
    }
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            victims_per_schedule: default_victims_per_schedule(),
            termination_grace_period_secs: default_termination_grace_period_secs(),
            excluded_namespaces: default_excluded_namespaces(),
            strategy: Strategy::default(),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl SchedulerConfig {
    /// Cycle deadline as a duration.
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    /// Sleep between cycles as a duration.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(self.tick_period_secs)
    }

    /// Latency policy for schedule construction.
    pub fn latency_policy(&self) -> LatencyPolicy {
        LatencyPolicy {
            max_latency: Duration::from_secs(self.max_latency_secs),
            random: self.enable_random_latency,
        }
    }
}

impl ChaosConfig {
    /// Excluded namespaces as a set.
    pub fn excluded_set(&self) -> HashSet<String> {
        self.excluded_namespaces.iter().cloned().collect()
    }
}

impl SelectionConfig {
    /// Retry policy for victim selection.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_backoff_ms))
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load configuration, tolerating a missing file.
    ///
    /// A file that does not exist yields the defaults; any other read or
    /// parse failure is returned.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::from_file(path) {
            Err(ConfigError::ReadError { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                tracing::warn!(
                    "Config file {} not found, using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.scheduler.tick_period_secs == 0 {
            return Err(MonkeyError::InvalidConfig {
                reason: "scheduler.tick_period_secs must be greater than zero".into(),
            });
        }
        if self.scheduler.deadline_secs == 0 {
            return Err(MonkeyError::InvalidConfig {
                reason: "scheduler.deadline_secs must be greater than zero".into(),
            });
        }
        if self.scheduler.deadline_secs > MAX_DURATION_SECS {
            return Err(MonkeyError::InvalidConfig {
                reason: format!("scheduler.deadline_secs must be at most {MAX_DURATION_SECS}"),
            });
        }
        if self.scheduler.max_latency_secs > MAX_DURATION_SECS {
            return Err(MonkeyError::InvalidConfig {
                reason: format!("scheduler.max_latency_secs must be at most {MAX_DURATION_SECS}"),
            });
        }
        if self.chaos.victims_per_schedule > MAX_VICTIMS_PER_SCHEDULE {
            return Err(MonkeyError::InvalidConfig {
                reason: format!(
                    "chaos.victims_per_schedule must be at most {MAX_VICTIMS_PER_SCHEDULE}"
                ),
            });
        }
        Ok(())
    }

    /// One-line description logged at startup.
    pub fn summary(&self) -> String {
        format!(
            "deadline: {}s, max latency: {}s, tick period: {}s, random latency enabled: {}, \
             termination grace period: {}s, pods per schedule: {}, excluded namespaces: {:?}, \
             strategy: {}, on cycle failure: {:?}",
            self.scheduler.deadline_secs,
            self.scheduler.max_latency_secs,
            self.scheduler.tick_period_secs,
            self.scheduler.enable_random_latency,
            self.chaos.termination_grace_period_secs,
            self.chaos.victims_per_schedule,
            self.chaos.excluded_namespaces,
            self.chaos.strategy,
            self.scheduler.on_cycle_failure,
        )
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = Config::default();
        assert_eq!(config.scheduler.deadline_secs, 1);
        assert_eq!(config.scheduler.max_latency_secs, 5);
        assert_eq!(config.scheduler.tick_period_secs, 10);
        assert!(config.scheduler.enable_random_latency);
        assert_eq!(config.scheduler.on_cycle_failure, CycleFailurePolicy::Exit);
        assert_eq!(config.chaos.victims_per_schedule, 1);
        assert_eq!(config.chaos.termination_grace_period_secs, 10);
        assert_eq!(
            config.chaos.excluded_namespaces,
            vec!["kube-system", "kube-public", "kube-node-lease"]
        );
        assert_eq!(config.chaos.strategy, Strategy::RandomPodRandomNamespace);
        assert_eq!(config.selection.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[scheduler]
deadline_secs = 30
max_latency_secs = 20
tick_period_secs = 60
enable_random_latency = false
on_cycle_failure = "skip"
seed = 7

[chaos]
victims_per_schedule = 3
termination_grace_period_secs = 0
excluded_namespaces = ["kube-system", "monitoring"]
strategy = "RandomPodRandomNamespace"

[selection]
max_retries = 2
retry_backoff_ms = 250
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.scheduler.deadline(), Duration::from_secs(30));
        assert_eq!(config.scheduler.tick_period(), Duration::from_secs(60));
        assert_eq!(
            config.scheduler.latency_policy(),
            LatencyPolicy::fixed(Duration::from_secs(20))
        );
        assert_eq!(config.scheduler.on_cycle_failure, CycleFailurePolicy::Skip);
        assert_eq!(config.scheduler.seed, Some(7));
        assert_eq!(config.chaos.victims_per_schedule, 3);
        assert_eq!(config.chaos.termination_grace_period_secs, 0);
        assert!(config.chaos.excluded_set().contains("monitoring"));
        assert_eq!(
            config.selection.retry_policy(),
            RetryPolicy::new(2, Duration::from_millis(250))
        );
    }

    #[test]
    fn config_missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.scheduler.tick_period_secs, 10);
        assert_eq!(config.chaos.excluded_namespaces.len(), 3);
        assert_eq!(config.selection.max_retries, 10);
    }

    #[test]
    fn unknown_strategy_falls_back() {
        let config: Config = toml::from_str(
            r#"
[chaos]
strategy = "MostRecentPod"
"#,
        )
        .unwrap();
        assert_eq!(config.chaos.strategy, Strategy::RandomPodRandomNamespace);
    }

    #[test]
    fn explicitly_empty_exclusions_are_kept() {
        let config: Config = toml::from_str(
            r#"
[chaos]
excluded_namespaces = []
"#,
        )
        .unwrap();
        assert!(config.chaos.excluded_namespaces.is_empty());
    }

    #[test]
    fn validate_rejects_zero_tick_period() {
        let mut config = Config::default();
        config.scheduler.tick_period_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(MonkeyError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_deadline() {
        let mut config = Config::default();
        config.scheduler.deadline_secs = 0;
        assert!(config.validate().is_err());
        config.scheduler.deadline_secs = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_durations_beyond_a_year() {
        let mut config = Config::default();
        config.scheduler.deadline_secs = MAX_DURATION_SECS;
        config.scheduler.max_latency_secs = MAX_DURATION_SECS;
        assert!(config.validate().is_ok());

        config.scheduler.deadline_secs = u64::MAX;
        assert!(matches!(
            config.validate(),
            Err(MonkeyError::InvalidConfig { .. })
        ));

        config.scheduler.deadline_secs = 1;
        config.scheduler.max_latency_secs = MAX_DURATION_SECS + 1;
        assert!(matches!(
            config.validate(),
            Err(MonkeyError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn validate_rejects_too_many_victims() {
        let config: Config = toml::from_str(
            r#"
[chaos]
victims_per_schedule = 9223372036854775807
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(MonkeyError::InvalidConfig { .. })
        ));

        let mut config = Config::default();
        config.chaos.victims_per_schedule = MAX_VICTIMS_PER_SCHEDULE;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[chaos]\nvictims_per_schedule = 4").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.chaos.victims_per_schedule, 4);
    }

    #[test]
    fn from_file_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[chaos\nvictims_per_schedule = ").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.scheduler.tick_period_secs, 10);
    }

    #[test]
    fn summary_mentions_key_settings() {
        let summary = Config::default().summary();
        assert!(summary.contains("deadline: 1s"));
        assert!(summary.contains("pods per schedule: 1"));
        assert!(summary.contains("strategy: RandomPodRandomNamespace"));
    }
}
