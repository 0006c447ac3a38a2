//! Driver configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: `Default` implementations and serde field defaults
//! 2. **Config file**: TOML file named by the `MERIDIAN_CONFIG` env var
//! 3. **Environment variables**: `MERIDIAN__*` env vars override specific fields
//!
//! # Configuration Sections
//!
//! - `contact_points`: initial cluster membership
//! - [`QueryConfig`]: request defaults (consistency, keyspace)
//! - [`LoadBalancingConfig`]: which load-balancing policy to build
//! - [`RetryConfig`]: which retry policy to build and the pause between attempts
//! - [`LoggingConfig`]: log level and format
//! - [`MetricsConfig`]: metrics export
//!
//! # Example
//!
//! ```toml
//! [[contact_points]]
//! address = "10.0.0.1:9042"
//! datacenter = "us-east"
//!
//! [query]
//! default_consistency = "LOCAL_QUORUM"
//!
//! [load_balancing]
//! policy = "dc_aware_round_robin"
//! used_hosts_per_remote_dc = 1
//!
//! [retry]
//! policy = "default"
//! max_retries = 2
//! ```

use std::{collections::HashSet, net::SocketAddr, path::Path, sync::Arc, time::Duration};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

pub use config::ConfigError;

use crate::{
    cluster::{Host, HostMetadata},
    execution::CoordinatorConfig,
    policies::{
        DcAwareRoundRobinPolicy, DefaultRetryPolicy, DowngradingConsistencyRetryPolicy,
        FallthroughRetryPolicy, LoadBalancingPolicy, LoggingRetryPolicy, RetryPolicy,
        RoundRobinPolicy, SortedPolicy, WhiteListPolicy,
    },
    types::ConsistencyLevel,
};

/// Request defaults applied when a statement leaves them unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub default_consistency: ConsistencyLevel,

    #[serde(default)]
    pub default_keyspace: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancingPolicyKind {
    #[default]
    RoundRobin,
    DcAwareRoundRobin,
    Sorted,
}

/// Load-balancing policy selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancingConfig {
    #[serde(default)]
    pub policy: LoadBalancingPolicyKind,

    /// Local datacenter for `dc_aware_round_robin`. Inferred from the contact points when unset.
    #[serde(default)]
    pub local_dc: Option<String>,

    /// Remote hosts per datacenter appended to each plan. Defaults to `0`.
    #[serde(default)]
    pub used_hosts_per_remote_dc: usize,

    /// Whether datacenter-local consistency levels may still use remote hosts.
    #[serde(default)]
    pub allow_remote_dcs_for_local_cl: bool,

    /// When set, wraps the chosen policy so only these hosts are ever queried.
    #[serde(default)]
    pub whitelist: Option<Vec<SocketAddr>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPolicyKind {
    #[default]
    Default,
    Fallthrough,
    DowngradingConsistency,
}

/// Retry policy selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub policy: RetryPolicyKind,

    /// Retry budget of the `default` policy. Defaults to `1`.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Logs every non-rethrow decision at `info`.
    #[serde(default)]
    pub log_decisions: bool,

    /// Pause between a failed attempt and the next one. Defaults to `0`.
    #[serde(default)]
    pub retry_delay_ms: u64,
}

/// Logging configuration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., `"info"`, `"debug"`, `"warn"`). Defaults to `"info"`.
    pub level: String,

    /// Log output format: `"pretty"` for human-readable or `"json"` for structured logs.
    pub format: String,
}

/// Metrics configuration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,

    /// Render the Prometheus exposition when a CLI run finishes.
    #[serde(default)]
    pub prometheus: bool,
}

/// Complete driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_contact_points")]
    pub contact_points: Vec<HostMetadata>,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub load_balancing: LoadBalancingConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_max_retries() -> u32 {
    DefaultRetryPolicy::DEFAULT_MAX_RETRIES
}

fn default_contact_points() -> Vec<HostMetadata> {
    vec![HostMetadata::new(SocketAddr::from(([127, 0, 0, 1], 9042)))]
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            policy: RetryPolicyKind::Default,
            max_retries: default_max_retries(),
            log_decisions: false,
            retry_delay_ms: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true, prometheus: false }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            contact_points: default_contact_points(),
            query: QueryConfig::default(),
            load_balancing: LoadBalancingConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl LoadBalancingConfig {
    /// Builds the configured policy, wrapped in a [`WhiteListPolicy`] when a whitelist is set.
    #[must_use]
    pub fn build(&self) -> Arc<dyn LoadBalancingPolicy> {
        let policy: Arc<dyn LoadBalancingPolicy> = match self.policy {
            LoadBalancingPolicyKind::RoundRobin => Arc::new(RoundRobinPolicy::new()),
            LoadBalancingPolicyKind::Sorted => Arc::new(SortedPolicy::new()),
            LoadBalancingPolicyKind::DcAwareRoundRobin => Arc::new(
                DcAwareRoundRobinPolicy::new(self.local_dc.clone())
                    .with_used_hosts_per_remote_dc(self.used_hosts_per_remote_dc)
                    .with_remote_dcs_for_local_cl(self.allow_remote_dcs_for_local_cl),
            ),
        };

        match &self.whitelist {
            Some(allowed) => Arc::new(WhiteListPolicy::new(policy, allowed.iter().copied())),
            None => policy,
        }
    }
}

impl RetryConfig {
    /// Builds the configured policy, wrapped in a [`LoggingRetryPolicy`] when
    /// `log_decisions` is set.
    #[must_use]
    pub fn build(&self) -> Arc<dyn RetryPolicy> {
        let policy: Arc<dyn RetryPolicy> = match self.policy {
            RetryPolicyKind::Default => {
                Arc::new(DefaultRetryPolicy::with_max_retries(self.max_retries))
            }
            RetryPolicyKind::Fallthrough => Arc::new(FallthroughRetryPolicy),
            RetryPolicyKind::DowngradingConsistency => Arc::new(DowngradingConsistencyRetryPolicy),
        };

        if self.log_decisions {
            Arc::new(LoggingRetryPolicy::new(policy))
        } else {
            policy
        }
    }

    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl DriverConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// Environment variables with the `MERIDIAN__` prefix can override any configuration value.
    /// Use `__` as a separator for nested fields (e.g., `MERIDIAN__RETRY__MAX_RETRIES=3`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("query.default_consistency", "ONE")?
            .set_default("load_balancing.policy", "round_robin")?
            .set_default("load_balancing.used_hosts_per_remote_dc", 0)?
            .set_default("retry.policy", "default")?
            .set_default("retry.max_retries", i64::from(default_max_retries()))?
            .set_default("retry.log_decisions", false)?
            .set_default("retry.retry_delay_ms", 0)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.prometheus", false)?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("MERIDIAN").separator("__"))
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from `config/meridian.toml` with fallback to defaults.
    ///
    /// The config file path can be overridden using the `MERIDIAN_CONFIG` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("MERIDIAN_CONFIG")
            .unwrap_or_else(|_| "config/meridian.toml".to_string());
        Self::from_file(&config_path)
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if self.contact_points.is_empty() {
            return Err("No contact points configured".to_string());
        }

        let mut seen = HashSet::new();
        for contact in &self.contact_points {
            if !seen.insert(contact.address) {
                return Err(format!("Duplicate contact point: {}", contact.address));
            }
        }

        if self.load_balancing.policy == LoadBalancingPolicyKind::DcAwareRoundRobin {
            if let Some(local_dc) = &self.load_balancing.local_dc {
                let mut declared =
                    self.contact_points.iter().filter_map(|c| c.datacenter.as_deref()).peekable();
                if declared.peek().is_some() && !declared.any(|dc| dc == local_dc) {
                    return Err(format!(
                        "Local datacenter '{local_dc}' does not match any contact point"
                    ));
                }
            }
        }

        if let Some(whitelist) = &self.load_balancing.whitelist {
            if whitelist.is_empty() {
                return Err("Load balancing whitelist must not be empty when set".to_string());
            }
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }

    /// Hosts to seed the registry with, all initially up.
    #[must_use]
    pub fn contact_hosts(&self) -> Vec<Host> {
        self.contact_points.iter().cloned().map(Host::from_metadata).collect()
    }

    #[must_use]
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            default_consistency: self.query.default_consistency,
            default_keyspace: self.query.default_keyspace.clone(),
            retry_delay: self.retry.retry_delay(),
        }
    }
}
