//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! availability engine. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the partition availability engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Account topology, in service-provided order.
    pub regions: Vec<RegionConfig>,

    /// Client preference order (region names). Empty means topology order.
    pub preferred_regions: Vec<String>,

    /// Partition-level circuit breaker settings.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Per-partition automatic failover settings.
    pub failover: FailoverConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// One region of the account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegionConfig {
    /// Logical region name (e.g. "East US").
    pub name: String,

    /// Regional endpoint URL.
    pub endpoint: String,
}

impl RegionConfig {
    /// Region config from a name and endpoint URL.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// Partition-level circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Enable the breaker. When disabled, routes follow preference order.
    pub enabled: bool,

    /// Consecutive eligible read failures before a pair becomes unavailable.
    pub read_failure_threshold: u32,

    /// Consecutive eligible write failures before a pair becomes unavailable.
    pub write_failure_threshold: u32,

    /// Time an unavailable pair waits before probe traffic is allowed.
    pub cooldown_secs: u64,

    /// Concurrent probe requests allowed against a tentative pair.
    pub max_probe_requests: u32,

    /// Interval of the background recovery sweep.
    pub sweep_interval_secs: u64,

    /// Count client-side end-to-end timeouts as eligible failures.
    pub count_timeouts_as_failures: bool,
}

impl CircuitBreakerConfig {
    /// Cooldown as a `Duration`.
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Sweep interval as a `Duration`.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            read_failure_threshold: 10,
            write_failure_threshold: 5,
            cooldown_secs: 30,
            max_probe_requests: 1,
            sweep_interval_secs: 60,
            count_timeouts_as_failures: false,
        }
    }
}

/// Per-partition automatic failover configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FailoverConfig {
    /// Enable per-partition automatic failover.
    pub enabled: bool,

    /// Consecutive client-side end-to-end timeouts that force a failover.
    pub e2e_timeout_hit_threshold: u32,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            e2e_timeout_hit_threshold: 2,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// End-to-end deadline across all regional attempts, in milliseconds.
    pub end_to_end_ms: Option<u64>,
}

impl TimeoutConfig {
    /// End-to-end deadline, if configured.
    pub fn end_to_end(&self) -> Option<Duration> {
        self.end_to_end_ms.map(Duration::from_millis)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
