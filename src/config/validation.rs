//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (preferred regions exist in the topology)
//! - Validate value ranges (thresholds > 0, durations > 0, endpoints parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the engine

use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no regions configured")]
    NoRegions,

    #[error("region '{0}' is configured more than once")]
    DuplicateRegion(String),

    #[error("region '{region}' has an invalid endpoint: {reason}")]
    InvalidEndpoint { region: String, reason: String },

    #[error("preferred region '{0}' is not part of the account topology")]
    UnknownPreferredRegion(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.regions.is_empty() {
        errors.push(ValidationError::NoRegions);
    }

    let mut names = HashSet::new();
    for region in &config.regions {
        if !names.insert(region.name.as_str()) {
            errors.push(ValidationError::DuplicateRegion(region.name.clone()));
        }
        if let Err(e) = Url::parse(&region.endpoint) {
            errors.push(ValidationError::InvalidEndpoint {
                region: region.name.clone(),
                reason: e.to_string(),
            });
        }
    }

    for preferred in &config.preferred_regions {
        if !names.contains(preferred.as_str()) {
            errors.push(ValidationError::UnknownPreferredRegion(preferred.clone()));
        }
    }

    let breaker = &config.circuit_breaker;
    if breaker.read_failure_threshold == 0 {
        errors.push(ValidationError::Zero("circuit_breaker.read_failure_threshold"));
    }
    if breaker.write_failure_threshold == 0 {
        errors.push(ValidationError::Zero("circuit_breaker.write_failure_threshold"));
    }
    if breaker.max_probe_requests == 0 {
        errors.push(ValidationError::Zero("circuit_breaker.max_probe_requests"));
    }
    if breaker.sweep_interval_secs == 0 {
        errors.push(ValidationError::Zero("circuit_breaker.sweep_interval_secs"));
    }
    if config.failover.e2e_timeout_hit_threshold == 0 {
        errors.push(ValidationError::Zero("failover.e2e_timeout_hit_threshold"));
    }
    if config.timeouts.end_to_end_ms == Some(0) {
        errors.push(ValidationError::Zero("timeouts.end_to_end_ms"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
