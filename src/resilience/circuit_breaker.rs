//! Partition-level circuit breaker policy.
//!
//! # States
//! - Healthy: normal operation
//! - HealthyWithFailures: eligible failures observed, still routable
//! - Unavailable: excluded from routing, waiting out the cooldown
//! - HealthyTentative: probe traffic decides the next state
//!
//! # State Transitions
//! ```text
//! Healthy → HealthyWithFailures: first eligible failure
//! HealthyWithFailures → Unavailable: consecutive failures >= threshold(kind)
//! HealthyWithFailures → Healthy: any success
//! Unavailable → HealthyTentative: cooldown elapsed (health::recovery)
//! HealthyTentative → Healthy: probe succeeds
//! HealthyTentative → Unavailable: probe fails (cooldown restarts)
//! ```
//!
//! # Design Decisions
//! - Pure decision logic; the store supplies atomicity
//! - Separate thresholds and counters for reads and writes
//! - Non-eligible failures never advance a counter
//! - Successes observed while Unavailable do not short-circuit recovery

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CircuitBreakerConfig;
use crate::health::state::{HealthStatus, KindHealth, ProbeOutcome};
use crate::health::store::HealthRecordStore;
use crate::partition::{OperationKind, PartitionIdentity, RegionEndpoint};
use crate::resilience::classify::OutcomeClass;

/// A status change produced by one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub kind: OperationKind,
    pub from: HealthStatus,
    pub to: HealthStatus,
}

/// Threshold-driven transition rules.
#[derive(Debug, Clone)]
pub struct CircuitBreakerPolicy {
    enabled: bool,
    read_failure_threshold: u32,
    write_failure_threshold: u32,
    cooldown: Duration,
    max_probe_requests: u32,
    count_timeouts_as_failures: bool,
}

impl CircuitBreakerPolicy {
    /// Build the policy from configuration.
    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self {
            enabled: config.enabled,
            read_failure_threshold: config.read_failure_threshold,
            write_failure_threshold: config.write_failure_threshold,
            cooldown: config.cooldown(),
            max_probe_requests: config.max_probe_requests,
            count_timeouts_as_failures: config.count_timeouts_as_failures,
        }
    }

    /// Whether outcomes are recorded at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Consecutive failures that trip a kind.
    pub fn threshold(&self, kind: OperationKind) -> u32 {
        match kind {
            OperationKind::Read => self.read_failure_threshold,
            OperationKind::Write => self.write_failure_threshold,
        }
    }

    /// Wait before an unavailable pair may be probed.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Apply one classified outcome to the bookkeeping of one kind.
    ///
    /// Returns the transition when the status changed.
    pub fn apply(
        &self,
        health: &mut KindHealth,
        kind: OperationKind,
        class: OutcomeClass,
        now: Instant,
    ) -> Option<Transition> {
        let from = health.status;

        match class {
            OutcomeClass::Success => self.on_success(health),
            OutcomeClass::Eligible(_) => self.on_failure(health, kind, now),
            OutcomeClass::ClientTimeout if self.count_timeouts_as_failures => {
                self.on_failure(health, kind, now)
            }
            OutcomeClass::ClientTimeout | OutcomeClass::ClientCancelled | OutcomeClass::NotEligible => {}
        }

        (health.status != from).then_some(Transition {
            kind,
            from,
            to: health.status,
        })
    }

    fn on_success(&self, health: &mut KindHealth) {
        match health.status {
            HealthStatus::Healthy | HealthStatus::Unavailable => {
                health.consecutive_exception_count = 0;
            }
            HealthStatus::HealthyWithFailures => health.mark_healthy(),
            HealthStatus::HealthyTentative => {
                health.last_probe_outcome = Some(ProbeOutcome::Succeeded);
                health.mark_healthy();
            }
        }
    }

    fn on_failure(&self, health: &mut KindHealth, kind: OperationKind, now: Instant) {
        health.consecutive_exception_count = health.consecutive_exception_count.saturating_add(1);

        match health.status {
            HealthStatus::Healthy | HealthStatus::HealthyWithFailures => {
                if health.consecutive_exception_count >= self.threshold(kind) {
                    health.mark_unavailable(now);
                } else {
                    health.status = HealthStatus::HealthyWithFailures;
                }
            }
            HealthStatus::HealthyTentative => {
                health.last_probe_outcome = Some(ProbeOutcome::Failed);
                health.mark_unavailable(now);
            }
            // Stragglers from before the trip do not extend the cooldown.
            HealthStatus::Unavailable => {}
        }
    }

    /// Whether one more probe may be sent to a tentative pair.
    pub fn has_probe_capacity(&self, health: &KindHealth) -> bool {
        health.status == HealthStatus::HealthyTentative && health.probes_in_flight < self.max_probe_requests
    }

    /// Reserve a probe slot against a tentative pair.
    ///
    /// The returned guard gives the slot back when dropped. Any transition
    /// out of `HealthyTentative` clears all slots.
    pub fn try_begin_probe(
        &self,
        store: &Arc<HealthRecordStore>,
        partition: &PartitionIdentity,
        region: &RegionEndpoint,
        kind: OperationKind,
    ) -> Option<ProbeGuard> {
        let reserved = store.compare_and_update(partition, region, |ctx| {
            let health = ctx.kind_mut(kind);
            if self.has_probe_capacity(health) {
                health.probes_in_flight += 1;
                true
            } else {
                false
            }
        });

        reserved.then(|| ProbeGuard {
            store: store.clone(),
            partition: partition.clone(),
            region: region.clone(),
            kind,
        })
    }
}

/// RAII reservation of a probe slot.
#[derive(Debug)]
pub struct ProbeGuard {
    store: Arc<HealthRecordStore>,
    partition: PartitionIdentity,
    region: RegionEndpoint,
    kind: OperationKind,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        let kind = self.kind;
        self.store.compare_and_update(&self.partition, &self.region, |ctx| {
            let health = ctx.kind_mut(kind);
            if health.status == HealthStatus::HealthyTentative {
                health.probes_in_flight = health.probes_in_flight.saturating_sub(1);
            }
        });
    }
}
