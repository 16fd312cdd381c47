//! Partition availability engine.
//!
//! # Responsibilities
//! - Own the health record store and the failover records
//! - Answer "which regions, in which order" for a request
//! - Fold every regional outcome into breaker and failover state
//! - Accept a new configuration atomically
//!
//! # Design Decisions
//! - Configuration is an immutable snapshot behind `ArcSwap`; reads never lock
//! - Breaker and failover are consulted independently; neither resets the other
//! - The engine never fails on its own account; it hands back a classification

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::{ClientConfig, ConfigError};
use crate::health::{
    HealthRecordStore, HealthStatus, LocationHealthContext, RecoveryProber, RecoverySettings, RecoverySweeper,
};
use crate::observability::metrics;
use crate::partition::{OperationType, PartitionIdentity, RegionEndpoint};
use crate::resilience::{
    classify, CircuitBreakerPolicy, FailoverEvent, FailoverOrchestrator, FailoverRecord, OutcomeClass,
    ProbeGuard, RequestOutcome, Transition,
};
use crate::routing::{RegionSelector, RegionTopology};

/// Everything derived from one accepted configuration.
#[derive(Debug)]
struct EngineSnapshot {
    config: Arc<ClientConfig>,
    topology: RegionTopology,
    policy: CircuitBreakerPolicy,
    failover: FailoverOrchestrator,
}

impl EngineSnapshot {
    fn build(config: ClientConfig) -> Result<Self, ConfigError> {
        let topology = RegionTopology::resolve(&config).map_err(ConfigError::Validation)?;
        Ok(Self {
            policy: CircuitBreakerPolicy::from_config(&config.circuit_breaker),
            failover: FailoverOrchestrator::from_config(&config.failover),
            topology,
            config: Arc::new(config),
        })
    }
}

/// What one reported outcome did to availability state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeReport {
    pub class: OutcomeClass,
    pub transition: Option<Transition>,
    pub failover: Option<FailoverEvent>,
}

/// Circuit breaker plus per-partition failover for one client.
#[derive(Debug)]
pub struct AvailabilityEngine {
    snapshot: ArcSwap<EngineSnapshot>,
    store: Arc<HealthRecordStore>,
    /// Shared with the background sweeper.
    recovery: Arc<ArcSwap<RecoverySettings>>,
}

impl AvailabilityEngine {
    /// Validate the configuration and build an engine with empty state.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let snapshot = EngineSnapshot::build(config)?;
        tracing::info!(
            regions = snapshot.topology.account_regions().len(),
            preferred = ?snapshot.topology.preferred().iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            breaker_enabled = snapshot.policy.is_enabled(),
            failover_enabled = snapshot.failover.is_enabled(),
            "Availability engine initialized"
        );
        let recovery = RecoverySettings::from_config(&snapshot.config.circuit_breaker);
        Ok(Self {
            snapshot: ArcSwap::from_pointee(snapshot),
            store: Arc::new(HealthRecordStore::new()),
            recovery: Arc::new(ArcSwap::from_pointee(recovery)),
        })
    }

    /// The configuration currently in effect.
    pub fn config(&self) -> Arc<ClientConfig> {
        self.snapshot.load().config.clone()
    }

    /// The shared health record store.
    pub fn store(&self) -> &Arc<HealthRecordStore> {
        &self.store
    }

    /// Preferred regions in client order (account order when unset).
    pub fn preferred_regions(&self) -> Vec<RegionEndpoint> {
        self.snapshot.load().topology.preferred().to_vec()
    }

    /// Look up an account region by name.
    pub fn region(&self, name: &str) -> Option<RegionEndpoint> {
        self.snapshot.load().topology.region(name).cloned()
    }

    /// Ordered regions to attempt for a request.
    pub fn select_route(&self, partition: &PartitionIdentity, operation: OperationType) -> Vec<RegionEndpoint> {
        self.select_route_at(partition, operation, Instant::now())
    }

    /// Ordered regions to attempt, evaluated at an explicit instant.
    ///
    /// The preference order is always the configured one, the same order
    /// failover targets are judged against in `record_outcome_at`.
    pub fn select_route_at(&self, partition: &PartitionIdentity, operation: OperationType, now: Instant) -> Vec<RegionEndpoint> {
        let snapshot = self.snapshot.load();
        let preferred = snapshot.topology.preferred();
        let candidates = if operation.is_pinned_to_primary() {
            preferred.to_vec()
        } else {
            snapshot.failover.reorder(partition, preferred)
        };
        RegionSelector::new(&self.store, &snapshot.policy).select_route(partition, operation, &candidates, now)
    }

    /// Fold one regional outcome into breaker and failover state.
    pub fn record_outcome(
        &self,
        partition: &PartitionIdentity,
        region: &RegionEndpoint,
        operation: OperationType,
        outcome: RequestOutcome,
    ) -> OutcomeReport {
        self.record_outcome_at(partition, region, operation, outcome, Instant::now())
    }

    /// Fold one regional outcome into breaker and failover state at an explicit instant.
    pub fn record_outcome_at(
        &self,
        partition: &PartitionIdentity,
        region: &RegionEndpoint,
        operation: OperationType,
        outcome: RequestOutcome,
        now: Instant,
    ) -> OutcomeReport {
        let snapshot = self.snapshot.load();
        let class = classify(&outcome);
        let kind = operation.kind();

        let transition = if snapshot.policy.is_enabled() {
            self.store.compare_and_update(partition, region, |ctx| {
                snapshot.policy.apply(ctx.kind_mut(kind), kind, class, now)
            })
        } else {
            None
        };

        if let Some(t) = transition {
            if t.to == HealthStatus::Unavailable {
                tracing::warn!(
                    partition = %partition,
                    region = %region,
                    kind = %kind,
                    from = %t.from,
                    outcome = %class,
                    threshold = snapshot.policy.threshold(kind),
                    "Location marked unavailable"
                );
            } else {
                tracing::debug!(
                    partition = %partition,
                    region = %region,
                    kind = %kind,
                    from = %t.from,
                    to = %t.to,
                    "Location health changed"
                );
            }
            metrics::record_breaker_transition(t.kind, t.from, t.to);
        }

        let failover = if operation.is_pinned_to_primary() {
            None
        } else {
            snapshot
                .failover
                .record_outcome(partition, region, class, snapshot.topology.preferred(), now)
        };

        OutcomeReport {
            class,
            transition,
            failover,
        }
    }

    /// Reserve a probe slot if the pair is tentative for this operation's kind.
    pub fn try_begin_probe(
        &self,
        partition: &PartitionIdentity,
        region: &RegionEndpoint,
        operation: OperationType,
    ) -> Option<ProbeGuard> {
        self.snapshot
            .load()
            .policy
            .try_begin_probe(&self.store, partition, region, operation.kind())
    }

    /// Status of a pair for the operation's kind; unseen pairs are healthy.
    pub fn location_status(
        &self,
        partition: &PartitionIdentity,
        region: &RegionEndpoint,
        operation: OperationType,
    ) -> HealthStatus {
        self.store.status(partition, region, operation.kind())
    }

    /// Snapshot of a pair's health record, if one exists.
    pub fn location_health(&self, partition: &PartitionIdentity, region: &RegionEndpoint) -> Option<LocationHealthContext> {
        self.store.snapshot(partition, region)
    }

    /// Snapshot of a partition's failover record, if one exists.
    pub fn failover_record(&self, partition: &PartitionIdentity) -> Option<FailoverRecord> {
        self.snapshot.load().failover.record(partition)
    }

    /// Drop the failover override of one partition.
    pub fn reset_failover(&self, partition: &PartitionIdentity) -> bool {
        self.snapshot.load().failover.reset(partition)
    }

    /// Forget everything about a partition that was split or merged away.
    pub fn evict_partition(&self, partition: &PartitionIdentity) {
        let removed = self.store.evict_partition(partition);
        self.snapshot.load().failover.reset(partition);
        tracing::debug!(partition = %partition, removed, "Evicted partition health records");
        metrics::record_tracked_locations(self.store.len());
    }

    /// Run the recovery prober over every unavailable record.
    pub fn sweep(&self, now: Instant) -> usize {
        RecoveryProber::new(self.recovery.load().cooldown).sweep(&self.store, now)
    }

    /// Accept a new configuration. Failover records start empty.
    pub fn reconfigure(&self, config: ClientConfig) -> Result<(), ConfigError> {
        let snapshot = EngineSnapshot::build(config)?;
        let recovery = RecoverySettings::from_config(&snapshot.config.circuit_breaker);
        let previous = self.snapshot.swap(Arc::new(snapshot));
        self.recovery.store(Arc::new(recovery));
        tracing::info!(
            dropped_failover_records = previous.failover.len(),
            "Availability engine reconfigured"
        );
        Ok(())
    }

    /// Start the periodic recovery sweep on the current runtime.
    ///
    /// The task follows later reconfigurations.
    pub fn spawn_recovery_sweeper(&self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let sweeper = RecoverySweeper::new(self.store.clone(), self.recovery.clone());
        tokio::spawn(sweeper.run(shutdown))
    }
}
