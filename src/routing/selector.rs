//! Region selection for one request.
//!
//! # Responsibilities
//! - Order candidate regions for a (partition, operation)
//! - Exclude unavailable pairs, admit at most one probe candidate
//! - Guarantee a non-empty route

use std::time::Instant;

use crate::health::recovery::RecoveryProber;
use crate::health::state::{HealthStatus, KindHealth};
use crate::health::store::HealthRecordStore;
use crate::observability::metrics;
use crate::partition::{LocationKey, OperationKind, OperationType, PartitionIdentity, RegionEndpoint};
use crate::resilience::circuit_breaker::CircuitBreakerPolicy;

/// Breaker-aware region ordering.
#[derive(Debug, Clone, Copy)]
pub struct RegionSelector<'a> {
    store: &'a HealthRecordStore,
    policy: &'a CircuitBreakerPolicy,
    prober: RecoveryProber,
}

impl<'a> RegionSelector<'a> {
    /// Create a selector over a store and the breaker policy.
    pub fn new(store: &'a HealthRecordStore, policy: &'a CircuitBreakerPolicy) -> Self {
        Self {
            store,
            policy,
            prober: RecoveryProber::new(policy.cooldown()),
        }
    }

    /// Ordered regions to attempt for one request.
    pub fn select_route(
        &self,
        partition: &PartitionIdentity,
        operation: OperationType,
        preferred: &[RegionEndpoint],
        now: Instant,
    ) -> Vec<RegionEndpoint> {
        let Some(primary) = preferred.first() else {
            return Vec::new();
        };
        if !self.policy.is_enabled() {
            return preferred.to_vec();
        }

        let kind = operation.kind();
        let mut route = Vec::with_capacity(preferred.len());
        let mut probe: Option<&RegionEndpoint> = None;
        // Most recently healthy among the unavailable ones.
        let mut fallback: Option<(Instant, &RegionEndpoint)> = None;

        for region in preferred {
            let Some(health) = self.current_health(partition, region, kind, now) else {
                route.push(region.clone());
                continue;
            };
            match health.status {
                status if status.is_routable() => route.push(region.clone()),
                HealthStatus::HealthyTentative => {
                    if probe.is_none() && self.policy.has_probe_capacity(&health) {
                        probe = Some(region);
                    }
                }
                // Unavailable
                _ => {
                    if let Some(since) = health.unavailable_since {
                        if fallback.map_or(true, |(latest, _)| since > latest) {
                            fallback = Some((since, region));
                        }
                    }
                }
            }
        }

        route.extend(probe.cloned());

        if route.is_empty() {
            let best = fallback.map(|(_, region)| region).unwrap_or(primary);
            tracing::debug!(
                partition = %partition,
                kind = %kind,
                region = %best,
                "Every preferred region is unavailable, failing open"
            );
            route.push(best.clone());
        }

        if operation.is_pinned_to_primary() {
            route.retain(|region| region != primary);
            route.insert(0, primary.clone());
        }

        route
    }

    /// Health of one kind, running the recovery prober on unavailable pairs.
    fn current_health(
        &self,
        partition: &PartitionIdentity,
        region: &RegionEndpoint,
        kind: OperationKind,
        now: Instant,
    ) -> Option<KindHealth> {
        let snapshot = self.store.snapshot(partition, region)?;
        let health = snapshot.kind(kind);
        if health.status != HealthStatus::Unavailable {
            return Some(health.clone());
        }

        let key = LocationKey::new(partition, region);
        self.store.update_existing(&key, |ctx| {
            let health = ctx.kind_mut(kind);
            if self.prober.evaluate(health, now) {
                tracing::info!(location = %key, kind = %kind, "Location cooldown elapsed, allowing probe traffic");
                metrics::record_breaker_transition(kind, HealthStatus::Unavailable, HealthStatus::HealthyTentative);
            }
            health.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CircuitBreakerConfig;
    use std::time::Duration;

    fn region(name: &str) -> RegionEndpoint {
        RegionEndpoint::new(name, format!("https://{}.example.com/", name).parse().unwrap())
    }

    fn regions() -> Vec<RegionEndpoint> {
        vec![region("a"), region("b"), region("c")]
    }

    fn policy() -> CircuitBreakerPolicy {
        CircuitBreakerPolicy::from_config(&CircuitBreakerConfig {
            cooldown_secs: 30,
            ..Default::default()
        })
    }

    fn set_status(
        store: &HealthRecordStore,
        p: &PartitionIdentity,
        r: &RegionEndpoint,
        kind: OperationKind,
        status: HealthStatus,
        since: Option<Instant>,
    ) {
        store.compare_and_update(p, r, |ctx| {
            let health = ctx.kind_mut(kind);
            health.status = status;
            health.unavailable_since = since;
        });
    }

    #[test]
    fn test_all_healthy_keeps_order() {
        let store = HealthRecordStore::new();
        let policy = policy();
        let selector = RegionSelector::new(&store, &policy);
        let p = PartitionIdentity::new("coll", "0");

        let route = selector.select_route(&p, OperationType::Read, &regions(), Instant::now());
        assert_eq!(route, regions());
        assert!(store.is_empty(), "selection must not materialize records");
    }

    #[test]
    fn test_unavailable_excluded_per_kind() {
        let store = HealthRecordStore::new();
        let policy = policy();
        let selector = RegionSelector::new(&store, &policy);
        let p = PartitionIdentity::new("coll", "0");
        let now = Instant::now();

        set_status(&store, &p, &region("a"), OperationKind::Write, HealthStatus::Unavailable, Some(now));

        let writes = selector.select_route(&p, OperationType::Upsert, &regions(), now);
        assert_eq!(writes, vec![region("b"), region("c")]);

        let reads = selector.select_route(&p, OperationType::Read, &regions(), now);
        assert_eq!(reads, regions());
    }

    #[test]
    fn test_healthy_with_failures_still_routable() {
        let store = HealthRecordStore::new();
        let policy = policy();
        let selector = RegionSelector::new(&store, &policy);
        let p = PartitionIdentity::new("coll", "0");

        set_status(&store, &p, &region("a"), OperationKind::Read, HealthStatus::HealthyWithFailures, None);
        let route = selector.select_route(&p, OperationType::Query, &regions(), Instant::now());
        assert_eq!(route, regions());
    }

    #[test]
    fn test_single_probe_candidate_after_healthy() {
        let store = HealthRecordStore::new();
        let policy = policy();
        let selector = RegionSelector::new(&store, &policy);
        let p = PartitionIdentity::new("coll", "0");

        set_status(&store, &p, &region("a"), OperationKind::Read, HealthStatus::HealthyTentative, None);
        set_status(&store, &p, &region("b"), OperationKind::Read, HealthStatus::HealthyTentative, None);

        let route = selector.select_route(&p, OperationType::Read, &regions(), Instant::now());
        assert_eq!(route, vec![region("c"), region("a")]);
    }

    #[test]
    fn test_exhausted_probe_budget_excludes_tentative() {
        let store = HealthRecordStore::new();
        let policy = policy();
        let selector = RegionSelector::new(&store, &policy);
        let p = PartitionIdentity::new("coll", "0");

        store.compare_and_update(&p, &region("a"), |ctx| {
            let health = ctx.kind_mut(OperationKind::Read);
            health.status = HealthStatus::HealthyTentative;
            health.probes_in_flight = 1;
        });

        let route = selector.select_route(&p, OperationType::Read, &regions(), Instant::now());
        assert_eq!(route, vec![region("b"), region("c")]);
    }

    #[test]
    fn test_fail_open_picks_most_recently_healthy() {
        let store = HealthRecordStore::new();
        let policy = policy();
        let selector = RegionSelector::new(&store, &policy);
        let p = PartitionIdentity::new("coll", "0");
        let now = Instant::now();

        set_status(&store, &p, &region("a"), OperationKind::Read, HealthStatus::Unavailable, Some(now));
        set_status(
            &store,
            &p,
            &region("b"),
            OperationKind::Read,
            HealthStatus::Unavailable,
            Some(now + Duration::from_secs(2)),
        );
        set_status(
            &store,
            &p,
            &region("c"),
            OperationKind::Read,
            HealthStatus::Unavailable,
            Some(now + Duration::from_secs(1)),
        );

        let route = selector.select_route(&p, OperationType::Read, &regions(), now + Duration::from_secs(3));
        assert_eq!(route, vec![region("b")]);
    }

    #[test]
    fn test_fail_open_defaults_to_first_preferred() {
        let store = HealthRecordStore::new();
        let policy = policy();
        let selector = RegionSelector::new(&store, &policy);
        let p = PartitionIdentity::new("coll", "0");

        for r in regions() {
            set_status(&store, &p, &r, OperationKind::Write, HealthStatus::Unavailable, None);
        }
        let route = selector.select_route(&p, OperationType::Create, &regions(), Instant::now());
        assert_eq!(route, vec![region("a")]);
    }

    #[test]
    fn test_lazy_recovery_on_access() {
        let store = HealthRecordStore::new();
        let policy = policy();
        let selector = RegionSelector::new(&store, &policy);
        let p = PartitionIdentity::new("coll", "0");
        let tripped = Instant::now();

        set_status(&store, &p, &region("a"), OperationKind::Read, HealthStatus::Unavailable, Some(tripped));

        let early = selector.select_route(&p, OperationType::Read, &regions(), tripped + Duration::from_secs(10));
        assert_eq!(early, vec![region("b"), region("c")]);

        let later = selector.select_route(&p, OperationType::Read, &regions(), tripped + Duration::from_secs(30));
        assert_eq!(later, vec![region("b"), region("c"), region("a")]);
        assert_eq!(
            store.status(&p, &region("a"), OperationKind::Read),
            HealthStatus::HealthyTentative
        );
    }

    #[test]
    fn test_query_plan_pinned_to_primary() {
        let store = HealthRecordStore::new();
        let policy = policy();
        let selector = RegionSelector::new(&store, &policy);
        let p = PartitionIdentity::new("coll", "0");
        let now = Instant::now();

        set_status(&store, &p, &region("a"), OperationKind::Read, HealthStatus::Unavailable, Some(now));

        let plan = selector.select_route(&p, OperationType::QueryPlan, &regions(), now);
        assert_eq!(plan, vec![region("a"), region("b"), region("c")]);

        let query = selector.select_route(&p, OperationType::Query, &regions(), now);
        assert_eq!(query, vec![region("b"), region("c")]);
    }

    #[test]
    fn test_disabled_breaker_passes_through() {
        let store = HealthRecordStore::new();
        let policy = CircuitBreakerPolicy::from_config(&CircuitBreakerConfig {
            enabled: false,
            ..Default::default()
        });
        let selector = RegionSelector::new(&store, &policy);
        let p = PartitionIdentity::new("coll", "0");
        let now = Instant::now();

        set_status(&store, &p, &region("a"), OperationKind::Read, HealthStatus::Unavailable, Some(now));
        assert_eq!(selector.select_route(&p, OperationType::Read, &regions(), now), regions());
    }

    #[test]
    fn test_empty_preferred() {
        let store = HealthRecordStore::new();
        let policy = policy();
        let selector = RegionSelector::new(&store, &policy);
        let p = PartitionIdentity::new("coll", "0");
        assert!(selector.select_route(&p, OperationType::Read, &[], Instant::now()).is_empty());
    }
}
