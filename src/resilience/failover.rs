//! Per-partition automatic failover (PPAF).
//!
//! # Responsibilities
//! - Track, per partition, which regions it has failed over from
//! - Fail over on server-generated unavailability or repeated end-to-end timeouts
//! - Reorder the preferred regions so the override target is tried first
//!
//! # Design Decisions
//! - Coarser than the breaker: keyed by partition only
//! - Independent of breaker counters; a failover never resets them
//! - Only outcomes against the partition's current target region count
//! - When every region has been failed over from, the record wraps around

use dashmap::DashMap;
use std::fmt;
use std::time::Instant;

use crate::config::FailoverConfig;
use crate::observability::metrics;
use crate::partition::{PartitionIdentity, RegionEndpoint};
use crate::resilience::classify::{FailureKind, OutcomeClass};

/// Failover state of one partition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailoverRecord {
    pub current_region_override: Option<RegionEndpoint>,
    pub failed_over_at: Option<Instant>,
    pub consecutive_e2e_timeout_hit_count: u32,
    /// Regions this partition moved away from, in failover order.
    pub failed_regions: Vec<RegionEndpoint>,
}

impl FailoverRecord {
    /// The region the partition currently targets.
    pub fn current_target<'a>(&'a self, preferred: &'a [RegionEndpoint]) -> Option<&'a RegionEndpoint> {
        self.current_region_override
            .as_ref()
            .or_else(|| preferred.iter().find(|r| !self.failed_regions.contains(r)))
    }

    fn fail_over(&mut self, from: &RegionEndpoint, preferred: &[RegionEndpoint], now: Instant) -> Option<RegionEndpoint> {
        if !self.failed_regions.contains(from) {
            self.failed_regions.push(from.clone());
        }
        self.consecutive_e2e_timeout_hit_count = 0;
        self.failed_over_at = Some(now);

        let next = preferred
            .iter()
            .find(|r| !self.failed_regions.contains(r))
            .cloned();
        if next.is_none() {
            self.failed_regions.clear();
        }
        self.current_region_override = next.clone();
        next
    }
}

/// What caused a failover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailoverTrigger {
    ServerError(FailureKind),
    EndToEndTimeouts(u32),
}

impl FailoverTrigger {
    /// Metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailoverTrigger::ServerError(_) => "server_error",
            FailoverTrigger::EndToEndTimeouts(_) => "e2e_timeouts",
        }
    }
}

impl fmt::Display for FailoverTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailoverTrigger::ServerError(kind) => write!(f, "server error ({})", kind.as_str()),
            FailoverTrigger::EndToEndTimeouts(hits) => write!(f, "{} consecutive end-to-end timeouts", hits),
        }
    }
}

/// A failover that just happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverEvent {
    pub partition: PartitionIdentity,
    pub from: RegionEndpoint,
    /// `None` when the record wrapped back to the preferred order.
    pub to: Option<RegionEndpoint>,
    pub trigger: FailoverTrigger,
}

/// Partition-scoped failover overrides.
#[derive(Debug)]
pub struct FailoverOrchestrator {
    enabled: bool,
    e2e_timeout_hit_threshold: u32,
    records: DashMap<PartitionIdentity, FailoverRecord>,
}

impl FailoverOrchestrator {
    /// Build the orchestrator from configuration.
    pub fn from_config(config: &FailoverConfig) -> Self {
        Self {
            enabled: config.enabled,
            e2e_timeout_hit_threshold: config.e2e_timeout_hit_threshold,
            records: DashMap::new(),
        }
    }

    /// Whether PPAF is switched on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Observe one classified outcome. Returns the failover it caused, if any.
    pub fn record_outcome(
        &self,
        partition: &PartitionIdentity,
        region: &RegionEndpoint,
        class: OutcomeClass,
        preferred: &[RegionEndpoint],
        now: Instant,
    ) -> Option<FailoverEvent> {
        if !self.enabled {
            return None;
        }

        let server_error = match class {
            OutcomeClass::Success => {
                if let Some(mut record) = self.records.get_mut(partition) {
                    if record.current_target(preferred) == Some(region) {
                        record.consecutive_e2e_timeout_hit_count = 0;
                    }
                }
                return None;
            }
            OutcomeClass::Eligible(kind) if kind.triggers_partition_failover() => Some(kind),
            OutcomeClass::ClientTimeout => None,
            _ => return None,
        };

        // Target check, hit count and failover happen under one entry guard.
        let mut record = self.records.entry(partition.clone()).or_default();
        if record.current_target(preferred) != Some(region) {
            return None;
        }

        let trigger = match server_error {
            Some(kind) => FailoverTrigger::ServerError(kind),
            None => {
                record.consecutive_e2e_timeout_hit_count += 1;
                let hits = record.consecutive_e2e_timeout_hit_count;
                if hits < self.e2e_timeout_hit_threshold {
                    tracing::debug!(
                        partition = %partition,
                        region = %region,
                        hits,
                        threshold = self.e2e_timeout_hit_threshold,
                        "End-to-end timeout hit recorded"
                    );
                    return None;
                }
                FailoverTrigger::EndToEndTimeouts(hits)
            }
        };

        let to = record.fail_over(region, preferred, now);
        drop(record);

        match &to {
            Some(target) => tracing::warn!(
                partition = %partition,
                from = %region,
                to = %target,
                trigger = %trigger,
                "Partition failed over to next preferred region"
            ),
            None => tracing::warn!(
                partition = %partition,
                from = %region,
                trigger = %trigger,
                "All regions failed over, resetting partition to preferred order"
            ),
        }
        metrics::record_failover(trigger.as_str());

        Some(FailoverEvent {
            partition: partition.clone(),
            from: region.clone(),
            to,
            trigger,
        })
    }

    /// Apply the partition's override to a preferred-region list.
    ///
    /// The override comes first, regions already failed over from are
    /// dropped. Never returns an empty list for a non-empty input.
    pub fn reorder(&self, partition: &PartitionIdentity, preferred: &[RegionEndpoint]) -> Vec<RegionEndpoint> {
        if !self.enabled {
            return preferred.to_vec();
        }
        let Some(record) = self.records.get(partition) else {
            return preferred.to_vec();
        };

        let mut route = Vec::with_capacity(preferred.len());
        if let Some(target) = &record.current_region_override {
            if preferred.contains(target) {
                route.push(target.clone());
            }
        }
        for region in preferred {
            if !record.failed_regions.contains(region) && !route.contains(region) {
                route.push(region.clone());
            }
        }

        if route.is_empty() {
            preferred.to_vec()
        } else {
            route
        }
    }

    /// Snapshot of a partition's record.
    pub fn record(&self, partition: &PartitionIdentity) -> Option<FailoverRecord> {
        self.records.get(partition).map(|r| r.value().clone())
    }

    /// Drop the override of one partition.
    pub fn reset(&self, partition: &PartitionIdentity) -> bool {
        self.records.remove(partition).is_some()
    }

    /// Drop every partition's record.
    pub fn clear(&self) {
        self.records.clear();
    }

    /// Number of partitions with a record.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no partition has a record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(name: &str) -> RegionEndpoint {
        RegionEndpoint::new(name, format!("https://{}.example.com/", name).parse().unwrap())
    }

    fn enabled() -> FailoverOrchestrator {
        FailoverOrchestrator::from_config(&FailoverConfig {
            enabled: true,
            e2e_timeout_hit_threshold: 2,
        })
    }

    fn regions() -> Vec<RegionEndpoint> {
        vec![region("a"), region("b"), region("c")]
    }

    const UNAVAILABLE: OutcomeClass = OutcomeClass::Eligible(FailureKind::ServiceUnavailable);

    #[test]
    fn test_disabled_is_inert() {
        let ppaf = FailoverOrchestrator::from_config(&FailoverConfig::default());
        let p = PartitionIdentity::new("coll", "0");
        let now = Instant::now();
        assert!(ppaf.record_outcome(&p, &region("a"), UNAVAILABLE, &regions(), now).is_none());
        assert_eq!(ppaf.reorder(&p, &regions()), regions());
        assert!(ppaf.is_empty());
    }

    #[test]
    fn test_server_unavailable_fails_over() {
        let ppaf = enabled();
        let p = PartitionIdentity::new("coll", "0");
        let now = Instant::now();

        let event = ppaf.record_outcome(&p, &region("a"), UNAVAILABLE, &regions(), now).unwrap();
        assert_eq!(event.to, Some(region("b")));
        assert_eq!(event.trigger, FailoverTrigger::ServerError(FailureKind::ServiceUnavailable));
        assert_eq!(ppaf.reorder(&p, &regions()), vec![region("b"), region("c")]);

        let record = ppaf.record(&p).unwrap();
        assert_eq!(record.current_region_override, Some(region("b")));
        assert_eq!(record.failed_over_at, Some(now));
    }

    #[test]
    fn test_non_triggering_errors_ignored() {
        let ppaf = enabled();
        let p = PartitionIdentity::new("coll", "0");
        let now = Instant::now();
        for class in [
            OutcomeClass::Eligible(FailureKind::Throttled),
            OutcomeClass::Eligible(FailureKind::Gone),
            OutcomeClass::NotEligible,
            OutcomeClass::ClientCancelled,
        ] {
            assert!(ppaf.record_outcome(&p, &region("a"), class, &regions(), now).is_none());
        }
        assert_eq!(ppaf.reorder(&p, &regions()), regions());
    }

    #[test]
    fn test_timeout_hits_reach_threshold() {
        let ppaf = enabled();
        let p = PartitionIdentity::new("coll", "0");
        let now = Instant::now();

        assert!(ppaf
            .record_outcome(&p, &region("a"), OutcomeClass::ClientTimeout, &regions(), now)
            .is_none());
        assert_eq!(ppaf.reorder(&p, &regions()), regions());

        let event = ppaf
            .record_outcome(&p, &region("a"), OutcomeClass::ClientTimeout, &regions(), now)
            .unwrap();
        assert_eq!(event.trigger, FailoverTrigger::EndToEndTimeouts(2));
        assert_eq!(ppaf.reorder(&p, &regions())[0], region("b"));
        assert_eq!(ppaf.record(&p).unwrap().consecutive_e2e_timeout_hit_count, 0);
    }

    #[test]
    fn test_success_resets_timeout_hits() {
        let ppaf = enabled();
        let p = PartitionIdentity::new("coll", "0");
        let now = Instant::now();

        ppaf.record_outcome(&p, &region("a"), OutcomeClass::ClientTimeout, &regions(), now);
        ppaf.record_outcome(&p, &region("a"), OutcomeClass::Success, &regions(), now);
        assert!(ppaf
            .record_outcome(&p, &region("a"), OutcomeClass::ClientTimeout, &regions(), now)
            .is_none());
        assert_eq!(ppaf.record(&p).unwrap().consecutive_e2e_timeout_hit_count, 1);
    }

    #[test]
    fn test_only_current_target_counts() {
        let ppaf = enabled();
        let p = PartitionIdentity::new("coll", "0");
        let now = Instant::now();

        // "b" is not the current target while "a" is healthy.
        assert!(ppaf.record_outcome(&p, &region("b"), UNAVAILABLE, &regions(), now).is_none());
        assert_eq!(ppaf.reorder(&p, &regions()), regions());
    }

    #[test]
    fn test_wraps_after_all_regions_failed() {
        let ppaf = enabled();
        let p = PartitionIdentity::new("coll", "0");
        let now = Instant::now();

        ppaf.record_outcome(&p, &region("a"), UNAVAILABLE, &regions(), now);
        ppaf.record_outcome(&p, &region("b"), UNAVAILABLE, &regions(), now);
        assert_eq!(ppaf.reorder(&p, &regions()), vec![region("c")]);

        let event = ppaf.record_outcome(&p, &region("c"), UNAVAILABLE, &regions(), now).unwrap();
        assert_eq!(event.to, None);
        assert_eq!(ppaf.reorder(&p, &regions()), regions());
    }

    #[test]
    fn test_reset_and_clear() {
        let ppaf = enabled();
        let p0 = PartitionIdentity::new("coll", "0");
        let p1 = PartitionIdentity::new("coll", "1");
        let now = Instant::now();

        ppaf.record_outcome(&p0, &region("a"), UNAVAILABLE, &regions(), now);
        ppaf.record_outcome(&p1, &region("a"), UNAVAILABLE, &regions(), now);
        assert!(ppaf.reset(&p0));
        assert!(!ppaf.reset(&p0));
        assert_eq!(ppaf.reorder(&p0, &regions()), regions());
        assert_eq!(ppaf.len(), 1);

        ppaf.clear();
        assert!(ppaf.is_empty());
    }

    #[test]
    fn test_stale_outcome_after_failover_is_ignored() {
        let ppaf = enabled();
        let p = PartitionIdentity::new("coll", "0");
        let first = Instant::now();

        ppaf.record_outcome(&p, &region("a"), UNAVAILABLE, &regions(), first).unwrap();
        let later = first + std::time::Duration::from_secs(5);
        assert!(ppaf.record_outcome(&p, &region("a"), UNAVAILABLE, &regions(), later).is_none());
        assert!(ppaf
            .record_outcome(&p, &region("a"), OutcomeClass::ClientTimeout, &regions(), later)
            .is_none());

        let record = ppaf.record(&p).unwrap();
        assert_eq!(record.failed_over_at, Some(first));
        assert_eq!(record.failed_regions, vec![region("a")]);
        assert_eq!(record.consecutive_e2e_timeout_hit_count, 0);
    }

    #[test]
    fn test_concurrent_failures_fail_over_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Barrier;

        let ppaf = enabled();
        let p = PartitionIdentity::new("coll", "0");
        let preferred = regions();
        let events = AtomicUsize::new(0);
        let barrier = Barrier::new(16);

        std::thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    barrier.wait();
                    if ppaf
                        .record_outcome(&p, &region("a"), UNAVAILABLE, &preferred, Instant::now())
                        .is_some()
                    {
                        events.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(events.load(Ordering::SeqCst), 1);
        let record = ppaf.record(&p).unwrap();
        assert_eq!(record.failed_regions, vec![region("a")]);
        assert_eq!(record.current_region_override, Some(region("b")));
    }
}
