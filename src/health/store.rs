//! Concurrent health record store.
//!
//! # Responsibilities
//! - Atomic get-or-create of one context per (partition, region)
//! - Apply updates to a context under its own lock
//! - Evict records for partitions dropped from metadata

use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::partition::{LocationKey, OperationKind, PartitionIdentity, RegionEndpoint};
use crate::health::state::{HealthStatus, LocationHealthContext};

type SharedContext = Arc<Mutex<LocationHealthContext>>;

/// Flat map from (partition, region) to its health context.
#[derive(Debug, Default)]
pub struct HealthRecordStore {
    records: DashMap<LocationKey, SharedContext>,
}

impl HealthRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared context, creating it on first use.
    ///
    /// The map shard lock is released before the context is returned.
    fn handle(&self, partition: &PartitionIdentity, region: &RegionEndpoint) -> SharedContext {
        let key = LocationKey::new(partition, region);
        if let Some(existing) = self.records.get(&key) {
            return existing.value().clone();
        }
        self.records
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(LocationHealthContext::new())))
            .value()
            .clone()
    }

    /// Snapshot of the context for a pair, creating a healthy one if unseen.
    pub fn get_or_create(&self, partition: &PartitionIdentity, region: &RegionEndpoint) -> LocationHealthContext {
        let handle = self.handle(partition, region);
        let ctx = handle.lock().unwrap_or_else(PoisonError::into_inner);
        ctx.clone()
    }

    /// Snapshot of the context for a pair without creating one.
    pub fn snapshot(&self, partition: &PartitionIdentity, region: &RegionEndpoint) -> Option<LocationHealthContext> {
        let handle = self
            .records
            .get(&LocationKey::new(partition, region))
            .map(|entry| entry.value().clone())?;
        let ctx = handle.lock().unwrap_or_else(PoisonError::into_inner);
        Some(ctx.clone())
    }

    /// Status of a pair for one kind; unseen pairs are healthy.
    pub fn status(&self, partition: &PartitionIdentity, region: &RegionEndpoint, kind: OperationKind) -> HealthStatus {
        self.snapshot(partition, region)
            .map(|ctx| ctx.status_for(kind))
            .unwrap_or_default()
    }

    /// Apply `update` atomically to the context of a pair.
    ///
    /// Concurrent updates to the same pair are serialized; updates to
    /// different pairs never contend.
    pub fn compare_and_update<R>(
        &self,
        partition: &PartitionIdentity,
        region: &RegionEndpoint,
        update: impl FnOnce(&mut LocationHealthContext) -> R,
    ) -> R {
        let handle = self.handle(partition, region);
        let mut ctx = handle.lock().unwrap_or_else(PoisonError::into_inner);
        update(&mut ctx)
    }

    /// Like `compare_and_update`, but a no-op for pairs that were never seen.
    pub fn update_existing<R>(
        &self,
        key: &LocationKey,
        update: impl FnOnce(&mut LocationHealthContext) -> R,
    ) -> Option<R> {
        let handle = self.records.get(key).map(|entry| entry.value().clone())?;
        let mut ctx = handle.lock().unwrap_or_else(PoisonError::into_inner);
        Some(update(&mut ctx))
    }

    /// Keys of every pair currently unavailable for at least one kind.
    pub fn unavailable_keys(&self) -> Vec<LocationKey> {
        self.records
            .iter()
            .filter(|entry| {
                let ctx = entry.value().lock().unwrap_or_else(PoisonError::into_inner);
                ctx.status() == HealthStatus::Unavailable
            })
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Drop every record of a partition. Returns the number removed.
    pub fn evict_partition(&self, partition: &PartitionIdentity) -> usize {
        let before = self.records.len();
        self.records.retain(|key, _| &key.partition != partition);
        before.saturating_sub(self.records.len())
    }

    /// Number of tracked pairs.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no pair is tracked.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
