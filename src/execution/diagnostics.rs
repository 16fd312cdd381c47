//! Per-operation diagnostics record.
//!
//! `contacted_regions` lists every region actually attempted, in attempt
//! order. A region appears twice only if it was genuinely retried.

use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::partition::{OperationType, PartitionIdentity, RegionEndpoint};

/// One regional attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptRecord {
    pub region: String,
    pub status_code: Option<u16>,
    pub sub_status_code: Option<u32>,
    /// How availability bookkeeping classified the outcome.
    pub outcome: String,
    /// Sent as a recovery probe to a tentative location.
    pub probe: bool,
    pub duration_ms: u64,
}

/// How the operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FinalStatus {
    Completed { status_code: u16, sub_status_code: u32 },
    EndToEndTimeout,
    NoRegions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationDiagnostics {
    pub activity_id: Uuid,
    pub operation: OperationType,
    pub partition: PartitionIdentity,
    pub contacted_regions: Vec<String>,
    pub retry_count: u32,
    pub attempts: Vec<AttemptRecord>,
    pub final_status: Option<FinalStatus>,
    pub duration_ms: u64,
}

impl OperationDiagnostics {
    /// Empty record for a new operation.
    pub fn new(activity_id: Uuid, operation: OperationType, partition: &PartitionIdentity) -> Self {
        Self {
            activity_id,
            operation,
            partition: partition.clone(),
            contacted_regions: Vec::new(),
            retry_count: 0,
            attempts: Vec::new(),
            final_status: None,
            duration_ms: 0,
        }
    }

    /// Append one regional attempt.
    pub fn record_attempt(&mut self, region: &RegionEndpoint, attempt: AttemptRecord) {
        self.contacted_regions.push(region.name.clone());
        self.attempts.push(attempt);
        self.retry_count = self.attempts.len().saturating_sub(1) as u32;
    }

    /// Stamp the final status and total duration.
    pub fn finish(&mut self, status: FinalStatus, elapsed: Duration) {
        self.final_status = Some(status);
        self.duration_ms = elapsed.as_millis() as u64;
    }

    /// Number of regional attempts.
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    /// Serialize to a single JSON line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
