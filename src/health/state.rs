//! Location health state machine data.
//!
//! # States
//! - Healthy: receives traffic
//! - HealthyWithFailures: receives traffic, failures are being counted
//! - Unavailable: excluded from routing until the cooldown elapses
//! - HealthyTentative: limited probe traffic decides recovery or regression
//!
//! Read and write bookkeeping are independent: a pair can be unavailable
//! for writes while still serving reads.

use serde::Serialize;
use std::fmt;
use std::time::Instant;

use crate::partition::OperationKind;

/// Health status of a (partition, region) pair for one operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum HealthStatus {
    #[default]
    Healthy,
    HealthyWithFailures,
    Unavailable,
    HealthyTentative,
}

impl HealthStatus {
    /// Ordering used to pick the worse of two statuses.
    fn severity(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 0,
            HealthStatus::HealthyWithFailures => 1,
            HealthStatus::HealthyTentative => 2,
            HealthStatus::Unavailable => 3,
        }
    }

    /// The more severe of two statuses.
    pub fn worse(self, other: HealthStatus) -> HealthStatus {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    /// Regular (non-probe) traffic may be routed here.
    pub fn is_routable(&self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::HealthyWithFailures)
    }

    /// Snake-case label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::HealthyWithFailures => "healthy_with_failures",
            HealthStatus::Unavailable => "unavailable",
            HealthStatus::HealthyTentative => "healthy_tentative",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the last probe against a tentative pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProbeOutcome {
    Succeeded,
    Failed,
}

/// Bookkeeping for one operation kind of one pair.
#[derive(Debug, Clone, Default)]
pub struct KindHealth {
    pub status: HealthStatus,
    /// Reset to zero on any success of this kind.
    pub consecutive_exception_count: u32,
    /// Set when entering `Unavailable`.
    pub unavailable_since: Option<Instant>,
    pub last_probe_outcome: Option<ProbeOutcome>,
    /// Probe requests currently in flight while `HealthyTentative`.
    pub probes_in_flight: u32,
}

impl KindHealth {
    pub(crate) fn mark_unavailable(&mut self, now: Instant) {
        self.status = HealthStatus::Unavailable;
        self.unavailable_since = Some(now);
        self.probes_in_flight = 0;
    }

    pub(crate) fn mark_healthy(&mut self) {
        self.status = HealthStatus::Healthy;
        self.consecutive_exception_count = 0;
        self.unavailable_since = None;
        self.probes_in_flight = 0;
    }
}

/// Per (partition, region) health record.
#[derive(Debug, Clone, Default)]
pub struct LocationHealthContext {
    read: KindHealth,
    write: KindHealth,
}

impl LocationHealthContext {
    /// A healthy context for both kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bookkeeping for one kind.
    pub fn kind(&self, kind: OperationKind) -> &KindHealth {
        match kind {
            OperationKind::Read => &self.read,
            OperationKind::Write => &self.write,
        }
    }

    /// Mutable bookkeeping for one kind.
    pub fn kind_mut(&mut self, kind: OperationKind) -> &mut KindHealth {
        match kind {
            OperationKind::Read => &mut self.read,
            OperationKind::Write => &mut self.write,
        }
    }

    /// The worse of the read and write statuses.
    pub fn status(&self) -> HealthStatus {
        self.read.status.worse(self.write.status)
    }

    /// Status for one kind.
    pub fn status_for(&self, kind: OperationKind) -> HealthStatus {
        self.kind(kind).status
    }

    /// Consecutive eligible read failures.
    pub fn consecutive_read_exception_count(&self) -> u32 {
        self.read.consecutive_exception_count
    }

    /// Consecutive eligible write failures.
    pub fn consecutive_write_exception_count(&self) -> u32 {
        self.write.consecutive_exception_count
    }

    /// When the kind became unavailable, if it is.
    pub fn unavailable_since(&self, kind: OperationKind) -> Option<Instant> {
        self.kind(kind).unavailable_since
    }

    /// Result of the last probe for one kind.
    pub fn last_probe_outcome(&self, kind: OperationKind) -> Option<ProbeOutcome> {
        self.kind(kind).last_probe_outcome
    }
}
