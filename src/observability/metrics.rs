//! Metrics collection.
//!
//! # Metrics
//! - `partition_breaker_transitions_total` (counter): status changes by kind, from, to
//! - `partition_breaker_tracked_locations` (gauge): number of (partition, region) records
//! - `partition_failovers_total` (counter): PPAF failovers by trigger
//! - `partition_requests_total` (counter): completed operations by type and status
//! - `partition_request_attempts` (histogram): regional attempts per operation

use crate::health::HealthStatus;
use crate::partition::{OperationKind, OperationType};

/// Count a breaker status change.
pub fn record_breaker_transition(kind: OperationKind, from: HealthStatus, to: HealthStatus) {
    ::metrics::counter!(
        "partition_breaker_transitions_total",
        "kind" => kind.as_str(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
}

/// Set the number of tracked (partition, region) records.
pub fn record_tracked_locations(count: usize) {
    ::metrics::gauge!("partition_breaker_tracked_locations").set(count as f64);
}

/// Count a partition failover.
pub fn record_failover(trigger: &'static str) {
    ::metrics::counter!("partition_failovers_total", "trigger" => trigger).increment(1);
}

/// Count a completed operation and record its attempt count.
pub fn record_request(operation: OperationType, status: u16, attempts: usize) {
    ::metrics::counter!(
        "partition_requests_total",
        "operation" => operation.as_str(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("partition_request_attempts").record(attempts as f64);
}
