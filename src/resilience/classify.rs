//! Outcome classification.
//!
//! # Responsibilities
//! - Turn a raw request outcome into its effect on breaker and failover
//! - Keep the eligible-failure set in one place
//!
//! # Design Decisions
//! - Classification is by effect, not by transport-specific code
//! - Application-level rejections (404, 409, 400, ...) never count
//! - Client-local cancellation is distinct from any server failure

use serde::Serialize;
use std::fmt;

/// Status codes the classifier distinguishes.
pub mod status {
    pub const OK: u16 = 200;
    pub const NOT_MODIFIED: u16 = 304;
    pub const BAD_REQUEST: u16 = 400;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const CONFLICT: u16 = 409;
    pub const GONE: u16 = 410;
    pub const TOO_MANY_REQUESTS: u16 = 429;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
    pub const SERVICE_UNAVAILABLE: u16 = 503;
}

/// Sub-status codes the classifier distinguishes.
pub mod sub_status {
    pub const UNKNOWN: u32 = 0;
    /// 403: the region is no longer writable.
    pub const WRITE_FORBIDDEN: u32 = 3;
    /// 404: the region has not caught up with the session token.
    pub const READ_SESSION_NOT_AVAILABLE: u32 = 1002;
}

/// Why a request was cancelled on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The end-to-end operation deadline expired locally.
    EndToEndTimeout,
    /// The caller dropped or cancelled the operation.
    Caller,
}

/// Raw outcome of one regional attempt, as reported by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Success,
    Failure { status_code: u16, sub_status_code: u32 },
    Cancelled(CancelReason),
}

impl RequestOutcome {
    /// A failure with a status pair.
    pub fn failure(status_code: u16, sub_status_code: u32) -> Self {
        RequestOutcome::Failure {
            status_code,
            sub_status_code,
        }
    }
}

/// Failures that count toward the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    ServiceUnavailable,
    Gone,
    InternalServerError,
    Throttled,
    WriteForbidden,
    ReadSessionNotAvailable,
}

impl FailureKind {
    /// Server-generated unavailability that moves a partition to another region.
    pub fn triggers_partition_failover(&self) -> bool {
        matches!(self, FailureKind::ServiceUnavailable | FailureKind::WriteForbidden)
    }

    /// Snake-case label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ServiceUnavailable => "service_unavailable",
            FailureKind::Gone => "gone",
            FailureKind::InternalServerError => "internal_server_error",
            FailureKind::Throttled => "throttled",
            FailureKind::WriteForbidden => "write_forbidden",
            FailureKind::ReadSessionNotAvailable => "read_session_not_available",
        }
    }
}

/// Effect of an outcome on availability bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeClass {
    Success,
    /// Counts toward the breaker; the caller should try the next region.
    Eligible(FailureKind),
    /// A healthy backend rejecting the request; terminal, never counted.
    NotEligible,
    ClientTimeout,
    ClientCancelled,
}

impl OutcomeClass {
    /// Whether the caller should try the next region.
    pub fn is_retryable_elsewhere(&self) -> bool {
        matches!(self, OutcomeClass::Eligible(_))
    }
}

impl fmt::Display for OutcomeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeClass::Success => f.write_str("success"),
            OutcomeClass::Eligible(kind) => f.write_str(kind.as_str()),
            OutcomeClass::NotEligible => f.write_str("not_eligible"),
            OutcomeClass::ClientTimeout => f.write_str("client_timeout"),
            OutcomeClass::ClientCancelled => f.write_str("client_cancelled"),
        }
    }
}

/// Classify a failure status pair.
pub fn classify_failure(status_code: u16, sub_status_code: u32) -> OutcomeClass {
    use status::*;

    let kind = match (status_code, sub_status_code) {
        (SERVICE_UNAVAILABLE, _) => FailureKind::ServiceUnavailable,
        (GONE, _) => FailureKind::Gone,
        (INTERNAL_SERVER_ERROR, _) => FailureKind::InternalServerError,
        (TOO_MANY_REQUESTS, _) => FailureKind::Throttled,
        (FORBIDDEN, sub_status::WRITE_FORBIDDEN) => FailureKind::WriteForbidden,
        (NOT_FOUND, sub_status::READ_SESSION_NOT_AVAILABLE) => FailureKind::ReadSessionNotAvailable,
        _ => return OutcomeClass::NotEligible,
    };
    OutcomeClass::Eligible(kind)
}

/// Classify a raw outcome.
pub fn classify(outcome: &RequestOutcome) -> OutcomeClass {
    match *outcome {
        RequestOutcome::Success => OutcomeClass::Success,
        RequestOutcome::Failure {
            status_code,
            sub_status_code,
        } => classify_failure(status_code, sub_status_code),
        RequestOutcome::Cancelled(CancelReason::EndToEndTimeout) => OutcomeClass::ClientTimeout,
        RequestOutcome::Cancelled(CancelReason::Caller) => OutcomeClass::ClientCancelled,
    }
}

/// Whether a transport status code is a success.
pub fn is_success_status(status_code: u16) -> bool {
    (200..300).contains(&status_code) || status_code == status::NOT_MODIFIED
}
