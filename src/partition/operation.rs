//! Operation types and the read/write split used by the breaker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Breaker bookkeeping is kept per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Read,
    Write,
}

impl OperationKind {
    /// Snake-case label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Read => "read",
            OperationKind::Write => "write",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data-plane operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Read,
    Query,
    ReadFeed,
    /// Distributed query planning. Always served by the first preferred region.
    QueryPlan,
    Create,
    Upsert,
    Replace,
    Delete,
    Patch,
    Batch,
}

impl OperationType {
    /// The breaker kind this operation is accounted under.
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationType::Read
            | OperationType::Query
            | OperationType::ReadFeed
            | OperationType::QueryPlan => OperationKind::Read,
            OperationType::Create
            | OperationType::Upsert
            | OperationType::Replace
            | OperationType::Delete
            | OperationType::Patch
            | OperationType::Batch => OperationKind::Write,
        }
    }

    /// Operations that must contact the first preferred region first,
    /// whatever its health.
    pub fn is_pinned_to_primary(&self) -> bool {
        matches!(self, OperationType::QueryPlan)
    }

    /// Snake-case label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Read => "read",
            OperationType::Query => "query",
            OperationType::ReadFeed => "read_feed",
            OperationType::QueryPlan => "query_plan",
            OperationType::Create => "create",
            OperationType::Upsert => "upsert",
            OperationType::Replace => "replace",
            OperationType::Delete => "delete",
            OperationType::Patch => "patch",
            OperationType::Batch => "batch",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
