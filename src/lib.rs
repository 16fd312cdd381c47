//! Partition-level circuit breaking and per-partition automatic failover
//! for a multi-region database client.

pub mod config;
pub mod engine;
pub mod execution;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod partition;
pub mod resilience;
pub mod routing;

pub use config::ClientConfig;
pub use engine::{AvailabilityEngine, OutcomeReport};
pub use execution::{ExecutionError, OperationRequest, OperationResponse, RequestExecutor, Transport};
pub use health::HealthStatus;
pub use lifecycle::Shutdown;
pub use partition::{OperationKind, OperationType, PartitionIdentity, RegionEndpoint};
pub use resilience::{OutcomeClass, RequestOutcome};
