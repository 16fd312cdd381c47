//! Partition and region identity.
//!
//! # Data Flow
//! ```text
//! Request (collection rid + partition key range id)
//!     → identity.rs (PartitionIdentity, RegionEndpoint, LocationKey)
//!     → operation.rs (OperationType → OperationKind)
//!     → health store / failover records keyed by these values
//! ```
//!
//! # Design Decisions
//! - Identities are plain value types (Clone + Eq + Hash), never handles
//! - A (partition, region) pair is one flat composite key, no nested maps
//! - Operation kind (read/write) is derived, never supplied separately

pub mod identity;
pub mod operation;

pub use identity::{LocationKey, PartitionIdentity, RegionEndpoint};
pub use operation::{OperationKind, OperationType};
