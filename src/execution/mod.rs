//! Request execution subsystem.
//!
//! # Data Flow
//! ```text
//! OperationRequest
//!     → AvailabilityEngine::select_route (ordered regions)
//!     → executor.rs: for each region
//!         → transport.rs (Transport::send, bounded by the end-to-end deadline)
//!         → AvailabilityEngine::record_outcome
//!         → diagnostics.rs (contacted regions, attempts)
//!         → success: return | eligible failure: next region | otherwise: stop
//! ```
//!
//! # Design Decisions
//! - The executor owns the end-to-end deadline; the engine only observes outcomes
//! - Each region is attempted at most once per operation
//! - Terminal errors carry the last real service error, never a generic "circuit open"

pub mod diagnostics;
pub mod error;
pub mod executor;
pub mod transport;

pub use diagnostics::{AttemptRecord, FinalStatus, OperationDiagnostics};
pub use error::{ExecutionError, ServiceError};
pub use executor::{OperationRequest, OperationResponse, RequestExecutor};
pub use transport::{RegionRequest, Transport, TransportError, TransportResponse};
