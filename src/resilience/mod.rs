//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Regional attempt completes:
//!     → classify.rs (outcome → eligible / not eligible / client timeout)
//!     → circuit_breaker.rs (per (partition, region, kind) state machine)
//!     → failover.rs (per-partition override, PPAF)
//! ```
//!
//! # Design Decisions
//! - Classification is a value, never an exception
//! - Breaker and failover are independent state machines
//! - Neither ever raises on its own account; the caller decides what to do

pub mod circuit_breaker;
pub mod classify;
pub mod failover;

pub use circuit_breaker::{CircuitBreakerPolicy, ProbeGuard, Transition};
pub use classify::{classify, is_success_status, CancelReason, FailureKind, OutcomeClass, RequestOutcome};
pub use failover::{FailoverEvent, FailoverOrchestrator, FailoverRecord, FailoverTrigger};
