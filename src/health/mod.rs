//! Location health subsystem.
//!
//! # Data Flow
//! ```text
//! Request outcome observed (per partition, region, kind)
//!     → store.rs (get-or-create the LocationHealthContext)
//!     → resilience::circuit_breaker applies the transition under the context lock
//!
//! Recovery (recovery.rs):
//!     On access, or periodic sweep
//!     → Unavailable past cooldown → HealthyTentative
//!
//! State machine (state.rs), per operation kind:
//!     Healthy → HealthyWithFailures → Unavailable → HealthyTentative → Healthy
//!                                          ▲               │
//!                                          └── probe fails ┘
//! ```
//!
//! # Design Decisions
//! - One flat concurrent map keyed by (partition, region)
//! - One lock per context; the map's shard lock is never held while updating
//! - Recovery is a pure function of elapsed time, evaluated lazily

pub mod recovery;
pub mod state;
pub mod store;

pub use recovery::{RecoveryProber, RecoverySettings, RecoverySweeper};
pub use state::{HealthStatus, KindHealth, LocationHealthContext, ProbeOutcome};
pub use store::HealthRecordStore;
