//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breaker, recovery, failover and executor produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms via the metrics facade)
//!
//! Consumers:
//!     → Whatever subscriber / recorder the host application installs
//! ```
//!
//! # Design Decisions
//! - Library code only emits; installing a recorder is the host's job
//! - Metric updates are cheap and never fail
//! - Activity ID flows through every attempt of one operation

pub mod logging;
pub mod metrics;
