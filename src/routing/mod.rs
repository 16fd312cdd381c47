//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! ClientConfig
//!     → topology.rs (account regions, preferred order → RegionEndpoints)
//!
//! Request (partition, operation type):
//!     → PPAF override reorders the preferred list (resilience::failover)
//!     → selector.rs filters by breaker state:
//!         - healthy regions in preference order
//!         - at most one tentative region as a probe, after the healthy ones
//!         - never an empty route (fail open)
//!     → ordered list of regions to attempt
//! ```
//!
//! # Design Decisions
//! - Selection is read-mostly; only lazy recovery writes to the store
//! - Pinned operations (query plan) always lead with the first preferred region
//! - Unseen (partition, region) pairs are healthy and are not materialized

pub mod selector;
pub mod topology;

pub use selector::RegionSelector;
pub use topology::RegionTopology;
