//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or ClientConfig built in code
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → handed to AvailabilityEngine at construction
//!
//! On reconfiguration:
//!     AvailabilityEngine::reconfigure(new ClientConfig)
//!     → validation.rs validates
//!     → atomic swap of the resolved snapshot
//!     → failover records cleared
//! ```
//!
//! # Design Decisions
//! - Config is immutable once accepted; no process-wide toggles
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ClientConfig;
pub use schema::CircuitBreakerConfig;
pub use schema::FailoverConfig;
pub use schema::ObservabilityConfig;
pub use schema::RegionConfig;
pub use schema::TimeoutConfig;
pub use validation::{validate_config, ValidationError};
