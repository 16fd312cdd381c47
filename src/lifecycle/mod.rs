//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Host triggers → broadcast → background tasks (recovery sweeper) exit their loops
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
