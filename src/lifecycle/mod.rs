//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Open cache → Build clients → Load contracts → Wire executor
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain in-flight requests → Save cache → Exit
//! ```

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{open_store, AppContext, Services, StartupError};
