//! Contract action execution service.
//!
//! Compiles contract ABIs into named actions and runs each invocation through
//! identity verification, custodial wallet resolution, transaction building,
//! remote signing, broadcast and confirmation, answering with a uniform
//! result envelope.

pub mod actions;
pub mod cache;
pub mod chain;
pub mod config;
pub mod http;
pub mod identity;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod registry;
pub mod signer;
pub mod wallet;

#[cfg(test)]
mod test_support;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{AppContext, Shutdown};
pub use pipeline::{ActionExecutor, ResultEnvelope};
