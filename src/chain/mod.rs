//! Chain node integration.
//!
//! # Data Flow
//! ```text
//! ChainConfig (per chain id)
//!     → client.rs (alloy HTTP providers, failover, timeouts)
//!     → registry.rs (chain id → Arc<dyn ChainNode>)
//!     → pipeline (nonce, fees, gas, broadcast, receipts)
//! ```
//!
//! # Constraints
//! - All RPC calls have configurable timeouts
//! - A node-level rejection is never retried on another provider

pub mod client;
pub mod registry;
pub mod types;

pub use client::ChainClient;
pub use registry::ChainRegistry;
pub use types::{ChainError, ChainNode, ChainResult, FeeData, InclusionReceipt};
