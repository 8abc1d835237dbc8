//! Custodial wallet management.
//!
//! # Security Constraints
//! - Access keys are never logged (`WalletIdentity` redacts them in `Debug`)
//! - PINs never leave the process; only their SHA-512 digest is sent
//! - The funder's encryption context comes only from the environment

pub mod funding;
pub mod pin;
pub mod resolver;
pub mod types;

pub use funding::{WalletFunder, FUNDER_ENCRYPTION_CONTEXT_ENV_VAR};
pub use pin::derive_encryption_context;
pub use resolver::{WalletError, WalletResolver, WALLET_NAMESPACE};
pub use types::WalletIdentity;
