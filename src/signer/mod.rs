//! Custodial signing service integration.
//!
//! # Data Flow
//! ```text
//! Wallet Resolver ──GET /wallet_groups, POST /wallet──▶ SignerClient
//! Pipeline ──POST /wallet/sign_transaction──▶ SignerClient ──▶ raw tx hex
//! ```

pub mod client;
pub mod types;

pub use client::{SignerClient, SIGNER_SECRET_ENV_VAR};
pub use types::{CustodialSigner, SignerError, SignerResult, WalletGroup};
