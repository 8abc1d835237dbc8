//! Signing service DTOs, errors and the signer abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::payload::UnsignedTxPayload;
use crate::wallet::types::WalletIdentity;

/// Every signing service response wraps its body in `data`.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletGroup {
    pub uuid: String,
}

#[derive(Debug, Serialize)]
pub struct CreateWalletRequest<'a> {
    pub wallet_group_id: &'a str,
    pub network: &'a str,
    pub encryption_context: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignTransactionRequest<'a> {
    pub payload: &'a UnsignedTxPayload,
    pub encryption_context: &'a str,
    pub access_key: &'a str,
    pub wallet_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SignedTransaction {
    pub signed_transaction: String,
}

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("signing service unreachable: {0}")]
    Transport(String),

    #[error("signing service timed out after {0} seconds")]
    Timeout(u64),

    #[error("signing service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed signing service response: {0}")]
    Decode(String),

    #[error("invalid signer configuration: {0}")]
    InvalidConfig(String),
}

pub type SignerResult<T> = Result<T, SignerError>;

/// The custodial signing service.
#[async_trait]
pub trait CustodialSigner: Send + Sync {
    async fn list_wallet_groups(&self) -> SignerResult<Vec<WalletGroup>>;

    async fn create_wallet(
        &self,
        wallet_group_id: &str,
        encryption_context: &str,
    ) -> SignerResult<WalletIdentity>;

    /// Sign `payload` with `wallet`; returns the raw signed transaction as hex.
    async fn sign_transaction(
        &self,
        payload: &UnsignedTxPayload,
        wallet: &WalletIdentity,
        encryption_context: &str,
    ) -> SignerResult<String>;
}
