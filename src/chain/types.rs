//! Chain node abstraction and error definitions.

use alloy::primitives::{Address, TxHash};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use thiserror::Error;

pub use crate::config::schema::ChainConfig;

/// Errors that can occur while talking to a chain node.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Every provider failed with a transport error.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Every provider timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The node answered with a JSON-RPC error (revert reason, bad nonce, underpriced, ...).
    #[error("{0}")]
    Rejected(String),

    /// Inclusion was not observed in time.
    #[error("Transaction {hash} not confirmed after {secs} seconds")]
    ConfirmationTimeout { hash: TxHash, secs: u64 },

    /// No node is configured for the chain.
    #[error("unsupported chain {0}")]
    UnsupportedChain(u64),

    #[error("invalid chain configuration: {0}")]
    InvalidConfig(String),
}

pub type ChainResult<T> = Result<T, ChainError>;

/// EIP-1559 fee estimate, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeData {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub success: bool,
}

/// The JSON-RPC surface the pipeline needs from a chain.
#[async_trait]
pub trait ChainNode: Send + Sync {
    fn chain_id(&self) -> u64;

    /// Pending nonce of `address`.
    async fn transaction_count(&self, address: Address) -> ChainResult<u64>;

    async fn fee_data(&self) -> ChainResult<FeeData>;

    async fn estimate_gas(&self, request: TransactionRequest) -> ChainResult<u64>;

    /// `eth_sendRawTransaction`; returns the hash the node accepted.
    async fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<TxHash>;

    /// Poll until the transaction is mined or the confirmation timeout elapses.
    async fn wait_for_inclusion(&self, hash: TxHash) -> ChainResult<InclusionReceipt>;
}
