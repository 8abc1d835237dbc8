//! Raw transaction broadcast and inclusion tracking.
//!
//! Broadcast and confirmation are separate steps so callers can release
//! per-wallet state as soon as the node accepted the transaction.

use alloy::primitives::{keccak256, TxHash};
use std::sync::Arc;

use crate::chain::{ChainError, ChainRegistry};
use crate::pipeline::error::ActionError;

/// A mined, successful transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Sends signed transactions and waits for their inclusion.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    /// Nodes keyed by chain id.
    chains: Arc<ChainRegistry>,
}

impl Broadcaster {
    /// Create a new broadcaster over `chains`.
    pub fn new(chains: Arc<ChainRegistry>) -> Self {
        Self { chains }
    }

    /// `eth_sendRawTransaction`. Malformed hex is a signing failure.
    ///
    /// A node rejection is a transaction failure with no hash. A timeout or
    /// transport failure leaves the outcome unknown, so it is a network
    /// failure carrying the locally computed hash.
    pub async fn broadcast(&self, signed_raw_tx: &str, chain_id: u64) -> Result<TxHash, ActionError> {
        let trimmed = signed_raw_tx.trim();
        let raw = hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
            .map_err(|e| ActionError::signing(format!("Signing error: malformed signed transaction: {e}")))?;
        if raw.is_empty() {
            return Err(ActionError::signing("Signing error: empty signed transaction"));
        }

        let node = self
            .chains
            .get(chain_id)
            .map_err(|e| ActionError::from_chain(chain_id, e))?;

        let hash = node.send_raw_transaction(&raw).await.map_err(|e| {
            tracing::warn!(chain_id, error = %e, "Broadcast failed");
            match e {
                ChainError::Timeout(_) | ChainError::Rpc(_) => {
                    ActionError::broadcast_unknown(chain_id, e, keccak256(&raw))
                }
                e => ActionError::transaction(e.to_string(), None),
            }
        })?;

        tracing::info!(chain_id, tx_hash = %hash, "Transaction broadcast");
        Ok(hash)
    }

    /// Wait for inclusion of `hash`. Every failure carries the hash.
    pub async fn confirm(&self, hash: TxHash, chain_id: u64) -> Result<Submission, ActionError> {
        let node = self
            .chains
            .get(chain_id)
            .map_err(|e| ActionError::transaction(e.to_string(), Some(hash)))?;

        match node.wait_for_inclusion(hash).await {
            Ok(receipt) if receipt.success => {
                tracing::info!(
                    chain_id,
                    tx_hash = %hash,
                    block_number = ?receipt.block_number,
                    "Transaction confirmed"
                );
                Ok(Submission {
                    transaction_hash: hash,
                    block_number: receipt.block_number,
                })
            }
            Ok(receipt) => {
                tracing::warn!(chain_id, tx_hash = %hash, "Transaction reverted");
                Err(ActionError::Transaction {
                    message: format!("Transaction {hash} reverted"),
                    transaction_hash: Some(hash),
                    block_number: receipt.block_number,
                })
            }
            Err(e @ ChainError::ConfirmationTimeout { .. }) => {
                tracing::warn!(chain_id, tx_hash = %hash, "Confirmation timed out");
                Err(ActionError::transaction(e.to_string(), Some(hash)))
            }
            Err(e) => Err(ActionError::transaction(e.to_string(), Some(hash))),
        }
    }

    /// Broadcast then confirm.
    pub async fn submit(&self, signed_raw_tx: &str, chain_id: u64) -> Result<Submission, ActionError> {
        let hash = self.broadcast(signed_raw_tx, chain_id).await?;
        self.confirm(hash, chain_id).await
    }
}
