//! JSON-RPC chain client with failover and timeouts.
//!
//! # Responsibilities
//! - Connect to the primary and failover RPC endpoints of one chain
//! - Bound every call with the configured timeout
//! - Stop at the first node-level rejection; try the next provider otherwise
//! - Poll receipts until inclusion

use alloy::primitives::{keccak256, Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::{TransportError, TransportResult};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::chain::types::{
    ChainConfig, ChainError, ChainNode, ChainResult, FeeData, InclusionReceipt,
};

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Chain RPC client over one or more alloy HTTP providers.
#[derive(Clone)]
pub struct ChainClient {
    /// Primary first, then failovers.
    providers: Vec<DynProvider>,
    /// Configuration.
    config: ChainConfig,
    /// Per-call timeout duration.
    timeout_duration: Duration,
}

impl ChainClient {
    /// Build the client. Invalid failover URLs are skipped.
    ///
    /// # Arguments
    /// * `config` - Chain id, RPC endpoints and timeouts
    ///
    /// # Returns
    /// The client, or `InvalidConfig` when the primary URL does not parse
    pub fn new(config: ChainConfig) -> ChainResult<Self> {
        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            ChainError::InvalidConfig(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let mut providers: Vec<DynProvider> =
            vec![Arc::new(ProviderBuilder::new().connect_http(primary_url))];

        for url_str in &config.failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => providers.push(Arc::new(ProviderBuilder::new().connect_http(url))),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        tracing::info!(
            chain_id = config.chain_id,
            rpc_url = %config.rpc_url,
            failovers = providers.len() - 1,
            "Chain client initialized"
        );

        Ok(Self {
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            providers,
            config,
        })
    }

    /// Warn when the node reports a different chain id than configured.
    pub async fn verify_chain_id(&self) -> ChainResult<()> {
        let actual = self.call("eth_chainId", |p| async move { p.get_chain_id().await }).await?;
        if actual != self.config.chain_id {
            return Err(ChainError::InvalidConfig(format!(
                "chain id mismatch: expected {}, got {}",
                self.config.chain_id, actual
            )));
        }
        Ok(())
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Run `op` against each provider in turn.
    ///
    /// A JSON-RPC error response is final. Transport errors and timeouts
    /// move on to the next provider.
    async fn call<T, F, Fut>(&self, method: &'static str, op: F) -> ChainResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let mut all_timed_out = true;

        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, op(Arc::clone(provider))).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    if let Some(resp) = e.as_error_resp() {
                        tracing::debug!(
                            chain_id = self.config.chain_id,
                            method,
                            code = resp.code,
                            message = %resp.message,
                            "Node rejected request"
                        );
                        return Err(ChainError::Rejected(resp.message.to_string()));
                    }
                    all_timed_out = false;
                    tracing::warn!(
                        chain_id = self.config.chain_id,
                        provider_idx = i,
                        method,
                        error = %e,
                        "RPC error, trying next provider"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        chain_id = self.config.chain_id,
                        provider_idx = i,
                        method,
                        "RPC timeout, trying next provider"
                    );
                }
            }
        }

        if all_timed_out {
            Err(ChainError::Timeout(self.config.rpc_timeout_secs))
        } else {
            Err(ChainError::Rpc(format!("All RPC providers failed for {method}")))
        }
    }
}

#[async_trait]
impl ChainNode for ChainClient {
    fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    async fn transaction_count(&self, address: Address) -> ChainResult<u64> {
        self.call("eth_getTransactionCount", move |p| async move {
            p.get_transaction_count(address).pending().await
        })
        .await
    }

    async fn fee_data(&self) -> ChainResult<FeeData> {
        let estimate = self
            .call("eth_feeHistory", |p| async move { p.estimate_eip1559_fees().await })
            .await?;
        Ok(FeeData {
            max_fee_per_gas: estimate.max_fee_per_gas,
            max_priority_fee_per_gas: estimate.max_priority_fee_per_gas,
        })
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> ChainResult<u64> {
        self.call("eth_estimateGas", |p| {
            let request = request.clone();
            async move { p.estimate_gas(request).await }
        })
        .await
    }

    /// A provider reached after a timed-out attempt may already hold the
    /// transaction; its "already known" answer counts as acceptance.
    async fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<TxHash> {
        let hash = keccak256(raw);
        let raw = raw.to_vec();
        let result = self
            .call("eth_sendRawTransaction", |p| {
                let raw = raw.clone();
                async move {
                    let pending = p.send_raw_transaction(&raw).await?;
                    Ok::<_, TransportError>(*pending.tx_hash())
                }
            })
            .await;

        match result {
            Err(ChainError::Rejected(message)) if is_already_known(&message) => {
                tracing::info!(
                    chain_id = self.config.chain_id,
                    tx_hash = %hash,
                    "Node already holds transaction"
                );
                Ok(hash)
            }
            other => other,
        }
    }

    async fn wait_for_inclusion(&self, hash: TxHash) -> ChainResult<InclusionReceipt> {
        let timeout_secs = self.config.confirmation_timeout_secs;
        let poll_interval = Duration::from_secs(self.config.confirmation_poll_secs.max(1));

        let result = timeout(Duration::from_secs(timeout_secs), async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self
                    .call("eth_getTransactionReceipt", move |p| async move {
                        p.get_transaction_receipt(hash).await
                    })
                    .await
                {
                    Ok(Some(r)) => r,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %hash, "Transaction pending");
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(tx_hash = %hash, error = %e, "Receipt poll failed");
                        continue;
                    }
                };

                return InclusionReceipt {
                    transaction_hash: hash,
                    block_number: receipt.block_number,
                    success: receipt.status(),
                };
            }
        })
        .await;

        result.map_err(|_| ChainError::ConfirmationTimeout {
            hash,
            secs: timeout_secs,
        })
    }
}

/// Whether a node rejection means the transaction is already in its pool.
fn is_already_known(message: &str) -> bool {
    let message = message.to_lowercase();
    ["already known", "known transaction", "alreadyknown", "already imported"]
        .iter()
        .any(|needle| message.contains(needle))
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("chain_id", &self.config.chain_id)
            .field("rpc_url", &self.config.rpc_url)
            .field("providers", &self.providers.len())
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ChainConfig {
        ChainConfig {
            chain_id: 31337,
            rpc_url: "http://127.0.0.1:1".to_string(),
            rpc_timeout_secs: 2,
            ..ChainConfig::default()
        }
    }

    #[test]
    fn test_invalid_primary_url() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        assert!(matches!(
            ChainClient::new(config),
            Err(ChainError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_failover_skipped() {
        let mut config = test_config();
        config.failover_urls = vec!["::bad::".to_string(), "http://127.0.0.1:2".to_string()];
        let client = ChainClient::new(config).unwrap();
        assert_eq!(client.providers.len(), 2);
        assert_eq!(client.chain_id(), 31337);
    }

    #[test]
    fn test_already_known_answers() {
        assert!(is_already_known("already known"));
        assert!(is_already_known("known transaction: 0xabc"));
        assert!(is_already_known("AlreadyKnown"));
        assert!(is_already_known("Transaction with the same hash was already imported."));
        assert!(!is_already_known("nonce too low"));
        assert!(!is_already_known("replacement transaction underpriced"));
    }

    #[tokio::test]
    async fn test_unreachable_providers_fail() {
        let mut config = test_config();
        config.failover_urls = vec!["http://127.0.0.1:2".to_string()];
        let client = ChainClient::new(config).unwrap();

        let result = client.transaction_count(Address::ZERO).await;
        assert!(matches!(
            result,
            Err(ChainError::Rpc(_)) | Err(ChainError::Timeout(_))
        ));
    }
}
