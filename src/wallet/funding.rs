//! Seeding of new wallets with native currency on test networks.
//!
//! Funding is best effort: it runs detached from resolution, each chain is
//! attempted independently and failures are only logged.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use std::sync::Arc;

use crate::cache::KeyedCache;
use crate::pipeline::broadcaster::Broadcaster;
use crate::pipeline::builder::{CallRequest, TransactionBuilder};
use crate::pipeline::error::ActionError;
use crate::signer::types::CustodialSigner;
use crate::wallet::resolver::WalletResolver;
use crate::wallet::types::WalletIdentity;

/// Environment variable holding the funder wallet's encryption context.
pub const FUNDER_ENCRYPTION_CONTEXT_ENV_VAR: &str = "CHAIN_ACTIONS_FUNDER_ENCRYPTION_CONTEXT";

pub struct WalletFunder {
    wallets: KeyedCache<WalletIdentity>,
    funder_public_address: String,
    encryption_context: String,
    amount: U256,
    chain_ids: Vec<u64>,
    builder: Arc<TransactionBuilder>,
    signer: Arc<dyn CustodialSigner>,
    broadcaster: Arc<Broadcaster>,
}

impl WalletFunder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        wallets: KeyedCache<WalletIdentity>,
        funder_public_address: impl Into<String>,
        encryption_context: impl Into<String>,
        amount: U256,
        chain_ids: Vec<u64>,
        builder: Arc<TransactionBuilder>,
        signer: Arc<dyn CustodialSigner>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            wallets,
            funder_public_address: WalletResolver::cache_key(&funder_public_address.into()),
            encryption_context: encryption_context.into(),
            amount,
            chain_ids,
            builder,
            signer,
            broadcaster,
        }
    }

    /// Fund `recipient` in the background.
    pub fn spawn_fund(self: &Arc<Self>, recipient: Address) -> tokio::task::JoinHandle<()> {
        let funder = Arc::clone(self);
        tokio::spawn(async move {
            funder.fund(recipient).await;
        })
    }

    /// Fund `recipient` on every configured chain, one after another.
    ///
    /// Returns the per-chain outcome; never fails as a whole.
    pub async fn fund(&self, recipient: Address) -> Vec<(u64, Result<TxHash, ActionError>)> {
        let funder = match self.wallets.get(&self.funder_public_address) {
            Ok(Some(wallet)) => wallet,
            Ok(None) => {
                tracing::warn!(
                    funder = %self.funder_public_address,
                    "Funder wallet not cached, skipping funding"
                );
                return Vec::new();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read funder wallet");
                return Vec::new();
            }
        };

        let mut outcomes = Vec::with_capacity(self.chain_ids.len());
        for &chain_id in &self.chain_ids {
            let outcome = self.fund_on_chain(&funder, recipient, chain_id).await;
            match &outcome {
                Ok(hash) => tracing::info!(
                    chain_id,
                    wallet = %recipient,
                    tx_hash = %hash,
                    "Wallet funded"
                ),
                Err(e) => tracing::warn!(
                    chain_id,
                    wallet = %recipient,
                    error = %e,
                    "Wallet funding failed"
                ),
            }
            outcomes.push((chain_id, outcome));
        }
        outcomes
    }

    async fn fund_on_chain(
        &self,
        funder: &WalletIdentity,
        recipient: Address,
        chain_id: u64,
    ) -> Result<TxHash, ActionError> {
        let payload = self
            .builder
            .build_payload(CallRequest {
                from: funder.wallet_address,
                to: recipient,
                chain_id,
                data: Bytes::new(),
                value: self.amount,
            })
            .await?;
        let raw = self
            .signer
            .sign_transaction(&payload, funder, &self.encryption_context)
            .await?;
        let submission = self.broadcaster.submit(&raw, chain_id).await?;
        Ok(submission.transaction_hash)
    }
}

impl std::fmt::Debug for WalletFunder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletFunder")
            .field("funder", &self.funder_public_address)
            .field("amount", &self.amount)
            .field("chain_ids", &self.chain_ids)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::KvStore;
    use crate::chain::ChainRegistry;
    use crate::pipeline::DEFAULT_GAS_LIMIT;
    use crate::test_support::{FakeChain, FakeSigner};
    use crate::wallet::resolver::WALLET_NAMESPACE;

    const FUNDER: &str = "0xF00D000000000000000000000000000000000001";

    fn funder(store: &KvStore, chains: &[Arc<FakeChain>], signer: Arc<FakeSigner>) -> WalletFunder {
        let mut registry = ChainRegistry::new();
        for chain in chains {
            registry.insert(chain.clone());
        }
        let registry = Arc::new(registry);
        WalletFunder::new(
            KeyedCache::new(store.clone(), WALLET_NAMESPACE),
            FUNDER,
            "funder-ctx",
            U256::from(10_000_000_000u64),
            vec![11155111, 80002],
            Arc::new(TransactionBuilder::new(registry.clone(), DEFAULT_GAS_LIMIT)),
            signer,
            Arc::new(Broadcaster::new(registry)),
        )
    }

    #[tokio::test]
    async fn test_funds_each_chain_independently() {
        let store = KvStore::default();
        let signer = Arc::new(FakeSigner::default());
        let resolver = WalletResolver::new(store.clone(), signer.clone());
        resolver.resolve(FUNDER, Some("funder-ctx")).await.unwrap();

        // only sepolia is reachable
        let sepolia = Arc::new(FakeChain::new(11155111));
        let funder = funder(&store, &[sepolia.clone()], signer.clone());

        let recipient = Address::with_last_byte(0x77);
        let outcomes = funder.fund(recipient).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].1.is_ok());
        assert!(outcomes[1].1.is_err());

        let payload = &signer.signed_payloads()[0];
        assert_eq!(payload.to, recipient);
        assert_eq!(payload.value, "0x2540be400");
        assert!(payload.data.is_empty());
        assert_eq!(sepolia.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_funder_wallet_skips() {
        let store = KvStore::default();
        let signer = Arc::new(FakeSigner::default());
        let chain = Arc::new(FakeChain::new(11155111));
        let funder = funder(&store, &[chain.clone()], signer.clone());

        assert!(funder.fund(Address::with_last_byte(1)).await.is_empty());
        assert_eq!(chain.sent_count(), 0);
    }
}
