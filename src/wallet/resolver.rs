//! Get-or-create resolution of custodial wallets.
//!
//! # Data Flow
//! ```text
//! public address
//!     → cache hit?            → WalletIdentity (no network)
//!     → no encryption context → NotFound (caller prompts for a PIN)
//!     → per-address lock, re-check cache
//!     → GET /wallet_groups → POST /wallet → cache → optional funding
//! ```

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::cache::{CacheError, KeyedCache, KvStore};
use crate::observability::metrics;
use crate::signer::types::{CustodialSigner, SignerError};
use crate::wallet::funding::WalletFunder;
use crate::wallet::types::WalletIdentity;

/// Cache namespace for wallets, keyed by lowercased public address.
pub const WALLET_NAMESPACE: &str = "wallet";

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Wallet not found and missing encryption context")]
    NotFound,

    #[error("no wallet groups available on the signing service")]
    NoWalletGroups,

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Maps public addresses to custodial wallets, creating them on first use.
pub struct WalletResolver {
    /// Wallets keyed by lowercased public address.
    wallets: KeyedCache<WalletIdentity>,
    /// Signing service that owns the keys.
    signer: Arc<dyn CustodialSigner>,
    /// Seeds new wallets with gas money, when enabled.
    funder: Option<Arc<WalletFunder>>,
    /// Single-flight creation locks, one per address ever resolved.
    creation_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl WalletResolver {
    /// Create a new resolver.
    ///
    /// # Arguments
    /// * `store` - Shared cache the wallet namespace lives in
    /// * `signer` - Signing service used to create wallets
    pub fn new(store: KvStore, signer: Arc<dyn CustodialSigner>) -> Self {
        Self {
            wallets: KeyedCache::new(store, WALLET_NAMESPACE),
            signer,
            funder: None,
            creation_locks: DashMap::new(),
        }
    }

    /// Seed every newly created wallet through `funder`.
    pub fn with_funder(mut self, funder: Arc<WalletFunder>) -> Self {
        self.funder = Some(funder);
        self
    }

    pub fn cache_key(public_address: &str) -> String {
        public_address.trim().to_lowercase()
    }

    /// Cached wallet for `public_address`, without touching the network.
    pub fn cached(&self, public_address: &str) -> Result<Option<WalletIdentity>, WalletError> {
        Ok(self.wallets.get(&Self::cache_key(public_address))?)
    }

    pub fn cached_count(&self) -> usize {
        self.wallets.len()
    }

    /// Return the wallet for `public_address`, creating it when absent.
    ///
    /// Creation requires `encryption_context`. Concurrent first-time calls for
    /// the same address issue a single creation request.
    pub async fn resolve(
        &self,
        public_address: &str,
        encryption_context: Option<&str>,
    ) -> Result<WalletIdentity, WalletError> {
        let key = Self::cache_key(public_address);

        if let Some(wallet) = self.wallets.get(&key)? {
            metrics::record_wallet_resolution("hit");
            return Ok(wallet);
        }

        let Some(encryption_context) = encryption_context.filter(|c| !c.is_empty()) else {
            metrics::record_wallet_resolution("not_found");
            return Err(WalletError::NotFound);
        };

        let lock = self
            .creation_locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // another task may have created it while we waited
        if let Some(wallet) = self.wallets.get(&key)? {
            metrics::record_wallet_resolution("hit");
            return Ok(wallet);
        }

        let wallet = match self.create(encryption_context).await {
            Ok(wallet) => wallet,
            Err(e) => {
                metrics::record_wallet_resolution("failed");
                tracing::warn!(public_address = %key, error = %e, "Wallet creation failed");
                return Err(e);
            }
        };
        self.remember(&key, &wallet).await?;
        metrics::record_wallet_resolution("created");

        tracing::info!(
            public_address = %key,
            wallet = %wallet.wallet_address,
            "Wallet resolved by creation"
        );

        if let Some(funder) = &self.funder {
            funder.spawn_fund(wallet.wallet_address);
        }

        Ok(wallet)
    }

    /// Cache `wallet` off the runtime threads; the store rewrites its file on every write.
    async fn remember(&self, key: &str, wallet: &WalletIdentity) -> Result<(), WalletError> {
        let wallets = self.wallets.clone();
        let (key, wallet) = (key.to_string(), wallet.clone());
        tokio::task::spawn_blocking(move || wallets.set(&key, &wallet))
            .await
            .map_err(|e| CacheError::Io(std::io::Error::other(e)))??;
        Ok(())
    }

    async fn create(&self, encryption_context: &str) -> Result<WalletIdentity, WalletError> {
        let groups = self.signer.list_wallet_groups().await?;
        // the first group is used when the tenant has several
        let group = groups.first().ok_or(WalletError::NoWalletGroups)?;
        Ok(self.signer.create_wallet(&group.uuid, encryption_context).await?)
    }
}

impl std::fmt::Debug for WalletResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletResolver")
            .field("cached", &self.wallets.len())
            .field("funding", &self.funder.is_some())
            .finish()
    }
}
