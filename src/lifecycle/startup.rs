//! Startup orchestration.
//!
//! # Responsibilities
//! - Open the keyed cache (loading the persistence file when configured)
//! - Build chain clients, the signer client and the identity verifier
//! - Load configured contracts into the registry
//! - Wire the wallet resolver, funder, builder, broadcaster and executor
//!
//! Any error here is fatal; the listener is bound only after the context
//! is fully assembled.

use alloy::primitives::U256;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::actions::CompileOptions;
use crate::cache::{CacheError, KeyedCache, KvStore};
use crate::chain::{ChainClient, ChainError, ChainRegistry};
use crate::config::{AppConfig, CacheConfig};
use crate::identity::{IdentityError, IdentityVerifier, RemoteIdentityVerifier};
use crate::pipeline::{ActionExecutor, Broadcaster, TransactionBuilder};
use crate::registry::{ContractRegistry, RegistryError};
use crate::signer::{CustodialSigner, SignerClient, SignerError};
use crate::wallet::{WalletFunder, WalletResolver, FUNDER_ENCRYPTION_CONTEXT_ENV_VAR, WALLET_NAMESPACE};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cache: {0}")]
    Cache(#[from] CacheError),

    #[error("chain: {0}")]
    Chain(#[from] ChainError),

    #[error("signer: {0}")]
    Signer(#[from] SignerError),

    #[error("identity: {0}")]
    Identity(#[from] IdentityError),

    #[error("registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("funding: {0}")]
    Funding(String),
}

/// The remote collaborators of the pipeline.
pub struct Services {
    pub chains: ChainRegistry,
    pub signer: Arc<dyn CustodialSigner>,
    pub identity: Arc<dyn IdentityVerifier>,
}

/// Everything the HTTP layer needs, shared behind an `Arc`.
pub struct AppContext {
    pub config: AppConfig,
    pub store: KvStore,
    pub chains: Arc<ChainRegistry>,
    pub contracts: Arc<ContractRegistry>,
    pub wallets: Arc<WalletResolver>,
    pub executor: Arc<ActionExecutor>,
}

impl AppContext {
    /// Build the production context: real chain clients, signer and identity service.
    ///
    /// Secrets are read from the environment.
    pub async fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        let store = open_store(&config.cache)?;

        let mut chains = ChainRegistry::new();
        for chain in &config.chains {
            let client = ChainClient::new(chain.clone())?;
            match client.verify_chain_id().await {
                Ok(()) => {}
                Err(e @ ChainError::InvalidConfig(_)) => return Err(e.into()),
                Err(e) => tracing::warn!(
                    chain_id = chain.chain_id,
                    error = %e,
                    "Could not verify chain id, continuing"
                ),
            }
            chains.insert(Arc::new(client));
        }

        let services = Services {
            chains,
            signer: Arc::new(SignerClient::from_env(&config.signer)?),
            identity: Arc::new(RemoteIdentityVerifier::from_env(&config.identity)?),
        };

        let funder_context = std::env::var(FUNDER_ENCRYPTION_CONTEXT_ENV_VAR).ok();
        Self::assemble(config, store, services, funder_context)
    }

    /// Wire the pipeline around the given collaborators.
    pub fn assemble(
        config: AppConfig,
        store: KvStore,
        services: Services,
        funder_encryption_context: Option<String>,
    ) -> Result<Self, StartupError> {
        let chains = Arc::new(services.chains);

        let contracts = Arc::new(ContractRegistry::new(
            store.clone(),
            CompileOptions {
                allow_transaction_value: config.pipeline.allow_transaction_value,
            },
        ));
        let loaded = contracts.load_from_config(&config.contracts)?;

        let builder = Arc::new(TransactionBuilder::new(
            Arc::clone(&chains),
            config.pipeline.default_gas_limit,
        ));
        let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&chains)));

        let mut resolver = WalletResolver::new(store.clone(), Arc::clone(&services.signer));
        if config.funding.enabled {
            match funder_encryption_context.filter(|c| !c.is_empty()) {
                Some(encryption_context) => {
                    let amount = U256::from_str(config.funding.amount_wei.trim()).map_err(|e| {
                        StartupError::Funding(format!(
                            "invalid amount '{}': {e}",
                            config.funding.amount_wei
                        ))
                    })?;
                    let funder = WalletFunder::new(
                        KeyedCache::new(store.clone(), WALLET_NAMESPACE),
                        config.funding.funder_public_address.clone(),
                        encryption_context,
                        amount,
                        config.funding.chain_ids.clone(),
                        Arc::clone(&builder),
                        Arc::clone(&services.signer),
                        Arc::clone(&broadcaster),
                    );
                    resolver = resolver.with_funder(Arc::new(funder));
                }
                None => tracing::warn!(
                    env = FUNDER_ENCRYPTION_CONTEXT_ENV_VAR,
                    "Funding enabled but funder encryption context is not set, funding disabled"
                ),
            }
        }
        let wallets = Arc::new(resolver);

        let executor = Arc::new(
            ActionExecutor::new(
                Arc::clone(&contracts),
                services.identity,
                Arc::clone(&wallets),
                builder,
                services.signer,
                broadcaster,
            )
            .with_serialized_submissions(config.pipeline.serialize_wallet_submissions),
        );

        tracing::info!(
            chains = ?chains.chain_ids(),
            contracts = loaded,
            cached_wallets = wallets.cached_count(),
            "Application context ready"
        );

        Ok(Self {
            config,
            store,
            chains,
            contracts,
            wallets,
            executor,
        })
    }

    /// Flush the cache to its persistence file, if any.
    pub fn save_cache(&self) {
        match self.store.save_to_file() {
            Ok(()) => tracing::info!(entries = self.store.len(), "Cache saved"),
            Err(e) => tracing::error!(error = %e, "Failed to save cache"),
        }
    }
}

/// Open the keyed cache described by `config`.
pub fn open_store(config: &CacheConfig) -> Result<KvStore, StartupError> {
    match config.persistence_path.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(path) => Ok(KvStore::load_from_file(PathBuf::from(path))?),
        None => Ok(KvStore::new(None)),
    }
}
