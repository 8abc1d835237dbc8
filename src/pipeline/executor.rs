//! The invocation boundary: identity → wallet → build → sign → broadcast → envelope.
//!
//! `invoke` never fails. Every outcome, including panics inside the
//! pipeline, is turned into a [`ResultEnvelope`].

use alloy::primitives::Address;
use dashmap::DashMap;
use futures_util::FutureExt;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::actions::Action;
use crate::identity::IdentityVerifier;
use crate::observability::metrics;
use crate::pipeline::broadcaster::{Broadcaster, Submission};
use crate::pipeline::builder::TransactionBuilder;
use crate::pipeline::envelope::ResultEnvelope;
use crate::pipeline::error::{ActionError, ErrorKind};
use crate::registry::ContractRegistry;
use crate::signer::types::CustodialSigner;
use crate::wallet::pin::derive_encryption_context;
use crate::wallet::resolver::WalletResolver;

/// Caller credentials for one invocation.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    pub identity_token: Option<String>,
    /// Required to create a wallet and to sign.
    pub encryption_context: Option<String>,
}

/// Body of an invocation request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationRequest {
    pub action_key: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(default)]
    pub identity_token: Option<String>,
    #[serde(default)]
    pub encryption_context: Option<String>,
    /// Raw PIN; used to derive the encryption context when none is given.
    #[serde(default)]
    pub pin: Option<String>,
}

impl InvocationRequest {
    pub fn context(&self) -> InvocationContext {
        InvocationContext {
            identity_token: self.identity_token.clone(),
            encryption_context: self
                .encryption_context
                .clone()
                .or_else(|| self.pin.as_deref().map(derive_encryption_context)),
        }
    }
}

/// Runs one invocation end to end and folds the outcome into an envelope.
pub struct ActionExecutor {
    registry: Arc<ContractRegistry>,
    identity: Arc<dyn IdentityVerifier>,
    wallets: Arc<WalletResolver>,
    builder: Arc<TransactionBuilder>,
    signer: Arc<dyn CustodialSigner>,
    broadcaster: Arc<Broadcaster>,
    /// Present when submissions are serialized per wallet.
    submission_locks: Option<DashMap<Address, Arc<Mutex<()>>>>,
}

impl ActionExecutor {
    pub fn new(
        registry: Arc<ContractRegistry>,
        identity: Arc<dyn IdentityVerifier>,
        wallets: Arc<WalletResolver>,
        builder: Arc<TransactionBuilder>,
        signer: Arc<dyn CustodialSigner>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            registry,
            identity,
            wallets,
            builder,
            signer,
            broadcaster,
            submission_locks: None,
        }
    }

    /// Hold a per-wallet lock from nonce fetch until broadcast.
    pub fn with_serialized_submissions(mut self, enabled: bool) -> Self {
        self.submission_locks = enabled.then(DashMap::new);
        self
    }

    pub fn registry(&self) -> &Arc<ContractRegistry> {
        &self.registry
    }

    pub fn wallets(&self) -> &Arc<WalletResolver> {
        &self.wallets
    }

    pub fn identity(&self) -> &Arc<dyn IdentityVerifier> {
        &self.identity
    }

    /// Look up `action_key` and invoke it.
    pub async fn invoke(
        &self,
        action_key: &str,
        ctx: &InvocationContext,
        args: &Map<String, Value>,
    ) -> ResultEnvelope {
        let started = Instant::now();
        match self.registry.resolve_action(action_key) {
            Ok(action) => self.invoke_action(&action, ctx, args).await,
            Err(err) => finish(action_key, started, Err(err)),
        }
    }

    pub async fn invoke_action(
        &self,
        action: &Action,
        ctx: &InvocationContext,
        args: &Map<String, Value>,
    ) -> ResultEnvelope {
        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.run(action, ctx, args))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(ActionError::Unexpected(format!("pipeline panicked: {detail}")))
            });
        finish(&action.key.to_string(), started, outcome)
    }

    async fn run(
        &self,
        action: &Action,
        ctx: &InvocationContext,
        args: &Map<String, Value>,
    ) -> Result<Submission, ActionError> {
        let token = ctx
            .identity_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ActionError::MissingIdentity)?;

        action
            .schema
            .validate(args)
            .map_err(ActionError::InvalidArguments)?;

        let public_address = self.identity.verify(token).await?;
        let wallet = self
            .wallets
            .resolve(&public_address, ctx.encryption_context.as_deref())
            .await?;
        let encryption_context = ctx
            .encryption_context
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(ActionError::MissingEncryptionContext)?;

        let chain_id = action.contract.chain_id;
        let guard = self.lock_wallet(wallet.wallet_address).await;

        let payload = self.builder.build(action, args, &wallet, chain_id).await?;
        let signed = self
            .signer
            .sign_transaction(&payload, &wallet, encryption_context)
            .await?;
        let hash = self.broadcaster.broadcast(&signed, chain_id).await?;
        drop(guard);

        self.broadcaster.confirm(hash, chain_id).await
    }

    async fn lock_wallet(&self, wallet: Address) -> Option<OwnedMutexGuard<()>> {
        let locks = self.submission_locks.as_ref()?;
        let lock = locks
            .entry(wallet)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Some(lock.lock_owned().await)
    }
}

fn finish(
    action_key: &str,
    started: Instant,
    outcome: Result<Submission, ActionError>,
) -> ResultEnvelope {
    match outcome {
        Ok(submission) => {
            tracing::info!(
                action_key,
                tx_hash = %submission.transaction_hash,
                block_number = ?submission.block_number,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Action invoked"
            );
            metrics::record_invocation("success", "none", started);
            ResultEnvelope::success(submission.transaction_hash, submission.block_number)
        }
        Err(err) => {
            let kind = err.kind();
            if kind == ErrorKind::Unexpected {
                tracing::error!(action_key, error = %err, "Action failed unexpectedly");
            } else {
                tracing::warn!(
                    action_key,
                    kind = kind.as_str(),
                    tx_hash = ?err.transaction_hash(),
                    error = %err,
                    "Action failed"
                );
            }
            metrics::record_invocation("failure", kind.as_str(), started);
            ResultEnvelope::failure(&err)
        }
    }
}

impl std::fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("registry", &self.registry)
            .field("wallets", &self.wallets)
            .field("serialized_submissions", &self.submission_locks.is_some())
            .finish()
    }
}
