//! HTTP client for the custodial signing service.
//!
//! # Security
//! - The service secret is read ONLY from the environment
//! - The secret header is marked sensitive and never logged
//! - Access keys and encryption contexts travel only in request bodies

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::schema::SignerConfig;
use crate::pipeline::payload::UnsignedTxPayload;
use crate::signer::types::{
    CreateWalletRequest, CustodialSigner, DataEnvelope, SignTransactionRequest, SignedTransaction,
    SignerError, SignerResult, WalletGroup,
};
use crate::wallet::types::WalletIdentity;

/// Environment variable holding the signing service secret.
pub const SIGNER_SECRET_ENV_VAR: &str = "CHAIN_ACTIONS_SIGNER_SECRET";

/// HTTP client for the custodial signing service.
#[derive(Clone)]
pub struct SignerClient {
    /// Shared client carrying the secret header and timeout.
    http: reqwest::Client,
    /// Service base URL, without a trailing slash.
    base_url: String,
    /// Network name sent on wallet creation.
    network: String,
    /// Request timeout, reported in timeout errors.
    timeout_secs: u64,
}

impl SignerClient {
    /// Build a client using the secret from [`SIGNER_SECRET_ENV_VAR`].
    pub fn from_env(config: &SignerConfig) -> SignerResult<Self> {
        let secret = std::env::var(SIGNER_SECRET_ENV_VAR).map_err(|_| {
            SignerError::InvalidConfig(format!("{SIGNER_SECRET_ENV_VAR} is not set"))
        })?;
        Self::new(config, &secret)
    }

    pub fn new(config: &SignerConfig, secret: &str) -> SignerResult<Self> {
        let name = HeaderName::from_bytes(config.secret_header.as_bytes())
            .map_err(|e| SignerError::InvalidConfig(format!("secret header name: {e}")))?;
        let mut value = HeaderValue::from_str(secret)
            .map_err(|e| SignerError::InvalidConfig(format!("secret header value: {e}")))?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(name, value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SignerError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            network: config.network.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and decode the `data` field of a 2xx response.
    async fn roundtrip<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> SignerResult<T> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SignerError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: DataEnvelope<T> = response
            .json()
            .await
            .map_err(|e| SignerError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }

    fn transport_error(&self, e: reqwest::Error) -> SignerError {
        if e.is_timeout() {
            SignerError::Timeout(self.timeout_secs)
        } else {
            SignerError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl CustodialSigner for SignerClient {
    async fn list_wallet_groups(&self) -> SignerResult<Vec<WalletGroup>> {
        self.roundtrip(self.http.get(self.url("wallet_groups"))).await
    }

    async fn create_wallet(
        &self,
        wallet_group_id: &str,
        encryption_context: &str,
    ) -> SignerResult<WalletIdentity> {
        let body = CreateWalletRequest {
            wallet_group_id,
            network: &self.network,
            encryption_context,
        };
        let wallet: WalletIdentity = self
            .roundtrip(self.http.post(self.url("wallet")).json(&body))
            .await?;
        tracing::info!(
            wallet_id = %wallet.wallet_id,
            wallet = %wallet.wallet_address,
            "Custodial wallet created"
        );
        Ok(wallet)
    }

    async fn sign_transaction(
        &self,
        payload: &UnsignedTxPayload,
        wallet: &WalletIdentity,
        encryption_context: &str,
    ) -> SignerResult<String> {
        let body = SignTransactionRequest {
            payload,
            encryption_context,
            access_key: &wallet.access_key,
            wallet_id: &wallet.wallet_id,
        };
        let signed: SignedTransaction = self
            .roundtrip(self.http.post(self.url("wallet/sign_transaction")).json(&body))
            .await?;
        tracing::debug!(
            wallet = %wallet.wallet_address,
            chain_id = payload.chain_id,
            nonce = payload.nonce,
            "Transaction signed"
        );
        Ok(signed.signed_transaction)
    }
}

impl std::fmt::Debug for SignerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerClient")
            .field("base_url", &self.base_url)
            .field("network", &self.network)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
