//! Identity token verification.
//!
//! A verified token yields the caller's public address, which keys the
//! wallet cache. Tokens are never logged.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::schema::IdentityConfig;

/// Environment variable holding the identity service secret.
pub const IDENTITY_SECRET_ENV_VAR: &str = "CHAIN_ACTIONS_IDENTITY_SECRET";

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The token is invalid, expired or unknown.
    #[error("Invalid identity token: {0}")]
    Rejected(String),

    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token` and return the caller's public address.
    async fn verify(&self, token: &str) -> Result<String, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    data: VerifiedIdentity,
}

#[derive(Debug, Deserialize)]
struct VerifiedIdentity {
    public_address: String,
}

/// Verifies tokens against `GET {verify_url}?token=...`.
#[derive(Clone)]
pub struct RemoteIdentityVerifier {
    http: reqwest::Client,
    verify_url: String,
}

impl RemoteIdentityVerifier {
    /// Build a verifier; the secret header is sent only when the secret is set.
    pub fn from_env(config: &IdentityConfig) -> Result<Self, IdentityError> {
        Self::new(config, std::env::var(IDENTITY_SECRET_ENV_VAR).ok().as_deref())
    }

    pub fn new(config: &IdentityConfig, secret: Option<&str>) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();
        if let Some(secret) = secret {
            let name = HeaderName::from_bytes(config.secret_header.as_bytes())
                .map_err(|e| IdentityError::Unavailable(format!("secret header name: {e}")))?;
            let mut value = HeaderValue::from_str(secret)
                .map_err(|e| IdentityError::Unavailable(format!("secret header value: {e}")))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            verify_url: config.verify_url.clone(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for RemoteIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<String, IdentityError> {
        let response = self
            .http
            .get(&self.verify_url)
            .query(&[("token", token)])
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        match response.status() {
            s if s.is_success() => {}
            StatusCode::BAD_REQUEST
            | StatusCode::UNAUTHORIZED
            | StatusCode::FORBIDDEN
            | StatusCode::NOT_FOUND => {
                return Err(IdentityError::Rejected(format!(
                    "verification returned {}",
                    response.status()
                )))
            }
            s => return Err(IdentityError::Unavailable(format!("verification returned {s}"))),
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(format!("malformed response: {e}")))?;

        let address = body.data.public_address.trim().to_string();
        if address.is_empty() {
            return Err(IdentityError::Rejected("no public address".to_string()));
        }
        tracing::debug!(public_address = %address, "Identity verified");
        Ok(address)
    }
}

impl std::fmt::Debug for RemoteIdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteIdentityVerifier")
            .field("verify_url", &self.verify_url)
            .finish()
    }
}
