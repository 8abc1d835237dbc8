//! Wallet resolution for a verified caller.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

use alloy::primitives::Address;

use crate::http::server::AppState;
use crate::pipeline::{ActionError, ErrorKind};
use crate::wallet::derive_encryption_context;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRequest {
    #[serde(default)]
    pub identity_token: Option<String>,
    #[serde(default)]
    pub encryption_context: Option<String>,
    #[serde(default)]
    pub pin: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub wallet_address: Address,
}

pub async fn resolve_wallet(
    State(state): State<AppState>,
    Json(request): Json<WalletRequest>,
) -> impl IntoResponse {
    match resolve(&state, request).await {
        Ok(wallet_address) => (StatusCode::OK, Json(WalletResponse { wallet_address })).into_response(),
        Err(err) => {
            let status = status_for(err.kind());
            if status.is_server_error() {
                tracing::error!(error = %err, "Wallet resolution failed");
            }
            let message = match err.kind() {
                ErrorKind::Unexpected => crate::pipeline::UNEXPECTED_MESSAGE.to_string(),
                _ => err.to_string(),
            };
            (
                status,
                Json(json!({ "error": message, "errorKind": err.kind() })),
            )
                .into_response()
        }
    }
}

async fn resolve(state: &AppState, request: WalletRequest) -> Result<Address, ActionError> {
    let token = request
        .identity_token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or(ActionError::MissingIdentity)?;

    let encryption_context = request
        .encryption_context
        .or_else(|| request.pin.as_deref().map(derive_encryption_context));

    let public_address = state.ctx.executor.identity().verify(token).await?;
    let wallet = state
        .ctx
        .wallets
        .resolve(&public_address, encryption_context.as_deref())
        .await?;
    Ok(wallet.wallet_address)
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::MissingIdentity | ErrorKind::IdentityRejected => StatusCode::UNAUTHORIZED,
        ErrorKind::WalletNotFound
        | ErrorKind::MissingEncryptionContext
        | ErrorKind::InvalidArguments => StatusCode::BAD_REQUEST,
        ErrorKind::UnknownAction => StatusCode::NOT_FOUND,
        ErrorKind::NetworkError | ErrorKind::SigningError | ErrorKind::TransactionError => {
            StatusCode::BAD_GATEWAY
        }
        ErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
