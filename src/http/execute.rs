//! The invocation endpoint.
//!
//! Always answers 200 with a [`ResultEnvelope`]; failures are reported in
//! the envelope, never through the HTTP status.

use axum::{body::Bytes, extract::State, Json};

use crate::http::server::AppState;
use crate::pipeline::{ActionError, InvocationRequest, ResultEnvelope};

pub async fn execute(State(state): State<AppState>, body: Bytes) -> Json<ResultEnvelope> {
    let request: InvocationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected malformed invocation body");
            let err = ActionError::InvalidArguments(format!("malformed request body: {e}"));
            return Json(ResultEnvelope::failure(&err));
        }
    };

    let ctx = request.context();
    let envelope = state
        .ctx
        .executor
        .invoke(&request.action_key, &ctx, &request.args)
        .await;
    Json(envelope)
}
