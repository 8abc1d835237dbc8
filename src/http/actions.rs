//! Action listing per contract.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::http::server::AppState;

pub async fn list_actions(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.ctx.contracts.actions_for(id) {
        Ok(Some(actions)) => (StatusCode::OK, Json(actions.descriptors())).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Contract {id} not found") })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(contract_id = id, error = %e, "Failed to compile stored contract");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": crate::pipeline::UNEXPECTED_MESSAGE })),
            )
                .into_response()
        }
    }
}
