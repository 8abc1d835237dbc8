use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub cached_wallets: usize,
    pub loaded_contracts: usize,
    pub chain_ids: Vec<u64>,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus { status: "ok" })
}

pub async fn status(State(state): State<AppState>) -> Json<ServiceStatus> {
    let ctx = &state.ctx;
    Json(ServiceStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        cached_wallets: ctx.wallets.cached_count(),
        loaded_contracts: ctx.contracts.len(),
        chain_ids: ctx.chains.chain_ids(),
    })
}
