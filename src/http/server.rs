//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (request id, tracing, timeout, body limit)
//! - Serve until the shutdown coordinator fires
//!
//! `/api/v1/execute` is not under the request timeout. Every stage of the
//! pipeline carries its own timeout, and a cut-off request would lose the
//! envelope together with the hash of a broadcast transaction.

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::HeaderName,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::http::{actions, execute, status, wallet};
use crate::lifecycle::{AppContext, Shutdown};

/// Request id header, generated when absent and echoed on the response.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<AppContext>,
}

pub struct HttpServer {
    router: Router,
    shutdown: Shutdown,
}

impl HttpServer {
    pub fn new(ctx: Arc<AppContext>, shutdown: Shutdown) -> Self {
        Self {
            router: build_router(ctx),
            shutdown,
        }
    }

    /// Run the server on `listener` until shutdown is triggered.
    ///
    /// In-flight requests are drained before this returns.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let listener = &ctx.config.listener;
    let request_timeout = Duration::from_secs(listener.request_timeout_secs);
    let max_body_size = listener.max_body_size;
    let request_id = HeaderName::from_static(X_REQUEST_ID);

    let bounded = Router::new()
        .route("/health", get(status::health))
        .route("/api/v1/status", get(status::status))
        .route("/api/v1/wallet", post(wallet::resolve_wallet))
        .route("/api/v1/contracts/{id}/actions", get(actions::list_actions))
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .route("/api/v1/execute", post(execute::execute))
        .merge(bounded)
        .with_state(AppState { ctx })
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                    let id = request
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %id,
                    )
                }))
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
}
