//! HTTP surface of the action service.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request id, tracing, timeout, body limit)
//!     → execute.rs (POST /api/v1/execute → ActionExecutor → ResultEnvelope)
//!     → wallet.rs (POST /api/v1/wallet → IdentityVerifier → WalletResolver)
//!     → actions.rs (GET /api/v1/contracts/{id}/actions)
//!     → status.rs (GET /health, GET /api/v1/status)
//! ```

pub mod actions;
pub mod execute;
pub mod server;
pub mod status;
pub mod wallet;

pub use server::{build_router, AppState, HttpServer, X_REQUEST_ID};
