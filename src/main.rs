//! Contract action execution service.
//!
//! # Architecture Overview
//!
//! ```text
//!   POST /api/v1/execute
//!          │
//!          ▼
//!   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │   registry   │──▶│   identity   │──▶│    wallet    │──┐
//!   │ (action key) │   │  (token →    │   │  (resolve /  │  │
//!   └──────────────┘   │   address)   │   │   create)    │  │
//!                      └──────────────┘   └──────────────┘  │
//!          ┌────────────────────────────────────────────────┘
//!          ▼
//!   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │   builder    │──▶│    signer    │──▶│ broadcaster  │──▶ ResultEnvelope
//!   │ (nonce, gas) │   │  (custodial) │   │  (confirm)   │
//!   └──────────────┘   └──────────────┘   └──────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;

use chain_actions::config::{load_config, AppConfig};
use chain_actions::observability::{logging, metrics};
use chain_actions::{AppContext, HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "chain-actions", version, about = "Contract action execution service")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "CHAIN_ACTIONS_CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            // logging is configured from the file, so report directly
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "chain-actions starting"
    );

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let ctx = Arc::new(AppContext::from_config(config).await?);

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signals = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { shutdown.listen_for_signals().await })
    };

    let server = HttpServer::new(Arc::clone(&ctx), shutdown);
    let result = server.run(listener).await;
    signals.abort();

    ctx.save_cache();
    result?;
    Ok(())
}
