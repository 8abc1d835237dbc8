//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Secrets are
//! never part of the file; they come from environment variables.

use serde::{Deserialize, Serialize};

/// Root configuration for the action service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub listener: ListenerConfig,

    /// Custodial signing service.
    pub signer: SignerConfig,

    /// Identity token verification.
    pub identity: IdentityConfig,

    /// One entry per supported chain.
    pub chains: Vec<ChainConfig>,

    /// Seeding of freshly created wallets.
    pub funding: FundingConfig,

    /// Transaction pipeline behaviour.
    pub pipeline: PipelineConfig,

    /// Keyed cache persistence.
    pub cache: CacheConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Contracts loaded into the registry at startup.
    pub contracts: Vec<ContractConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Whole-request timeout for every route except execute.
    /// Must cover identity verification plus wallet creation.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 180,
            max_body_size: 256 * 1024,
        }
    }
}

/// Custodial signing service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Base URL, e.g. "https://signer.internal/api".
    pub base_url: String,

    /// Header carrying the service secret.
    pub secret_header: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Network label sent on wallet creation.
    pub network: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            secret_header: "x-service-secret-key".to_string(),
            timeout_secs: 10,
            network: "mainnet".to_string(),
        }
    }
}

/// Identity verification endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// `GET {verify_url}?token=...` returns `{ "data": { "public_address": ... } }`.
    pub verify_url: String,

    pub secret_header: String,

    pub timeout_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            verify_url: String::new(),
            secret_header: "x-service-secret-key".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Per-chain JSON-RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Chain ID (e.g., 1 for Ethereum mainnet, 11155111 for Sepolia).
    pub chain_id: u64,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Receipt polling interval in seconds.
    pub confirmation_poll_secs: u64,

    /// Maximum time to wait for inclusion, in seconds.
    pub confirmation_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            rpc_timeout_secs: 10,
            confirmation_poll_secs: 2,
            confirmation_timeout_secs: 120,
        }
    }
}

/// Seeding of new wallets with native currency on test networks.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FundingConfig {
    pub enabled: bool,

    /// Public address whose cached wallet pays for seeding.
    pub funder_public_address: String,

    /// Amount per chain in wei, decimal or 0x hex.
    pub amount_wei: String,

    /// Chains to seed on. Each must appear in `chains`.
    pub chain_ids: Vec<u64>,
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            funder_public_address: String::new(),
            amount_wei: "1000000000000000".to_string(), // 0.001 ether
            chain_ids: Vec::new(),
        }
    }
}

/// Transaction pipeline settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Gas limit used when estimation fails.
    pub default_gas_limit: u64,

    /// Hold a per-wallet lock from nonce fetch until broadcast.
    pub serialize_wallet_submissions: bool,

    /// Attach the optional `transactionValue` field to every action.
    pub allow_transaction_value: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_gas_limit: 100_000,
            serialize_wallet_submissions: false,
            allow_transaction_value: true,
        }
    }
}

/// Keyed cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// JSON file the cache is loaded from and saved to. In-memory only when unset.
    pub persistence_path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A contract whose ABI is compiled into actions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractConfig {
    /// Registry id; `-1` marks the built-in entry.
    pub id: i64,

    pub address: String,

    pub chain_id: u64,

    #[serde(default)]
    pub name: Option<String>,

    /// Extra text appended to action descriptions.
    #[serde(default)]
    pub context: Option<String>,

    /// Inline JSON ABI.
    #[serde(default)]
    pub abi: Option<String>,

    /// Path to a JSON ABI file (bare array or artifact with an `abi` field).
    #[serde(default)]
    pub abi_path: Option<String>,
}
