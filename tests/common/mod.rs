//! Shared utilities for integration tests: mock remote services and a fake chain.

#![allow(dead_code)]

use alloy::primitives::{keccak256, Address, TxHash};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use chain_actions::cache::KvStore;
use chain_actions::chain::{ChainError, ChainNode, ChainRegistry, ChainResult, FeeData, InclusionReceipt};
use chain_actions::config::{AppConfig, ContractConfig, IdentityConfig, SignerConfig};
use chain_actions::identity::RemoteIdentityVerifier;
use chain_actions::lifecycle::{AppContext, Services};
use chain_actions::signer::SignerClient;

pub const CHAIN_ID: u64 = 11155111;
pub const SIGNER_SECRET: &str = "signer-secret";
pub const ALICE_TOKEN: &str = "alice-token";
pub const ALICE: &str = "0xA11CE00000000000000000000000000000000001";
pub const CUSTODIAL_ADDRESS: &str = "0x00000000000000000000000000000000000000ab";
pub const TOKEN_ADDRESS: &str = "0x1111111111111111111111111111111111111111";
pub const TOKEN_ABI: &str = r#"[
    {"type": "function", "name": "transfer", "stateMutability": "nonpayable", "inputs": [
        {"name": "to", "type": "address"},
        {"name": "amount", "type": "uint256"}
    ], "outputs": [{"name": "", "type": "bool"}]}
]"#;

/// Serve `router` on an ephemeral local port.
pub async fn spawn_service(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// One request seen by a mock service.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: &'static str,
    pub secret: Option<String>,
    pub body: Value,
}

/// Programmable stand-in for the custodial signing service.
#[derive(Clone, Default)]
pub struct MockSigner {
    pub requests: Arc<Mutex<Vec<Recorded>>>,
    /// Non-zero makes `sign_transaction` answer with this status.
    pub sign_status: Arc<AtomicU16>,
}

impl MockSigner {
    pub fn recorded(&self, path: &str) -> Vec<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    fn record(&self, path: &'static str, headers: &HeaderMap, body: Value) {
        let secret = headers
            .get("x-service-secret-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push(Recorded { path, secret, body });
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/wallet_groups", get(wallet_groups))
            .route("/wallet", post(create_wallet))
            .route("/wallet/sign_transaction", post(sign_transaction))
            .with_state(self.clone())
    }

    pub async fn spawn(&self) -> SocketAddr {
        spawn_service(self.router()).await
    }
}

async fn wallet_groups(State(mock): State<MockSigner>, headers: HeaderMap) -> Json<Value> {
    mock.record("wallet_groups", &headers, Value::Null);
    Json(json!({ "data": [{ "uuid": "group-1" }] }))
}

async fn create_wallet(
    State(mock): State<MockSigner>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    mock.record("wallet", &headers, body);
    Json(json!({
        "data": {
            "uuid": "wallet-1",
            "access_key": "access-1",
            "public_address": CUSTODIAL_ADDRESS
        }
    }))
}

async fn sign_transaction(
    State(mock): State<MockSigner>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    mock.record("sign_transaction", &headers, body);
    let status = mock.sign_status.load(Ordering::SeqCst);
    if status != 0 {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, "signing backend failure").into_response();
    }
    Json(json!({ "data": { "signed_transaction": "0x02f86b0102" } })).into_response()
}

/// Identity service accepting a fixed set of tokens.
pub async fn spawn_identity(tokens: &[(&str, &str)]) -> SocketAddr {
    let tokens: Arc<HashMap<String, String>> = Arc::new(
        tokens
            .iter()
            .map(|(t, a)| (t.to_string(), a.to_string()))
            .collect(),
    );
    let router = Router::new()
        .route("/verify", get(verify))
        .with_state(tokens);
    spawn_service(router).await
}

async fn verify(
    State(tokens): State<Arc<HashMap<String, String>>>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    match query.get("token").and_then(|t| tokens.get(t)) {
        Some(address) => Json(json!({ "data": { "public_address": address } })).into_response(),
        None => (StatusCode::UNAUTHORIZED, "invalid token").into_response(),
    }
}

/// In-memory chain: fixed fees, sequential nonces, every transaction mined in block 42.
pub struct FakeChain {
    pub nonce: AtomicU64,
    pub sent: Mutex<Vec<Vec<u8>>>,
    pub revert: std::sync::atomic::AtomicBool,
    /// Broadcasts reach the node but the answer times out.
    pub broadcast_times_out: std::sync::atomic::AtomicBool,
    /// Milliseconds before a transaction is reported mined.
    pub inclusion_delay_ms: AtomicU64,
}

impl FakeChain {
    pub fn new() -> Self {
        Self {
            nonce: AtomicU64::new(7),
            sent: Mutex::new(Vec::new()),
            revert: std::sync::atomic::AtomicBool::new(false),
            broadcast_times_out: std::sync::atomic::AtomicBool::new(false),
            inclusion_delay_ms: AtomicU64::new(0),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ChainNode for FakeChain {
    fn chain_id(&self) -> u64 {
        CHAIN_ID
    }

    async fn transaction_count(&self, _address: Address) -> ChainResult<u64> {
        Ok(self.nonce.load(Ordering::SeqCst))
    }

    async fn fee_data(&self) -> ChainResult<FeeData> {
        Ok(FeeData {
            max_fee_per_gas: 20_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
        })
    }

    async fn estimate_gas(&self, _request: TransactionRequest) -> ChainResult<u64> {
        Ok(48_000)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<TxHash> {
        if raw.is_empty() {
            return Err(ChainError::Rejected("empty transaction".to_string()));
        }
        self.sent.lock().unwrap().push(raw.to_vec());
        if self.broadcast_times_out.load(Ordering::SeqCst) {
            return Err(ChainError::Timeout(10));
        }
        self.nonce.fetch_add(1, Ordering::SeqCst);
        Ok(keccak256(raw))
    }

    async fn wait_for_inclusion(&self, hash: TxHash) -> ChainResult<InclusionReceipt> {
        let delay = self.inclusion_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        Ok(InclusionReceipt {
            transaction_hash: hash,
            block_number: Some(42),
            success: !self.revert.load(Ordering::SeqCst),
        })
    }
}

pub fn signer_config(addr: SocketAddr) -> SignerConfig {
    SignerConfig {
        base_url: format!("http://{addr}"),
        ..SignerConfig::default()
    }
}

/// A running service stack: mock signer, mock identity service and a fake chain.
pub struct TestApp {
    pub ctx: Arc<AppContext>,
    pub signer: MockSigner,
    pub chain: Arc<FakeChain>,
}

impl TestApp {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start with a config adjusted by `configure`.
    pub async fn start_with(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let signer = MockSigner::default();
        let signer_addr = signer.spawn().await;
        let identity_addr = spawn_identity(&[(ALICE_TOKEN, ALICE)]).await;

        let mut config = AppConfig {
            signer: signer_config(signer_addr),
            identity: IdentityConfig {
                verify_url: format!("http://{identity_addr}/verify"),
                ..IdentityConfig::default()
            },
            contracts: vec![ContractConfig {
                id: 3,
                address: TOKEN_ADDRESS.to_string(),
                chain_id: CHAIN_ID,
                name: Some("Token".to_string()),
                context: None,
                abi: Some(TOKEN_ABI.to_string()),
                abi_path: None,
            }],
            ..AppConfig::default()
        };
        configure(&mut config);

        let chain = Arc::new(FakeChain::new());
        let mut chains = ChainRegistry::new();
        chains.insert(chain.clone());

        let services = Services {
            chains,
            signer: Arc::new(SignerClient::new(&config.signer, SIGNER_SECRET).unwrap()),
            identity: Arc::new(RemoteIdentityVerifier::new(&config.identity, None).unwrap()),
        };

        let ctx = AppContext::assemble(config, KvStore::new(None), services, None).unwrap();
        Self {
            ctx: Arc::new(ctx),
            signer,
            chain,
        }
    }

    pub fn router(&self) -> Router {
        chain_actions::http::build_router(Arc::clone(&self.ctx))
    }
}
