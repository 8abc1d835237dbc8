//! In-process fakes for the chain node, signing service and identity verifier.

use alloy::primitives::{keccak256, Address, TxHash};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::actions::{parse_function_list, CompileOptions, ContractRef};
use crate::cache::KvStore;
use crate::chain::{ChainError, ChainNode, ChainRegistry, ChainResult, FeeData, InclusionReceipt};
use crate::identity::{IdentityError, IdentityVerifier};
use crate::pipeline::{ActionExecutor, Broadcaster, TransactionBuilder, UnsignedTxPayload, DEFAULT_GAS_LIMIT};
use crate::registry::ContractRegistry;
use crate::signer::types::{CustodialSigner, SignerError, SignerResult, WalletGroup};
use crate::wallet::{WalletIdentity, WalletResolver};

pub const CHAIN_ID: u64 = 11155111;
pub const ALICE_TOKEN: &str = "alice-token";
pub const ALICE: &str = "0xA11CE00000000000000000000000000000000001";
pub const TOKEN_ADDRESS: &str = "0x1111111111111111111111111111111111111111";

pub const TOKEN_ABI: &str = r#"[
    {"type": "function", "name": "transfer", "stateMutability": "nonpayable", "inputs": [
        {"name": "to", "type": "address"},
        {"name": "amount", "type": "uint256"}
    ], "outputs": [{"name": "", "type": "bool"}]},
    {"type": "function", "name": "boom", "inputs": []}
]"#;

pub struct FakeChain {
    pub chain_id: u64,
    pub nonce: AtomicU64,
    pub fail_nonce: AtomicBool,
    pub fail_estimate: AtomicBool,
    pub revert: AtomicBool,
    pub never_mined: AtomicBool,
    pub broadcast_times_out: AtomicBool,
    pub reject_with: Mutex<Option<String>>,
    pub estimates: Mutex<Vec<TransactionRequest>>,
    pub sent: Mutex<Vec<Vec<u8>>>,
}

impl FakeChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            nonce: AtomicU64::new(0),
            fail_nonce: AtomicBool::new(false),
            fail_estimate: AtomicBool::new(false),
            revert: AtomicBool::new(false),
            never_mined: AtomicBool::new(false),
            broadcast_times_out: AtomicBool::new(false),
            reject_with: Mutex::new(None),
            estimates: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn reject(&self, message: &str) {
        *self.reject_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ChainNode for FakeChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn transaction_count(&self, _address: Address) -> ChainResult<u64> {
        if self.fail_nonce.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("connection refused".to_string()));
        }
        Ok(self.nonce.load(Ordering::SeqCst))
    }

    async fn fee_data(&self) -> ChainResult<FeeData> {
        Ok(FeeData {
            max_fee_per_gas: 30_000_000_000,
            max_priority_fee_per_gas: 1_500_000_000,
        })
    }

    async fn estimate_gas(&self, request: TransactionRequest) -> ChainResult<u64> {
        self.estimates.lock().unwrap().push(request);
        if self.fail_estimate.load(Ordering::SeqCst) {
            return Err(ChainError::Rejected("execution reverted".to_string()));
        }
        Ok(52_000)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<TxHash> {
        if let Some(message) = self.reject_with.lock().unwrap().clone() {
            return Err(ChainError::Rejected(message));
        }
        self.sent.lock().unwrap().push(raw.to_vec());
        if self.broadcast_times_out.load(Ordering::SeqCst) {
            return Err(ChainError::Timeout(10));
        }
        self.nonce.fetch_add(1, Ordering::SeqCst);
        Ok(keccak256(raw))
    }

    async fn wait_for_inclusion(&self, hash: TxHash) -> ChainResult<InclusionReceipt> {
        if self.never_mined.load(Ordering::SeqCst) {
            return Err(ChainError::ConfirmationTimeout { hash, secs: 120 });
        }
        Ok(InclusionReceipt {
            transaction_hash: hash,
            block_number: Some(42),
            success: !self.revert.load(Ordering::SeqCst),
        })
    }
}

#[derive(Default)]
pub struct FakeSigner {
    pub no_groups: bool,
    pub fail_signing: bool,
    pub panic_on_sign: bool,
    pub wallets_created: AtomicUsize,
    pub group_listings: AtomicUsize,
    pub contexts: Mutex<Vec<String>>,
    pub signed: Mutex<Vec<UnsignedTxPayload>>,
}

impl FakeSigner {
    pub fn last_encryption_context(&self) -> Option<String> {
        self.contexts.lock().unwrap().last().cloned()
    }

    pub fn signed_payloads(&self) -> Vec<UnsignedTxPayload> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl CustodialSigner for FakeSigner {
    async fn list_wallet_groups(&self) -> SignerResult<Vec<WalletGroup>> {
        self.group_listings.fetch_add(1, Ordering::SeqCst);
        if self.no_groups {
            return Ok(Vec::new());
        }
        Ok(vec![WalletGroup {
            uuid: "group-1".to_string(),
        }])
    }

    async fn create_wallet(
        &self,
        _wallet_group_id: &str,
        encryption_context: &str,
    ) -> SignerResult<WalletIdentity> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let n = self.wallets_created.fetch_add(1, Ordering::SeqCst) + 1;
        self.contexts.lock().unwrap().push(encryption_context.to_string());
        Ok(WalletIdentity {
            wallet_id: format!("wallet-{n}"),
            access_key: format!("key-{n}"),
            wallet_address: Address::with_last_byte(n as u8),
        })
    }

    async fn sign_transaction(
        &self,
        payload: &UnsignedTxPayload,
        _wallet: &WalletIdentity,
        encryption_context: &str,
    ) -> SignerResult<String> {
        if self.panic_on_sign {
            panic!("signer exploded");
        }
        if self.fail_signing {
            return Err(SignerError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        self.contexts.lock().unwrap().push(encryption_context.to_string());
        self.signed.lock().unwrap().push(payload.clone());
        Ok(format!("0x02{:016x}{}", payload.nonce, hex::encode(&payload.data)))
    }
}

/// Maps fixed tokens to public addresses; anything else is rejected.
pub struct FakeIdentity {
    tokens: HashMap<String, String>,
}

impl FakeIdentity {
    pub fn new(tokens: &[(&str, &str)]) -> Self {
        Self {
            tokens: tokens
                .iter()
                .map(|(t, a)| (t.to_string(), a.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for FakeIdentity {
    async fn verify(&self, token: &str) -> Result<String, IdentityError> {
        if token == "unavailable" {
            return Err(IdentityError::Unavailable("connection refused".to_string()));
        }
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::Rejected("unknown token".to_string()))
    }
}

pub fn token_contract(id: i64) -> ContractRef {
    ContractRef {
        id,
        address: TOKEN_ADDRESS.parse().unwrap(),
        chain_id: CHAIN_ID,
        name: Some("Token".to_string()),
        context: None,
        function_list: parse_function_list(TOKEN_ABI).unwrap(),
    }
}

/// A fully wired executor over fakes, with contract 3 loaded.
pub struct Harness {
    pub store: KvStore,
    pub chain: Arc<FakeChain>,
    pub signer: Arc<FakeSigner>,
    pub chains: Arc<ChainRegistry>,
    pub executor: ActionExecutor,
}

impl Harness {
    pub fn new(signer: FakeSigner) -> Self {
        let store = KvStore::default();
        let chain = Arc::new(FakeChain::new(CHAIN_ID));
        let signer = Arc::new(signer);

        let mut registry = ChainRegistry::new();
        registry.insert(chain.clone());
        let chains = Arc::new(registry);

        let contracts = Arc::new(ContractRegistry::new(
            store.clone(),
            CompileOptions {
                allow_transaction_value: true,
            },
        ));
        contracts.put(&token_contract(3)).unwrap();

        let executor = ActionExecutor::new(
            contracts,
            Arc::new(FakeIdentity::new(&[(ALICE_TOKEN, ALICE)])),
            Arc::new(WalletResolver::new(store.clone(), signer.clone())),
            Arc::new(TransactionBuilder::new(chains.clone(), DEFAULT_GAS_LIMIT)),
            signer.clone(),
            Arc::new(Broadcaster::new(chains.clone())),
        );

        Self {
            store,
            chain,
            signer,
            chains,
            executor,
        }
    }
}
