//! Chain id → node lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::chain::client::ChainClient;
use crate::chain::types::{ChainConfig, ChainError, ChainNode, ChainResult};

#[derive(Clone, Default)]
pub struct ChainRegistry {
    nodes: HashMap<u64, Arc<dyn ChainNode>>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One [`ChainClient`] per configured chain.
    pub fn from_config(chains: &[ChainConfig]) -> ChainResult<Self> {
        let mut registry = Self::new();
        for chain in chains {
            registry.insert(Arc::new(ChainClient::new(chain.clone())?));
        }
        Ok(registry)
    }

    /// Register `node` under its chain id, replacing any previous node.
    pub fn insert(&mut self, node: Arc<dyn ChainNode>) {
        self.nodes.insert(node.chain_id(), node);
    }

    pub fn get(&self, chain_id: u64) -> ChainResult<Arc<dyn ChainNode>> {
        self.nodes
            .get(&chain_id)
            .cloned()
            .ok_or(ChainError::UnsupportedChain(chain_id))
    }

    pub fn chain_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for ChainRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainRegistry")
            .field("chain_ids", &self.chain_ids())
            .finish()
    }
}
