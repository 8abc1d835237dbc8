//! Contract registry backed by the keyed cache.
//!
//! Contracts are stored under the `contract` namespace keyed by id. Actions
//! are recompiled from the stored function list on demand.

use alloy::primitives::Address;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::actions::{compile, parse_function_list, Action, ActionKey, ActionSet, CompileError, CompileOptions, ContractRef};
use crate::cache::{CacheError, KeyedCache, KvStore};
use crate::config::schema::ContractConfig;
use crate::pipeline::error::ActionError;

/// Cache namespace for contracts.
pub const CONTRACT_NAMESPACE: &str = "contract";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("contract {id}: {source}")]
    Compile {
        id: i64,
        #[source]
        source: CompileError,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("failed to read ABI file {path}: {source}")]
    AbiFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("contract {id}: invalid address '{address}'")]
    InvalidAddress { id: i64, address: String },

    #[error("contract {0}: no ABI configured")]
    MissingAbi(i64),
}

pub struct ContractRegistry {
    contracts: KeyedCache<ContractRef>,
    options: CompileOptions,
}

impl ContractRegistry {
    pub fn new(store: KvStore, options: CompileOptions) -> Self {
        Self {
            contracts: KeyedCache::new(store, CONTRACT_NAMESPACE),
            options,
        }
    }

    /// Store every configured contract, replacing entries with the same id.
    pub fn load_from_config(&self, contracts: &[ContractConfig]) -> Result<usize, RegistryError> {
        for config in contracts {
            let contract = Self::contract_from_config(config)?;
            let actions = self.put(&contract)?;
            tracing::info!(
                contract_id = contract.id,
                address = %contract.address,
                chain_id = contract.chain_id,
                actions,
                "Contract loaded"
            );
        }
        Ok(contracts.len())
    }

    pub fn contract_from_config(config: &ContractConfig) -> Result<ContractRef, RegistryError> {
        let address = Address::from_str(config.address.trim()).map_err(|_| {
            RegistryError::InvalidAddress {
                id: config.id,
                address: config.address.clone(),
            }
        })?;

        let abi_json = match (&config.abi, &config.abi_path) {
            (Some(abi), _) => abi.clone(),
            (None, Some(path)) => std::fs::read_to_string(Path::new(path)).map_err(|source| {
                RegistryError::AbiFile {
                    path: path.clone(),
                    source,
                }
            })?,
            (None, None) => return Err(RegistryError::MissingAbi(config.id)),
        };

        let function_list = parse_function_list(&abi_json)
            .map_err(|source| RegistryError::Compile { id: config.id, source })?;

        Ok(ContractRef {
            id: config.id,
            address,
            chain_id: config.chain_id,
            name: config.name.clone(),
            context: config.context.clone(),
            function_list,
        })
    }

    /// Validate by compiling, then store. Returns the number of actions.
    pub fn put(&self, contract: &ContractRef) -> Result<usize, RegistryError> {
        let compiled = compile(&Arc::new(contract.clone()), &self.options)
            .map_err(|source| RegistryError::Compile { id: contract.id, source })?;
        self.contracts.set(&contract.id.to_string(), contract)?;
        Ok(compiled.len())
    }

    pub fn get(&self, id: i64) -> Result<Option<ContractRef>, RegistryError> {
        Ok(self.contracts.get(&id.to_string())?)
    }

    pub fn delete(&self, id: i64) -> bool {
        self.contracts.delete(&id.to_string())
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compile the actions of contract `id`, if stored.
    pub fn actions_for(&self, id: i64) -> Result<Option<ActionSet>, RegistryError> {
        let Some(contract) = self.get(id)? else {
            return Ok(None);
        };
        let actions = compile(&Arc::new(contract), &self.options)
            .map_err(|source| RegistryError::Compile { id, source })?;
        Ok(Some(ActionSet::new(actions)))
    }

    /// Find the action named by `action_key`.
    pub fn resolve_action(&self, action_key: &str) -> Result<Action, ActionError> {
        let unknown = || ActionError::UnknownAction(action_key.to_string());
        let key: ActionKey = action_key.parse().map_err(|_| unknown())?;

        let set = self
            .actions_for(key.contract_id)
            .map_err(|e| ActionError::Unexpected(e.to_string()))?
            .ok_or_else(unknown)?;
        set.get(&key).cloned().ok_or_else(unknown)
    }
}

impl std::fmt::Debug for ContractRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractRegistry")
            .field("contracts", &self.contracts.len())
            .field("options", &self.options)
            .finish()
    }
}
