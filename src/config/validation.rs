//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (contracts and funding reference configured chains)
//! - Validate value ranges (timeouts > 0, addresses and URLs parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use alloy::primitives::{Address, U256};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    // wallet endpoint worst case: identity check, list groups, create wallet
    let wallet_route_secs = config.identity.timeout_secs + 2 * config.signer.timeout_secs;
    if config.listener.request_timeout_secs < wallet_route_secs {
        errors.push(ValidationError::new(
            "listener.request_timeout_secs",
            format!(
                "must be at least {wallet_route_secs} (identity.timeout_secs + 2 * signer.timeout_secs)"
            ),
        ));
    }

    if url::Url::parse(&config.signer.base_url).is_err() {
        errors.push(ValidationError::new(
            "signer.base_url",
            format!("'{}' is not a URL", config.signer.base_url),
        ));
    }
    if config.signer.timeout_secs == 0 {
        errors.push(ValidationError::new("signer.timeout_secs", "must be > 0"));
    }
    if config.signer.secret_header.trim().is_empty() {
        errors.push(ValidationError::new("signer.secret_header", "must not be empty"));
    }

    if url::Url::parse(&config.identity.verify_url).is_err() {
        errors.push(ValidationError::new(
            "identity.verify_url",
            format!("'{}' is not a URL", config.identity.verify_url),
        ));
    }
    if config.identity.timeout_secs == 0 {
        errors.push(ValidationError::new("identity.timeout_secs", "must be > 0"));
    }

    let mut chain_ids = HashSet::new();
    for (i, chain) in config.chains.iter().enumerate() {
        if !chain_ids.insert(chain.chain_id) {
            errors.push(ValidationError::new(
                format!("chains[{i}].chain_id"),
                format!("duplicate chain id {}", chain.chain_id),
            ));
        }
        if url::Url::parse(&chain.rpc_url).is_err() {
            errors.push(ValidationError::new(
                format!("chains[{i}].rpc_url"),
                format!("'{}' is not a URL", chain.rpc_url),
            ));
        }
        if chain.rpc_timeout_secs == 0 {
            errors.push(ValidationError::new(format!("chains[{i}].rpc_timeout_secs"), "must be > 0"));
        }
        if chain.confirmation_timeout_secs == 0 {
            errors.push(ValidationError::new(
                format!("chains[{i}].confirmation_timeout_secs"),
                "must be > 0",
            ));
        }
    }

    let mut contract_ids = HashSet::new();
    for (i, contract) in config.contracts.iter().enumerate() {
        if !contract_ids.insert(contract.id) {
            errors.push(ValidationError::new(
                format!("contracts[{i}].id"),
                format!("duplicate contract id {}", contract.id),
            ));
        }
        if Address::from_str(&contract.address).is_err() {
            errors.push(ValidationError::new(
                format!("contracts[{i}].address"),
                format!("'{}' is not an address", contract.address),
            ));
        }
        if !chain_ids.contains(&contract.chain_id) {
            errors.push(ValidationError::new(
                format!("contracts[{i}].chain_id"),
                format!("chain {} is not configured", contract.chain_id),
            ));
        }
        if contract.abi.is_some() == contract.abi_path.is_some() {
            errors.push(ValidationError::new(
                format!("contracts[{i}]"),
                "exactly one of `abi` or `abi_path` must be set",
            ));
        }
    }

    if config.funding.enabled {
        if Address::from_str(&config.funding.funder_public_address).is_err() {
            errors.push(ValidationError::new(
                "funding.funder_public_address",
                "must be an address when funding is enabled",
            ));
        }
        if U256::from_str(config.funding.amount_wei.trim()).is_err() {
            errors.push(ValidationError::new(
                "funding.amount_wei",
                format!("'{}' is not an integer amount", config.funding.amount_wei),
            ));
        }
        for chain_id in &config.funding.chain_ids {
            if !chain_ids.contains(chain_id) {
                errors.push(ValidationError::new(
                    "funding.chain_ids",
                    format!("chain {chain_id} is not configured"),
                ));
            }
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
