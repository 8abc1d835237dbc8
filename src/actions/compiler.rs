//! ABI → action compilation.

use alloy::dyn_abi::DynSolType;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::actions::action::Action;
use crate::actions::key::ActionKey;
use crate::actions::schema::{ArgumentSchema, SchemaField};
use crate::actions::types::{AbiFunction, ContractRef};

#[derive(Debug, Error)]
pub enum CompileError {
    /// The ABI text is not valid JSON or an entry has the wrong shape.
    #[error("malformed ABI: {0}")]
    MalformedAbi(String),

    /// An input type cannot be ABI-encoded.
    #[error("function '{function}' input '{param}' has unsupported type '{ty}': {reason}")]
    UnsupportedType {
        function: String,
        param: String,
        ty: String,
        reason: String,
    },

    /// Two entries declare the same signature.
    #[error("duplicate function signature '{0}'")]
    DuplicateFunction(String),
}

/// Options applied to every action of a compile pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Attach the optional `transactionValue` field to each schema.
    pub allow_transaction_value: bool,
}

/// Parse a JSON ABI as returned by block explorers.
///
/// Accepts either a bare array of entries or an artifact object with an `abi`
/// array. Anything else fails.
pub fn parse_function_list(abi_json: &str) -> Result<Vec<AbiFunction>, CompileError> {
    let value: Value =
        serde_json::from_str(abi_json).map_err(|e| CompileError::MalformedAbi(e.to_string()))?;

    let entries = match value {
        Value::Array(_) => value,
        Value::Object(mut obj) => match obj.remove("abi") {
            Some(abi @ Value::Array(_)) => abi,
            _ => {
                return Err(CompileError::MalformedAbi(
                    "expected a JSON array of ABI entries".to_string(),
                ))
            }
        },
        _ => {
            return Err(CompileError::MalformedAbi(
                "expected a JSON array of ABI entries".to_string(),
            ))
        }
    };

    serde_json::from_value(entries).map_err(|e| CompileError::MalformedAbi(e.to_string()))
}

/// Compile every callable function of `contract` into an action.
///
/// Constructors, fallbacks, receive functions and events are skipped. A
/// contract without callable functions yields an empty list.
pub fn compile(
    contract: &Arc<ContractRef>,
    options: &CompileOptions,
) -> Result<Vec<Action>, CompileError> {
    let callable: Vec<&AbiFunction> = contract
        .function_list
        .iter()
        .filter(|f| f.is_callable())
        .collect();

    let mut signatures = HashSet::new();
    let mut actions = Vec::with_capacity(callable.len());

    for (position, function) in callable.iter().enumerate() {
        let signature = function.signature();
        if !signatures.insert(signature.clone()) {
            return Err(CompileError::DuplicateFunction(signature));
        }

        for param in &function.inputs {
            let ty = param.canonical_type();
            DynSolType::parse(&ty).map_err(|e| CompileError::UnsupportedType {
                function: function.name.clone(),
                param: param.name.clone(),
                ty: ty.clone(),
                reason: e.to_string(),
            })?;
        }

        let overload_index = callable[..position]
            .iter()
            .filter(|earlier| earlier.name == function.name && !earlier.same_inputs(function))
            .count();

        let schema = ArgumentSchema {
            fields: function
                .inputs
                .iter()
                .enumerate()
                .map(|(i, p)| SchemaField::from_param(i, p))
                .collect(),
            transaction_value: options.allow_transaction_value,
        };

        actions.push(Action {
            key: ActionKey::new(contract.id, function.name.clone(), overload_index),
            description: describe(contract, function),
            contract: Arc::clone(contract),
            function: (*function).clone(),
            schema,
        });
    }

    tracing::debug!(
        contract_id = contract.id,
        address = %contract.address,
        actions = actions.len(),
        "Compiled contract actions"
    );

    Ok(actions)
}

fn describe(contract: &ContractRef, function: &AbiFunction) -> String {
    let inputs: Vec<String> = function
        .inputs
        .iter()
        .map(|p| format!("\"{}\" of type {}", p.name, p.kind))
        .collect();

    let mut description = format!(
        "This is a function called {}. It belongs to the contract with the address {} and the name {}. It takes {} inputs as arguments consisting of {}",
        function.name,
        contract.address,
        contract.name.as_deref().unwrap_or("unknown"),
        function.inputs.len(),
        inputs.join(", ")
    );
    if let Some(context) = contract.context.as_deref().filter(|c| !c.trim().is_empty()) {
        description.push_str(". Extra context: ");
        description.push_str(context);
    }
    description
}
