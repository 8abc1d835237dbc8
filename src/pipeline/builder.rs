//! Unsigned transaction construction.
//!
//! # Responsibilities
//! - Reorder named arguments into ABI declaration order
//! - Encode calldata (selector ‖ ABI-encoded parameters)
//! - Fetch nonce and fee data and estimate gas concurrently
//! - Fall back to a fixed gas limit when estimation fails

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::network::TransactionBuilder as _;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;

use crate::actions::schema::{ArgumentSchema, TRANSACTION_VALUE_FIELD};
use crate::actions::types::AbiFunction;
use crate::actions::Action;
use crate::chain::ChainRegistry;
use crate::observability::metrics;
use crate::pipeline::error::ActionError;
use crate::pipeline::payload::{hex_quantity, UnsignedTxPayload, EIP1559_TX_TYPE};
use crate::wallet::types::WalletIdentity;

/// Gas limit used when `eth_estimateGas` fails.
pub const DEFAULT_GAS_LIMIT: u64 = 100_000;

/// A fully encoded call, ready for nonce/fee/gas lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// Sending custodial wallet.
    pub from: Address,
    /// Contract address.
    pub to: Address,
    pub chain_id: u64,
    /// Selector followed by the ABI-encoded arguments.
    pub data: Bytes,
    /// Wei attached to the call.
    pub value: U256,
}

/// Turns actions and arguments into unsigned EIP-1559 payloads.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    /// Nodes queried for nonce, fees and gas.
    chains: Arc<ChainRegistry>,
    /// Gas limit used when estimation fails.
    default_gas_limit: u64,
}

impl TransactionBuilder {
    /// Create a new builder.
    ///
    /// # Arguments
    /// * `chains` - Chain nodes keyed by chain id
    /// * `default_gas_limit` - Fallback when `eth_estimateGas` fails
    pub fn new(chains: Arc<ChainRegistry>, default_gas_limit: u64) -> Self {
        Self {
            chains,
            default_gas_limit,
        }
    }

    /// Build the unsigned payload for invoking `action` from `wallet`.
    pub async fn build(
        &self,
        action: &Action,
        args: &Map<String, Value>,
        wallet: &WalletIdentity,
        chain_id: u64,
    ) -> Result<UnsignedTxPayload, ActionError> {
        if chain_id != action.contract.chain_id {
            return Err(ActionError::InvalidArguments(format!(
                "action {} is deployed on chain {}, not {}",
                action.key, action.contract.chain_id, chain_id
            )));
        }

        let data = encode_call(&action.function, &action.schema, args)
            .map_err(ActionError::InvalidArguments)?;
        let value = parse_transaction_value(args.get(TRANSACTION_VALUE_FIELD))
            .map_err(ActionError::InvalidArguments)?;

        self.build_payload(CallRequest {
            from: wallet.wallet_address,
            to: action.contract.address,
            chain_id,
            data,
            value,
        })
        .await
    }

    /// Fetch nonce, fee data and a gas estimate for `call` concurrently.
    pub async fn build_payload(&self, call: CallRequest) -> Result<UnsignedTxPayload, ActionError> {
        let node = self
            .chains
            .get(call.chain_id)
            .map_err(|e| ActionError::from_chain(call.chain_id, e))?;

        let request = TransactionRequest::default()
            .with_from(call.from)
            .with_to(call.to)
            .with_input(call.data.clone())
            .with_value(call.value);

        let (nonce, fees, gas) = tokio::join!(
            node.transaction_count(call.from),
            node.fee_data(),
            node.estimate_gas(request),
        );

        let nonce = nonce.map_err(|e| ActionError::from_chain(call.chain_id, e))?;
        let fees = fees.map_err(|e| ActionError::from_chain(call.chain_id, e))?;
        let gas = match gas {
            Ok(gas) => gas,
            Err(e) => {
                tracing::warn!(
                    chain_id = call.chain_id,
                    to = %call.to,
                    error = %e,
                    fallback = self.default_gas_limit,
                    "Gas estimation failed, using default limit"
                );
                metrics::record_gas_fallback(call.chain_id);
                self.default_gas_limit
            }
        };

        tracing::debug!(
            chain_id = call.chain_id,
            wallet = %call.from,
            nonce,
            gas,
            max_fee_per_gas = fees.max_fee_per_gas,
            "Transaction payload built"
        );

        Ok(UnsignedTxPayload {
            tx_type: EIP1559_TX_TYPE,
            to: call.to,
            chain_id: call.chain_id,
            data: call.data,
            value: hex_quantity(call.value),
            nonce,
            gas,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        })
    }
}

/// Validate `args` against `schema` and encode the call to `function`.
pub fn encode_call(
    function: &AbiFunction,
    schema: &ArgumentSchema,
    args: &Map<String, Value>,
) -> Result<Bytes, String> {
    let ordered = schema.order_arguments(args)?;

    let mut values = Vec::with_capacity(ordered.len());
    for ((param, field), value) in function.inputs.iter().zip(&schema.fields).zip(ordered) {
        let ty = DynSolType::parse(&param.canonical_type())
            .map_err(|e| format!("argument `{}`: {e}", field.name))?;
        let value =
            json_to_sol_value(&ty, value).map_err(|e| format!("argument `{}`: {e}", field.name))?;
        values.push(value);
    }

    let mut data = function.selector().to_vec();
    data.extend(DynSolValue::Tuple(values).abi_encode_params());
    Ok(Bytes::from(data))
}

/// Convert a JSON argument into a Solidity value of type `ty`.
///
/// Scalars are coerced from their string form; arrays and tuples take JSON arrays.
pub fn json_to_sol_value(ty: &DynSolType, value: &Value) -> Result<DynSolValue, String> {
    match (ty, value) {
        (DynSolType::Array(inner), Value::Array(items)) => items
            .iter()
            .map(|item| json_to_sol_value(inner, item))
            .collect::<Result<Vec<_>, _>>()
            .map(DynSolValue::Array),
        (DynSolType::FixedArray(inner, len), Value::Array(items)) => {
            if items.len() != *len {
                return Err(format!("expected {len} elements, got {}", items.len()));
            }
            items
                .iter()
                .map(|item| json_to_sol_value(inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::FixedArray)
        }
        (DynSolType::Tuple(types), Value::Array(items)) => {
            if items.len() != types.len() {
                return Err(format!(
                    "expected a tuple of {} elements, got {}",
                    types.len(),
                    items.len()
                ));
            }
            types
                .iter()
                .zip(items)
                .map(|(t, item)| json_to_sol_value(t, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Tuple)
        }
        (DynSolType::Bool, Value::Bool(b)) => Ok(DynSolValue::Bool(*b)),
        (_, Value::String(s)) => ty.coerce_str(s.trim()).map_err(|e| e.to_string()),
        (_, Value::Number(n)) => ty.coerce_str(&n.to_string()).map_err(|e| e.to_string()),
        (_, other) => Err(format!("cannot encode {other} as {ty}")),
    }
}

/// Parse the optional `transactionValue` argument (wei). Absent means zero.
pub fn parse_transaction_value(value: Option<&Value>) -> Result<U256, String> {
    let invalid = || format!("`{TRANSACTION_VALUE_FIELD}` must be a non-negative integer amount of wei");
    match value {
        None | Some(Value::Null) => Ok(U256::ZERO),
        Some(Value::Number(n)) => n.as_u64().map(U256::from).ok_or_else(invalid),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.starts_with('-') {
                return Err(invalid());
            }
            U256::from_str(s).map_err(|_| invalid())
        }
        Some(_) => Err(invalid()),
    }
}
