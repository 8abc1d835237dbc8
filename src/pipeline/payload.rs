//! Unsigned EIP-1559 transaction payload, as sent to the signing service.

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// EIP-1559 transaction type.
pub const EIP1559_TX_TYPE: u8 = 2;

/// Everything the signer needs to produce a raw transaction.
///
/// Built fresh per invocation; the nonce makes payloads single-use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTxPayload {
    #[serde(rename = "type")]
    pub tx_type: u8,
    pub to: Address,
    pub chain_id: u64,
    pub data: Bytes,
    /// Hex big integer, e.g. `"0x0"`.
    pub value: String,
    pub nonce: u64,
    pub gas: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Hex form used for `value`.
pub fn hex_quantity(value: U256) -> String {
    format!("{value:#x}")
}
