//! Contract and ABI data model.

use alloy::primitives::{keccak256, Address};
use serde::{Deserialize, Serialize};

/// A contract whose functions can be compiled into actions.
///
/// `id` is stable per stored contract; built-in entries use `-1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRef {
    pub id: i64,
    pub address: Address,
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form context appended to action descriptions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub function_list: Vec<AbiFunction>,
}

/// One entry of a JSON ABI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiFunction {
    #[serde(rename = "type", default = "default_entry_type")]
    pub entry_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub outputs: Vec<AbiParam>,
    #[serde(rename = "stateMutability", default)]
    pub state_mutability: StateMutability,
}

fn default_entry_type() -> String {
    // Solidity ABI entries without `type` are functions.
    "function".to_string()
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParam>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    #[default]
    Nonpayable,
    Payable,
}

impl AbiParam {
    /// The canonical type used in signatures, with tuples expanded.
    ///
    /// `tuple[]` with components `(address,uint256)` becomes `(address,uint256)[]`.
    pub fn canonical_type(&self) -> String {
        match self.kind.strip_prefix("tuple") {
            Some(suffix) => {
                let inner: Vec<String> =
                    self.components.iter().map(AbiParam::canonical_type).collect();
                format!("({}){}", inner.join(","), suffix)
            }
            None => self.kind.clone(),
        }
    }
}

impl AbiFunction {
    /// Whether this entry compiles into an action.
    pub fn is_callable(&self) -> bool {
        self.entry_type == "function" && !self.name.trim().is_empty()
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(AbiParam::canonical_type).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// 4-byte function selector.
    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Whether two entries declare the same inputs (names and types).
    pub fn same_inputs(&self, other: &AbiFunction) -> bool {
        self.inputs == other.inputs
    }
}
