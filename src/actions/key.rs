//! Action keys: `"{contractId}_{functionName}_{overloadIndex}"`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Globally unique, deterministic name of a compiled action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionKey {
    pub contract_id: i64,
    pub function_name: String,
    /// Position of this `(name, inputs)` pair among same-named functions, in ABI order.
    pub overload_index: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed action key '{0}'")]
pub struct ActionKeyError(pub String);

impl ActionKey {
    pub fn new(contract_id: i64, function_name: impl Into<String>, overload_index: usize) -> Self {
        Self {
            contract_id,
            function_name: function_name.into(),
            overload_index,
        }
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.contract_id, self.function_name, self.overload_index
        )
    }
}

impl FromStr for ActionKey {
    type Err = ActionKeyError;

    /// The id ends at the first `_` and the index starts after the last one,
    /// so function names may themselves contain underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ActionKeyError(s.to_string());

        let (id, rest) = s.split_once('_').ok_or_else(malformed)?;
        let (name, index) = rest.rsplit_once('_').ok_or_else(malformed)?;
        if name.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            contract_id: id.parse().map_err(|_| malformed())?,
            function_name: name.to_string(),
            overload_index: index.parse().map_err(|_| malformed())?,
        })
    }
}

impl Serialize for ActionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ActionKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let key = ActionKey::new(3, "transfer", 0);
        assert_eq!(key.to_string(), "3_transfer_0");
        assert_eq!("3_transfer_0".parse::<ActionKey>().unwrap(), key);
    }

    #[test]
    fn test_parse_underscored_name_and_negative_id() {
        let key: ActionKey = "-1_set_fee_recipient_2".parse().unwrap();
        assert_eq!(key.contract_id, -1);
        assert_eq!(key.function_name, "set_fee_recipient");
        assert_eq!(key.overload_index, 2);
        assert_eq!(key.to_string(), "-1_set_fee_recipient_2");
    }

    #[test]
    fn test_parse_malformed() {
        for bad in ["", "transfer", "3_transfer", "x_transfer_0", "3__0", "3_transfer_x"] {
            assert!(bad.parse::<ActionKey>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_serde_as_string() {
        let key = ActionKey::new(7, "mint", 1);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"7_mint_1\"");
        let decoded: ActionKey = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, key);
    }
}
