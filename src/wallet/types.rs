//! Custodial wallet identity.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// A custodial wallet bound to one verified public address.
///
/// Serialized with the signing service's field names so the cached form and
/// the creation response are the same document.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletIdentity {
    #[serde(rename = "uuid")]
    pub wallet_id: String,
    pub access_key: String,
    #[serde(rename = "public_address")]
    pub wallet_address: Address,
}

impl std::fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletIdentity")
            .field("wallet_id", &self.wallet_id)
            .field("access_key", &"<redacted>")
            .field("wallet_address", &self.wallet_address)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_field_names() {
        let wallet: WalletIdentity = serde_json::from_value(serde_json::json!({
            "uuid": "w-1",
            "access_key": "secret",
            "public_address": "0x2222222222222222222222222222222222222222"
        }))
        .unwrap();
        assert_eq!(wallet.wallet_id, "w-1");

        let debug = format!("{wallet:?}");
        assert!(!debug.contains("secret"));
    }
}
