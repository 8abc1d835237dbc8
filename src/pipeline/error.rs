//! Closed error taxonomy of the invocation pipeline.

use alloy::primitives::TxHash;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::chain::types::ChainError;
use crate::identity::IdentityError;
use crate::signer::types::SignerError;
use crate::wallet::resolver::WalletError;

/// Wire name of an error class, carried in failure envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NetworkError,
    SigningError,
    TransactionError,
    MissingIdentity,
    IdentityRejected,
    WalletNotFound,
    MissingEncryptionContext,
    InvalidArguments,
    UnknownAction,
    Unexpected,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NetworkError => "NetworkError",
            ErrorKind::SigningError => "SigningError",
            ErrorKind::TransactionError => "TransactionError",
            ErrorKind::MissingIdentity => "MissingIdentity",
            ErrorKind::IdentityRejected => "IdentityRejected",
            ErrorKind::WalletNotFound => "WalletNotFound",
            ErrorKind::MissingEncryptionContext => "MissingEncryptionContext",
            ErrorKind::InvalidArguments => "InvalidArguments",
            ErrorKind::UnknownAction => "UnknownAction",
            ErrorKind::Unexpected => "Unexpected",
        }
    }
}

/// Every way an invocation can fail.
///
/// All variants except `Unexpected` surface their message verbatim.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Upstream RPC/HTTP unreachable or answered with garbage.
    ///
    /// Carries the hash when a broadcast may have reached the node.
    #[error("{message}")]
    Network {
        message: String,
        context: Option<Value>,
        transaction_hash: Option<TxHash>,
    },

    /// The signing service rejected or could not complete signing.
    #[error("{message}")]
    Signing {
        message: String,
        context: Option<Value>,
    },

    /// Broadcast or inclusion failed.
    #[error("{message}")]
    Transaction {
        message: String,
        transaction_hash: Option<TxHash>,
        block_number: Option<u64>,
    },

    #[error("No identity token")]
    MissingIdentity,

    #[error("{0}")]
    IdentityRejected(String),

    #[error("Wallet not found and missing encryption context")]
    WalletNotFound,

    #[error("Missing encryption context")]
    MissingEncryptionContext,

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown action {0}")]
    UnknownAction(String),

    /// Internal detail; logged, never shown to callers.
    #[error("{0}")]
    Unexpected(String),
}

impl ActionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::Network { .. } => ErrorKind::NetworkError,
            ActionError::Signing { .. } => ErrorKind::SigningError,
            ActionError::Transaction { .. } => ErrorKind::TransactionError,
            ActionError::MissingIdentity => ErrorKind::MissingIdentity,
            ActionError::IdentityRejected(_) => ErrorKind::IdentityRejected,
            ActionError::WalletNotFound => ErrorKind::WalletNotFound,
            ActionError::MissingEncryptionContext => ErrorKind::MissingEncryptionContext,
            ActionError::InvalidArguments(_) => ErrorKind::InvalidArguments,
            ActionError::UnknownAction(_) => ErrorKind::UnknownAction,
            ActionError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        ActionError::Network {
            message: message.into(),
            context: None,
            transaction_hash: None,
        }
    }

    pub fn signing(message: impl Into<String>) -> Self {
        ActionError::Signing {
            message: message.into(),
            context: None,
        }
    }

    pub fn transaction(message: impl Into<String>, transaction_hash: Option<TxHash>) -> Self {
        ActionError::Transaction {
            message: message.into(),
            transaction_hash,
            block_number: None,
        }
    }

    /// A chain failure before anything was broadcast.
    pub fn from_chain(chain_id: u64, err: ChainError) -> Self {
        ActionError::Network {
            message: err.to_string(),
            context: Some(serde_json::json!({ "chainId": chain_id })),
            transaction_hash: None,
        }
    }

    /// A broadcast whose outcome is unknown: the node may hold `hash`.
    pub fn broadcast_unknown(chain_id: u64, err: ChainError, hash: TxHash) -> Self {
        ActionError::Network {
            message: err.to_string(),
            context: Some(serde_json::json!({ "chainId": chain_id })),
            transaction_hash: Some(hash),
        }
    }

    pub fn transaction_hash(&self) -> Option<TxHash> {
        match self {
            ActionError::Transaction {
                transaction_hash, ..
            }
            | ActionError::Network {
                transaction_hash, ..
            } => *transaction_hash,
            _ => None,
        }
    }

    pub fn block_number(&self) -> Option<u64> {
        match self {
            ActionError::Transaction { block_number, .. } => *block_number,
            _ => None,
        }
    }

    pub fn context(&self) -> Option<&Value> {
        match self {
            ActionError::Network { context, .. } | ActionError::Signing { context, .. } => {
                context.as_ref()
            }
            _ => None,
        }
    }
}

impl From<SignerError> for ActionError {
    fn from(err: SignerError) -> Self {
        let context = match &err {
            SignerError::Status { status, .. } => Some(serde_json::json!({ "status": status })),
            _ => None,
        };
        ActionError::Signing {
            message: format!("Signing error: {err}"),
            context,
        }
    }
}

impl From<WalletError> for ActionError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::NotFound => ActionError::WalletNotFound,
            WalletError::NoWalletGroups => ActionError::network(err.to_string()),
            WalletError::Signer(e) => ActionError::network(format!("Wallet service error: {e}")),
            WalletError::Cache(e) => ActionError::Unexpected(format!("wallet cache: {e}")),
        }
    }
}

impl From<IdentityError> for ActionError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Rejected(_) => ActionError::IdentityRejected(err.to_string()),
            IdentityError::Unavailable(_) => ActionError::network(err.to_string()),
        }
    }
}
