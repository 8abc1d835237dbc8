//! The single response shape returned for every invocation.

use alloy::primitives::TxHash;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::error::{ActionError, ErrorKind};

/// Generic message replacing internal error details.
pub const UNEXPECTED_MESSAGE: &str = "Unexpected Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<TxHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub message: String,
    pub status: Status,
    pub payload: EnvelopePayload,
}

impl ResultEnvelope {
    pub fn success(transaction_hash: TxHash, block_number: Option<u64>) -> Self {
        Self {
            message: format!("Successfully added transaction {transaction_hash}"),
            status: Status::Success,
            payload: EnvelopePayload {
                transaction_hash: Some(transaction_hash),
                block_number,
                ..EnvelopePayload::default()
            },
        }
    }

    /// Failure envelope for `err`. Unexpected errors lose their detail.
    pub fn failure(err: &ActionError) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::Unexpected {
            return Self::unexpected();
        }
        Self {
            message: err.to_string(),
            status: Status::Failure,
            payload: EnvelopePayload {
                transaction_hash: err.transaction_hash(),
                block_number: err.block_number(),
                error_kind: Some(kind),
                context: err.context().cloned(),
            },
        }
    }

    pub fn unexpected() -> Self {
        Self {
            message: UNEXPECTED_MESSAGE.to_string(),
            status: Status::Failure,
            payload: EnvelopePayload {
                error_kind: Some(ErrorKind::Unexpected),
                ..EnvelopePayload::default()
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}
