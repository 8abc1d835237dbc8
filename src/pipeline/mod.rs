//! Transaction pipeline.
//!
//! # Data Flow
//! ```text
//! InvocationRequest
//!     → executor.rs (identity, wallet, boundary)
//!     → builder.rs (args → calldata, nonce/fees/gas fan-out)
//!     → signer (remote signing)
//!     → broadcaster.rs (send raw tx, await inclusion)
//!     → envelope.rs (ResultEnvelope)
//! ```

pub mod broadcaster;
pub mod builder;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod payload;

pub use broadcaster::{Broadcaster, Submission};
pub use builder::{CallRequest, TransactionBuilder, DEFAULT_GAS_LIMIT};
pub use envelope::{EnvelopePayload, ResultEnvelope, Status, UNEXPECTED_MESSAGE};
pub use error::{ActionError, ErrorKind};
pub use executor::{ActionExecutor, InvocationContext, InvocationRequest};
pub use payload::UnsignedTxPayload;
