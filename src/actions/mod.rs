//! Action compilation.
//!
//! # Data Flow
//! ```text
//! ABI JSON (registry / config)
//!     → types.rs (ContractRef, AbiFunction)
//!     → compiler.rs (filter callables, overload indices, validate types)
//!     → schema.rs (argument schemas + validation)
//!     → action.rs (Action, ActionSet)
//! ```

pub mod action;
pub mod compiler;
pub mod key;
pub mod schema;
pub mod types;

pub use action::{Action, ActionDescriptor, ActionSet};
pub use compiler::{compile, parse_function_list, CompileError, CompileOptions};
pub use key::{ActionKey, ActionKeyError};
pub use schema::{ArgumentSchema, FieldSchema, SchemaField, TRANSACTION_VALUE_FIELD};
pub use types::{AbiFunction, AbiParam, ContractRef, StateMutability};
