//! Namespaced key-value cache shared by every pipeline component.
//!
//! # Data Flow
//! ```text
//! KeyedCache<T> ("wallet", "contract", ...)
//!     → storage key "{prefix}:{key}"
//!     → store.rs (DashMap<String, serde_json::Value>)
//!     → optional JSON file on disk
//! ```
//!
//! Values never expire; they live until explicitly deleted. Concurrent
//! writers to the same key resolve last-writer-wins.

pub mod keyed;
pub mod store;

use thiserror::Error;

pub use keyed::KeyedCache;
pub use store::KvStore;

/// Errors raised by the cache layer.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A value could not be converted to or from JSON.
    #[error("cache serialization error for '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing the persistence file failed.
    #[error("cache persistence error: {0}")]
    Io(#[from] std::io::Error),

    /// The persistence file is not a JSON object.
    #[error("cache file is malformed: {0}")]
    Malformed(serde_json::Error),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
