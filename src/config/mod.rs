//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → startup builds the application context from it
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets are read from environment variables, never from the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, CacheConfig, ChainConfig, ContractConfig, FundingConfig, IdentityConfig,
    ListenerConfig, ObservabilityConfig, PipelineConfig, SignerConfig,
};
pub use validation::{validate_config, ValidationError};
