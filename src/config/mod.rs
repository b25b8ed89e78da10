//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → StubConfig (validated, immutable)
//!     → routing::RouteTable::from_config (built once, shared via Arc)
//!
//! command line
//!     → RuntimeConfig (timeouts, limits, observability)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The config file's directory is passed explicitly, never stored globally

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{config_dir, load_config, parse_config, ConfigError};
pub use schema::{
    EndpointConfig, KeyValue, LimitsConfig, ObservabilityConfig, ResponseConfig, RuntimeConfig,
    StubConfig, TimeoutConfig, ValidationConfig,
};
pub use validation::ValidationError;
