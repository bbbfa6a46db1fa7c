//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (ERC8004_*)
//!     → validation.rs (semantic checks)
//!     → HarnessConfig (validated, immutable)
//!     → passed by reference to the executor and workflow
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - The signing credential is never part of the config; see `blockchain::wallet`

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ContractsConfig, FeeConfig, GasLimits, HarnessConfig, LedgerConfig, ObservabilityConfig,
    WorkflowConfig,
};
