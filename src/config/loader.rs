//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::HarnessConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const RPC_URL_ENV_VAR: &str = "ERC8004_RPC_URL";
pub const VALIDATION_REGISTRY_ENV_VAR: &str = "ERC8004_VALIDATION_REGISTRY";
pub const STAKING_VALIDATOR_ENV_VAR: &str = "ERC8004_STAKING_VALIDATOR";
pub const STAKE_TOKEN_ENV_VAR: &str = "ERC8004_STAKE_TOKEN";
pub const IDENTITY_REGISTRY_ENV_VAR: &str = "ERC8004_IDENTITY_REGISTRY";
pub const CHAIN_ID_ENV_VAR: &str = "ERC8004_CHAIN_ID";
pub const DEFAULT_AGENT_ID_ENV_VAR: &str = "ERC8004_DEFAULT_AGENT_ID";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    /// An environment override could not be parsed.
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value for {}: '{}'", var, value)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a configuration from a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<HarnessConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load the configuration: optional TOML file, then environment overrides,
/// then validation.
pub fn load_config(path: Option<&Path>) -> Result<HarnessConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => HarnessConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay values from the environment onto `config`.
///
/// `lookup` resolves a variable name; empty values are treated as unset.
pub fn apply_env_overrides<F>(config: &mut HarnessConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(RPC_URL_ENV_VAR) {
        config.ledger.rpc_url = v;
    }
    if let Some(v) = get(VALIDATION_REGISTRY_ENV_VAR) {
        config.contracts.validation_registry = v;
    }
    if let Some(v) = get(STAKING_VALIDATOR_ENV_VAR) {
        config.contracts.staking_validator = v;
    }
    if let Some(v) = get(STAKE_TOKEN_ENV_VAR) {
        config.contracts.stake_token = v;
    }
    if let Some(v) = get(IDENTITY_REGISTRY_ENV_VAR) {
        config.contracts.identity_registry = v;
    }
    if let Some(v) = get(CHAIN_ID_ENV_VAR) {
        config.ledger.chain_id = v.trim().parse().map_err(|_| ConfigError::Env {
            var: CHAIN_ID_ENV_VAR,
            value: v.clone(),
        })?;
    }
    if let Some(v) = get(DEFAULT_AGENT_ID_ENV_VAR) {
        let id = v.trim().parse().map_err(|_| ConfigError::Env {
            var: DEFAULT_AGENT_ID_ENV_VAR,
            value: v.clone(),
        })?;
        config.workflow.default_agent_id = Some(id);
    }

    Ok(())
}
