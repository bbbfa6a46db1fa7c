//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics. All problems are
//! collected and returned together so an operator can fix them in one pass.

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::HarnessConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &HarnessConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = url::Url::parse(&config.ledger.rpc_url) {
        errors.push(ValidationError::new(
            "ledger.rpc_url",
            format!("invalid URL '{}': {}", config.ledger.rpc_url, e),
        ));
    }
    for (i, failover) in config.ledger.failover_urls.iter().enumerate() {
        if url::Url::parse(failover).is_err() {
            errors.push(ValidationError::new(
                &format!("ledger.failover_urls[{}]", i),
                format!("invalid URL '{}'", failover),
            ));
        }
    }
    if config.ledger.chain_id == 0 {
        errors.push(ValidationError::new("ledger.chain_id", "must be non-zero"));
    }
    if config.ledger.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("ledger.rpc_timeout_secs", "must be greater than 0"));
    }
    if config.ledger.poll_interval_ms == 0 {
        errors.push(ValidationError::new("ledger.poll_interval_ms", "must be greater than 0"));
    }

    let contracts = &config.contracts;
    for (field, value) in [
        ("contracts.validation_registry", &contracts.validation_registry),
        ("contracts.staking_validator", &contracts.staking_validator),
        ("contracts.stake_token", &contracts.stake_token),
        ("contracts.identity_registry", &contracts.identity_registry),
    ] {
        if value.is_empty() {
            errors.push(ValidationError::new(field, "is required"));
        } else if value.parse::<Address>().is_err() {
            errors.push(ValidationError::new(field, format!("invalid address '{}'", value)));
        }
    }

    if config.fees.max_fee_per_gas_gwei < config.fees.max_priority_fee_per_gas_gwei {
        errors.push(ValidationError::new(
            "fees.max_fee_per_gas_gwei",
            "must not be lower than max_priority_fee_per_gas_gwei",
        ));
    }

    let workflow = &config.workflow;
    if workflow.response_score > 100 {
        errors.push(ValidationError::new(
            "workflow.response_score",
            format!("must be between 0 and 100, got {}", workflow.response_score),
        ));
    }
    if workflow.stake_amount_tokens == 0 {
        errors.push(ValidationError::new("workflow.stake_amount_tokens", "must be greater than 0"));
    }
    if workflow.wait_for_receipt && workflow.receipt_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "workflow.receipt_timeout_secs",
            "must be greater than 0 when waiting for receipts",
        ));
    }
    if workflow.report_path.is_empty() {
        errors.push(ValidationError::new("workflow.report_path", "is required"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
