//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the harness.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default Sepolia chain ID.
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;

/// Root configuration for a harness run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HarnessConfig {
    /// Ledger connection settings.
    pub ledger: LedgerConfig,

    /// Addresses of the protocol contracts.
    pub contracts: ContractsConfig,

    /// Gas limits and fee ceilings.
    pub fees: FeeConfig,

    /// Stage parameters for the validation workflow.
    pub workflow: WorkflowConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// JSON-RPC ledger connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, used for reads only.
    pub failover_urls: Vec<String>,

    /// Chain ID (must match the endpoint's network).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Interval between receipt polls in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: DEFAULT_CHAIN_ID,
            rpc_timeout_secs: 10,
            poll_interval_ms: 2000,
        }
    }
}

/// Protocol contract addresses as hex strings.
///
/// Parsed into [`ContractAddresses`](crate::contracts::ContractAddresses)
/// once the configuration has been validated.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContractsConfig {
    pub validation_registry: String,
    pub staking_validator: String,
    pub stake_token: String,
    pub identity_registry: String,
}

/// Fee ceiling and per-method gas limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Maximum total fee per gas in gwei.
    pub max_fee_per_gas_gwei: u64,

    /// Priority fee per gas in gwei.
    pub max_priority_fee_per_gas_gwei: u64,

    /// Gas limits per contract method.
    pub gas_limits: GasLimits,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            max_fee_per_gas_gwei: 50,
            max_priority_fee_per_gas_gwei: 2,
            gas_limits: GasLimits::default(),
        }
    }
}

/// Fixed gas limit for each state-changing method.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GasLimits {
    pub approve: u64,
    pub stake: u64,
    pub register_identity: u64,
    pub create_validation_request: u64,
    pub submit_validation_result: u64,
    pub claim_rewards: u64,
    pub mint: u64,
}

impl Default for GasLimits {
    fn default() -> Self {
        Self {
            approve: 100_000,
            stake: 300_000,
            register_identity: 500_000,
            create_validation_request: 500_000,
            submit_validation_result: 600_000,
            claim_rewards: 250_000,
            mint: 100_000,
        }
    }
}

impl GasLimits {
    /// Largest configured limit.
    pub fn max(&self) -> u64 {
        [
            self.approve,
            self.stake,
            self.register_identity,
            self.create_validation_request,
            self.submit_validation_result,
            self.claim_rewards,
            self.mint,
        ]
        .into_iter()
        .max()
        .unwrap_or_default()
    }
}

/// Parameters of the staged validation workflow.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Amount to stake, in whole tokens (18 decimals).
    pub stake_amount_tokens: u64,

    /// Score submitted for the validation request (0-100).
    pub response_score: u8,

    /// Pre-registered agent ID; registration is skipped when set.
    pub default_agent_id: Option<u64>,

    /// Whether state-changing calls wait for their receipt.
    pub wait_for_receipt: bool,

    /// Upper bound on receipt waiting in seconds.
    pub receipt_timeout_secs: u64,

    /// Pause between stages in seconds.
    pub stage_delay_secs: u64,

    /// Mint stake tokens when the balance is short. Test networks only.
    pub mint_on_shortfall: bool,

    /// Tag attached to submitted validation results.
    pub tag: String,

    /// Base URI for agent and validation documents.
    pub metadata_base_uri: String,

    /// Block explorer base URL used for transaction links.
    pub explorer_url: String,

    /// Path of the JSON run report.
    pub report_path: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            stake_amount_tokens: 100,
            response_score: 100,
            default_agent_id: None,
            wait_for_receipt: true,
            receipt_timeout_secs: 120,
            stage_delay_secs: 5,
            mint_on_shortfall: false,
            tag: "test".to_string(),
            metadata_base_uri: "https://api.aliasai.io".to_string(),
            explorer_url: "https://sepolia.etherscan.io".to_string(),
            report_path: "validation_test_report.json".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
