//! The seven-stage validator workflow.
//!
//! # Stages
//! ```text
//! environment → register agent → stake → create request
//!     → submit validation → claim rewards → statistics
//! ```
//!
//! Each stage records a [`StageRecord`]. A failure in any stage before
//! statistics ends the run; the report is returned either way.

use alloy::primitives::{B256, U256};
use chrono::Utc;
use rand::Rng;
use std::time::Duration;

use crate::blockchain::client::Ledger;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ExecutionOutcome};
use crate::config::WorkflowConfig;
use crate::contracts::{format_tokens, tokens_to_wei, MetadataEntry};
use crate::observability::metrics;
use crate::report::{RunReport, StageRecord, StageStatus};
use crate::workflow::manager::ValidationManager;

/// Metadata written at registration and checked during statistics.
pub const AGENT_METADATA: [(&str, &str); 3] = [
    ("agentType", "validator"),
    ("createdBy", "aliasai-validator"),
    ("version", "1.0"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Environment,
    RegisterAgent,
    Stake,
    CreateRequest,
    SubmitValidation,
    ClaimRewards,
    Statistics,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Environment,
        Stage::RegisterAgent,
        Stage::Stake,
        Stage::CreateRequest,
        Stage::SubmitValidation,
        Stage::ClaimRewards,
        Stage::Statistics,
    ];

    /// Report key of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Environment => "stage1_environment",
            Stage::RegisterAgent => "stage2_register_agent",
            Stage::Stake => "stage3_stake",
            Stage::CreateRequest => "stage4_create_request",
            Stage::SubmitValidation => "stage5_submit_validation",
            Stage::ClaimRewards => "stage6_claim_rewards",
            Stage::Statistics => "stage7_statistics",
        }
    }

    /// Whether a failure of this stage ends the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Stage::Statistics)
    }
}

/// Values produced by earlier stages.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub agent_id: Option<U256>,
    pub request_hash: Option<B256>,
}

/// Runs the workflow against one manager.
pub struct Pipeline<'a, L> {
    manager: &'a ValidationManager<L>,
    config: &'a WorkflowConfig,
    request_data: String,
}

impl<'a, L: Ledger> Pipeline<'a, L> {
    pub fn new(manager: &'a ValidationManager<L>, config: &'a WorkflowConfig) -> Self {
        Self {
            manager,
            config,
            request_data: unique_request_data(),
        }
    }

    /// Data hashed into this run's request hash.
    pub fn request_data(&self) -> &str {
        &self.request_data
    }

    /// Run all stages in order and return the report.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::new(&self.config.explorer_url);
        let mut state = PipelineState::default();

        tracing::info!(
            account = %self.manager.address(),
            stake_tokens = self.config.stake_amount_tokens,
            score = self.config.response_score,
            agent_id = ?self.config.default_agent_id,
            "Starting validation workflow"
        );

        for (index, stage) in Stage::ALL.iter().enumerate() {
            if index > 0 {
                self.pause().await;
            }

            let result = match stage {
                Stage::Environment => self.environment(&mut report).await,
                Stage::RegisterAgent => self.register_agent(&mut state, &mut report).await,
                Stage::Stake => self.stake(&mut report).await,
                Stage::CreateRequest => self.create_request(&mut state, &mut report).await,
                Stage::SubmitValidation => self.submit_validation(&state, &mut report).await,
                Stage::ClaimRewards => self.claim_rewards(&mut report).await,
                Stage::Statistics => self.statistics(&state).await,
            };

            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    tracing::error!(stage = stage.name(), error = %e, "Stage failed");
                    StageRecord::failed(&e.to_string())
                }
            };
            let status = record.status;
            metrics::record_stage(stage.name(), status.as_str());
            tracing::info!(stage = stage.name(), status = status.as_str(), "Stage finished");
            report.record_stage(stage.name(), record);

            if status == StageStatus::Failed && stage.is_fatal() {
                tracing::error!(stage = stage.name(), "Aborting workflow");
                break;
            }
        }

        report
    }

    async fn pause(&self) {
        if self.config.stage_delay_secs > 0 {
            tracing::debug!(secs = self.config.stage_delay_secs, "Waiting before next stage");
            tokio::time::sleep(Duration::from_secs(self.config.stage_delay_secs)).await;
        }
    }

    fn wait(&self) -> bool {
        self.config.wait_for_receipt
    }

    fn timeout(&self) -> u64 {
        self.config.receipt_timeout_secs
    }

    fn record_tx(&self, report: &mut RunReport, name: &str, outcome: &ExecutionOutcome) -> String {
        let link = report.add_transaction(name, outcome.tx_hash());
        tracing::info!(name = %name, tx_hash = %outcome.tx_hash(), explorer = %link, "Transaction recorded");
        link
    }

    async fn environment(&self, report: &mut RunReport) -> BlockchainResult<StageRecord> {
        let ledger = self.manager.executor().ledger();
        let expected = self.manager.executor().wallet().chain_id();
        let actual = ledger.chain_id().await?;
        if actual != expected {
            return Err(BlockchainError::ChainMismatch { expected, actual });
        }

        let account = self.manager.address();
        let native = self.manager.native_balance(None).await?;
        let fee_reserve = self.manager.executor().max_transaction_cost();
        if native < fee_reserve {
            return Err(BlockchainError::InsufficientFunds(format!(
                "account {} holds {} native, below the fee ceiling cost {}",
                account,
                format_tokens(native),
                format_tokens(fee_reserve)
            )));
        }

        let required = tokens_to_wei(self.config.stake_amount_tokens);
        let mut tokens = self.manager.token_balance(None).await?;
        let mut record = StageRecord::success();

        if tokens < required {
            if !self.config.mint_on_shortfall {
                return Err(BlockchainError::InsufficientFunds(format!(
                    "stake token balance {} is below the stake amount {}",
                    format_tokens(tokens),
                    format_tokens(required)
                )));
            }
            tracing::warn!(
                balance = %format_tokens(tokens),
                required = %format_tokens(required),
                "Stake token balance short, minting"
            );
            let minted = self
                .manager
                .mint(account, required, self.wait(), self.timeout())
                .await?;
            self.record_tx(report, "Mint", &minted);
            tokens = self.manager.token_balance(None).await?;
            record = record
                .with("minted", format_tokens(required))
                .with("mint_tx_hash", minted.tx_hash());
        }

        Ok(record
            .with("account", account)
            .with("chain_id", actual)
            .with("native_balance", format_tokens(native))
            .with("token_balance", format_tokens(tokens)))
    }

    async fn register_agent(
        &self,
        state: &mut PipelineState,
        report: &mut RunReport,
    ) -> BlockchainResult<StageRecord> {
        if let Some(agent_id) = self.config.default_agent_id {
            tracing::info!(agent_id = agent_id, "Using pre-configured agent");
            state.agent_id = Some(U256::from(agent_id));
            return Ok(StageRecord::skipped("Using pre-configured agent ID").with("agent_id", agent_id));
        }

        if !self.wait() {
            return Err(BlockchainError::Validation(
                "agent ID is only known from the registration receipt; \
                 wait for receipts or set default_agent_id"
                    .to_string(),
            ));
        }

        let owner = self.manager.address();
        let token_uri = format!("{}/agent/{}.json", self.base_uri(), owner);
        let metadata = AGENT_METADATA
            .iter()
            .map(|(key, value)| MetadataEntry::text(key, value))
            .collect();

        let (agent_id, outcome) = self
            .manager
            .register_agent(&token_uri, metadata, self.wait(), self.timeout())
            .await?;
        self.record_tx(report, "Register Agent", &outcome);
        let agent_id = agent_id.ok_or_else(|| {
            BlockchainError::Validation(format!(
                "registration {} confirmed without an agent ID",
                outcome.tx_hash()
            ))
        })?;
        state.agent_id = Some(agent_id);

        Ok(StageRecord::success()
            .with("agent_id", agent_id.to_string())
            .with("tx_hash", outcome.tx_hash())
            .with("token_uri", token_uri)
            .with("owner", owner))
    }

    async fn stake(&self, report: &mut RunReport) -> BlockchainResult<StageRecord> {
        let amount = tokens_to_wei(self.config.stake_amount_tokens);
        let outcome = self
            .manager
            .stake_tokens(amount, self.wait(), self.timeout())
            .await?;
        self.record_tx(report, "Stake", &outcome);

        let info = self.manager.validator_info(None).await?;
        Ok(StageRecord::success()
            .with("tx_hash", outcome.tx_hash())
            .with("staked_amount", format_tokens(info.staked_amount))
            .with("is_active", info.active))
    }

    async fn create_request(
        &self,
        state: &mut PipelineState,
        report: &mut RunReport,
    ) -> BlockchainResult<StageRecord> {
        let agent_id = required(state.agent_id, "agent ID")?;
        let request_uri = format!("{}/validation/{}/request", self.base_uri(), agent_id);

        let (request_hash, outcome) = self
            .manager
            .create_validation_request(
                agent_id,
                &request_uri,
                &self.request_data,
                None,
                self.wait(),
                self.timeout(),
            )
            .await?;
        self.record_tx(report, "Create Validation Request", &outcome);
        state.request_hash = Some(request_hash);

        Ok(StageRecord::success()
            .with("tx_hash", outcome.tx_hash())
            .with("request_hash", request_hash)
            .with("request_uri", request_uri)
            .with("agent_id", agent_id.to_string()))
    }

    async fn submit_validation(
        &self,
        state: &PipelineState,
        report: &mut RunReport,
    ) -> BlockchainResult<StageRecord> {
        let agent_id = required(state.agent_id, "agent ID")?;
        let request_hash = required(state.request_hash, "request hash")?;
        let score = self.config.response_score;
        let response_uri = format!("{}/validation/{}/response", self.base_uri(), agent_id);
        let response_data = format!("Validation result: {}/100", score);

        let before = self.manager.validator_info(None).await?;
        let outcome = self
            .manager
            .submit_validation(
                request_hash,
                score,
                &response_uri,
                &response_data,
                &self.config.tag,
                self.wait(),
                self.timeout(),
            )
            .await?;
        self.record_tx(report, "Submit Validation Result", &outcome);

        let after = self.manager.validator_info(None).await?;
        let status = self.manager.validation_status(request_hash).await?;
        tracing::info!(
            validator = %status.validator_address,
            agent_id = %status.agent_id,
            response = status.response,
            "Validation status"
        );

        Ok(StageRecord::success()
            .with("tx_hash", outcome.tx_hash())
            .with("response", score)
            .with(
                "reward_earned",
                format_tokens(after.pending_rewards.saturating_sub(before.pending_rewards)),
            )
            .with("validation_count", after.validation_count.to_string()))
    }

    async fn claim_rewards(&self, report: &mut RunReport) -> BlockchainResult<StageRecord> {
        let info = self.manager.validator_info(None).await?;
        if info.pending_rewards.is_zero() {
            tracing::warn!("No pending rewards to claim");
            return Ok(StageRecord::skipped("No pending rewards"));
        }

        let before = self.manager.token_balance(None).await?;
        let outcome = self
            .manager
            .claim_rewards(self.wait(), self.timeout())
            .await?;
        self.record_tx(report, "Claim Rewards", &outcome);
        let after = self.manager.token_balance(None).await?;

        Ok(StageRecord::success()
            .with("tx_hash", outcome.tx_hash())
            .with("pending_rewards", format_tokens(info.pending_rewards))
            .with("claimed_amount", format_tokens(after.saturating_sub(before)))
            .with("new_balance", format_tokens(after)))
    }

    async fn statistics(&self, state: &PipelineState) -> BlockchainResult<StageRecord> {
        let info = self.manager.validator_info(None).await?;
        let stats = self.manager.staking_stats().await?;

        let verification = match state.agent_id {
            Some(agent_id) => Some(self.manager.verify_agent(agent_id, &AGENT_METADATA).await),
            None => None,
        };

        Ok(StageRecord::success()
            .with(
                "validator_info",
                serde_json::json!({
                    "staked_amount": format_tokens(info.staked_amount),
                    "validation_count": info.validation_count.to_string(),
                    "pending_rewards": format_tokens(info.pending_rewards),
                    "is_active": info.active,
                }),
            )
            .with(
                "global_stats",
                serde_json::json!({
                    "total_staked": format_tokens(stats.total_staked),
                    "total_rewards": format_tokens(stats.total_rewards),
                    "total_slashed": format_tokens(stats.total_slashed),
                }),
            )
            .with("agent_verification", verification))
    }

    fn base_uri(&self) -> &str {
        self.config.metadata_base_uri.trim_end_matches('/')
    }
}

fn required<T>(value: Option<T>, what: &str) -> BlockchainResult<T> {
    value.ok_or_else(|| BlockchainError::Validation(format!("{} not available from earlier stages", what)))
}

/// Request data unique per run: timestamp plus a random nonce.
pub fn unique_request_data() -> String {
    let nonce: u32 = rand::thread_rng().gen_range(10_000..100_000);
    format!("Validation test at {} - nonce:{}", Utc::now().to_rfc3339(), nonce)
}
