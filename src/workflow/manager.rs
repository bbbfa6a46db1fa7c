//! Validator operations over the protocol contracts.
//!
//! Every state-changing operation builds a [`ContractCall`] and hands it to the
//! [`TransactionExecutor`]. Queries go straight to the ledger as view calls.

use alloy::primitives::{hex, Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;

use crate::blockchain::client::Ledger;
use crate::blockchain::transaction::TransactionExecutor;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ExecutionOutcome};
use crate::contracts::abi::{IIdentityRegistry, IStakeToken, IStakingValidator, IValidationRegistry};
use crate::contracts::events::{agent_id_from_receipt, request_hash_from_receipt};
use crate::contracts::views::{decode_return, encode_query};
use crate::contracts::{
    format_tokens, request_hash, tag_hash, ContractCall, GlobalStats, MetadataEntry,
    ValidationStatus, ValidatorRecord,
};

/// Highest accepted validation score.
pub const MAX_SCORE: u8 = 100;

/// High-level validator operations for a single signing account.
pub struct ValidationManager<L> {
    executor: TransactionExecutor<L>,
}

impl<L: Ledger> ValidationManager<L> {
    pub fn new(executor: TransactionExecutor<L>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &TransactionExecutor<L> {
        &self.executor
    }

    /// Address of the signing account.
    pub fn address(&self) -> Address {
        self.executor.address()
    }

    /// Approve the staking contract for `amount`, then stake it.
    ///
    /// When waiting, a reverted or unconfirmed approval stops the operation
    /// before the stake is submitted. Returns the stake transaction.
    pub async fn stake_tokens(
        &self,
        amount: U256,
        wait_for_receipt: bool,
        timeout_secs: u64,
    ) -> BlockchainResult<ExecutionOutcome> {
        let spender = self.executor.contracts().staking_validator;
        tracing::info!(amount = %format_tokens(amount), spender = %spender, "Staking tokens");

        let approve = ContractCall::Approve { spender, amount };
        let approved = self
            .executor
            .execute(&approve, wait_for_receipt, timeout_secs)
            .await?;
        tracing::debug!(tx_hash = %approved.tx_hash(), "Stake allowance submitted");

        self.executor
            .execute(&ContractCall::Stake { amount }, wait_for_receipt, timeout_secs)
            .await
    }

    /// Open a validation request for `agent_id`.
    ///
    /// The request hash is `keccak256(request_data)`. The validator defaults to
    /// the staking contract, which forwards results to the registry.
    pub async fn create_validation_request(
        &self,
        agent_id: U256,
        request_uri: &str,
        request_data: &str,
        validator: Option<Address>,
        wait_for_receipt: bool,
        timeout_secs: u64,
    ) -> BlockchainResult<(B256, ExecutionOutcome)> {
        let hash = request_hash(request_data);
        let validator = validator.unwrap_or(self.executor.contracts().staking_validator);
        tracing::info!(
            agent_id = %agent_id,
            request_hash = %hash,
            validator = %validator,
            "Creating validation request"
        );

        let call = ContractCall::CreateValidationRequest {
            validator,
            agent_id,
            request_uri: request_uri.to_string(),
            request_hash: hash,
        };
        let outcome = self
            .executor
            .execute(&call, wait_for_receipt, timeout_secs)
            .await?;

        if let Some(receipt) = &outcome.receipt {
            let registry = self.executor.contracts().validation_registry;
            match request_hash_from_receipt(receipt, registry) {
                Some(echoed) if echoed != hash => tracing::warn!(
                    expected = %hash,
                    echoed = %echoed,
                    "Registry echoed a different request hash"
                ),
                Some(_) => {}
                None => tracing::debug!(tx_hash = %receipt.tx_hash, "No ValidationRequest event in receipt"),
            }
        }

        Ok((hash, outcome))
    }

    /// Submit a validation result for `request_hash`.
    ///
    /// Scores above [`MAX_SCORE`] are rejected before any transaction is built.
    #[allow(clippy::too_many_arguments)]
    pub async fn submit_validation(
        &self,
        request_hash: B256,
        score: u8,
        response_uri: &str,
        response_data: &str,
        tag: &str,
        wait_for_receipt: bool,
        timeout_secs: u64,
    ) -> BlockchainResult<ExecutionOutcome> {
        if score > MAX_SCORE {
            return Err(BlockchainError::Validation(format!(
                "Score must be between 0 and {}, got {}",
                MAX_SCORE, score
            )));
        }
        tracing::info!(request_hash = %request_hash, score = score, "Submitting validation result");

        let call = ContractCall::SubmitValidationResult {
            request_hash,
            score,
            response_uri: response_uri.to_string(),
            response_hash: crate::contracts::request_hash(response_data),
            tag: tag_hash(tag),
        };
        self.executor
            .execute(&call, wait_for_receipt, timeout_secs)
            .await
    }

    /// Claim all pending rewards.
    pub async fn claim_rewards(
        &self,
        wait_for_receipt: bool,
        timeout_secs: u64,
    ) -> BlockchainResult<ExecutionOutcome> {
        tracing::info!(validator = %self.address(), "Claiming rewards");
        self.executor
            .execute(&ContractCall::ClaimRewards, wait_for_receipt, timeout_secs)
            .await
    }

    /// Register an agent identity.
    ///
    /// The agent ID comes from the registry's `Registered` event, so it is
    /// only known after confirmation. Without a receipt it is `None`.
    pub async fn register_agent(
        &self,
        token_uri: &str,
        metadata: Vec<MetadataEntry>,
        wait_for_receipt: bool,
        timeout_secs: u64,
    ) -> BlockchainResult<(Option<U256>, ExecutionOutcome)> {
        tracing::info!(token_uri = %token_uri, entries = metadata.len(), "Registering agent");

        let call = ContractCall::RegisterIdentity {
            token_uri: token_uri.to_string(),
            metadata,
        };
        let outcome = self
            .executor
            .execute(&call, wait_for_receipt, timeout_secs)
            .await?;

        let agent_id = match &outcome.receipt {
            Some(receipt) => {
                let id = agent_id_from_receipt(receipt, self.executor.contracts().identity_registry)?;
                tracing::info!(agent_id = %id, tx_hash = %outcome.tx_hash(), "Agent registered");
                Some(id)
            }
            None => None,
        };
        Ok((agent_id, outcome))
    }

    /// Mint stake tokens. Only the test-network token exposes this.
    pub async fn mint(
        &self,
        to: Address,
        amount: U256,
        wait_for_receipt: bool,
        timeout_secs: u64,
    ) -> BlockchainResult<ExecutionOutcome> {
        tracing::info!(to = %to, amount = %format_tokens(amount), "Minting stake tokens");
        self.executor
            .execute(&ContractCall::Mint { to, amount }, wait_for_receipt, timeout_secs)
            .await
    }

    // Queries

    async fn query<C: SolCall>(&self, to: Address, call: C) -> BlockchainResult<C::Return> {
        let data = self.executor.ledger().call(to, encode_query(&call)).await?;
        decode_return::<C>(&data)
    }

    /// Validator record for `validator`, defaulting to the signing account.
    pub async fn validator_info(&self, validator: Option<Address>) -> BlockchainResult<ValidatorRecord> {
        let validator = validator.unwrap_or(self.address());
        let ret = self
            .query(
                self.executor.contracts().staking_validator,
                IStakingValidator::getValidatorInfoCall { validator },
            )
            .await?;
        Ok(ret.into())
    }

    pub async fn staking_stats(&self) -> BlockchainResult<GlobalStats> {
        let ret = self
            .query(
                self.executor.contracts().staking_validator,
                IStakingValidator::getStatsCall {},
            )
            .await?;
        Ok(ret.into())
    }

    pub async fn validation_status(&self, request_hash: B256) -> BlockchainResult<ValidationStatus> {
        let ret = self
            .query(
                self.executor.contracts().validation_registry,
                IValidationRegistry::getValidationStatusCall {
                    requestHash: request_hash,
                },
            )
            .await?;
        Ok(ret.into())
    }

    /// Stake-token balance of `account`, defaulting to the signing account.
    pub async fn token_balance(&self, account: Option<Address>) -> BlockchainResult<U256> {
        let account = account.unwrap_or(self.address());
        self.query(
            self.executor.contracts().stake_token,
            IStakeToken::balanceOfCall { account },
        )
        .await
    }

    /// Native currency balance of `account`, defaulting to the signing account.
    pub async fn native_balance(&self, account: Option<Address>) -> BlockchainResult<U256> {
        self.executor
            .ledger()
            .balance(account.unwrap_or(self.address()))
            .await
    }

    pub async fn token_uri(&self, agent_id: U256) -> BlockchainResult<String> {
        self.query(
            self.executor.contracts().identity_registry,
            IIdentityRegistry::tokenURICall { tokenId: agent_id },
        )
        .await
    }

    /// Raw metadata value stored under `key`.
    pub async fn metadata(&self, agent_id: U256, key: &str) -> BlockchainResult<Bytes> {
        self.query(
            self.executor.contracts().identity_registry,
            IIdentityRegistry::getMetadataCall {
                agentId: agent_id,
                key: key.to_string(),
            },
        )
        .await
    }

    /// Metadata value as UTF-8, or `0x`-prefixed hex when it is not text.
    pub async fn metadata_decoded(&self, agent_id: U256, key: &str) -> BlockchainResult<String> {
        let value = self.metadata(agent_id, key).await?;
        Ok(decode_metadata(&value))
    }

    /// Check that the agent has a token URI and that every `(key, value)`
    /// pair matches its stored metadata. A failed query counts as a mismatch.
    pub async fn verify_agent(&self, agent_id: U256, expected: &[(&str, &str)]) -> bool {
        let mut verified = true;

        match self.token_uri(agent_id).await {
            Ok(uri) => tracing::debug!(agent_id = %agent_id, token_uri = %uri, "Agent token URI"),
            Err(e) => {
                tracing::warn!(agent_id = %agent_id, error = %e, "Token URI query failed");
                verified = false;
            }
        }

        for (key, value) in expected {
            match self.metadata_decoded(agent_id, key).await {
                Ok(actual) if actual == *value => {}
                Ok(actual) => {
                    tracing::warn!(
                        agent_id = %agent_id,
                        key = %key,
                        expected = %value,
                        actual = %actual,
                        "Agent metadata mismatch"
                    );
                    verified = false;
                }
                Err(e) => {
                    tracing::warn!(agent_id = %agent_id, key = %key, error = %e, "Metadata query failed");
                    verified = false;
                }
            }
        }
        verified
    }
}

fn decode_metadata(value: &[u8]) -> String {
    match std::str::from_utf8(value) {
        Ok(text) => text.to_string(),
        Err(_) => hex::encode_prefixed(value),
    }
}
