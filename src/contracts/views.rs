//! Read-only contract queries and their decoded results.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;
use serde::Serialize;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::contracts::abi::{IStakingValidator, IValidationRegistry};

/// Validator state as reported by the staking contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidatorRecord {
    pub staked_amount: U256,
    pub active: bool,
    pub pending_rewards: U256,
    pub validation_count: U256,
}

impl From<IStakingValidator::getValidatorInfoReturn> for ValidatorRecord {
    fn from(r: IStakingValidator::getValidatorInfoReturn) -> Self {
        Self {
            staked_amount: r.stake,
            active: r.active,
            pending_rewards: r.rewards,
            validation_count: r.validations,
        }
    }
}

/// Protocol-wide staking totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlobalStats {
    pub total_staked: U256,
    pub total_rewards: U256,
    pub total_slashed: U256,
}

impl From<IStakingValidator::getStatsReturn> for GlobalStats {
    fn from(r: IStakingValidator::getStatsReturn) -> Self {
        Self {
            total_staked: r._totalStaked,
            total_rewards: r._totalRewards,
            total_slashed: r._totalSlashed,
        }
    }
}

/// Latest response recorded for a validation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationStatus {
    pub validator_address: Address,
    pub agent_id: U256,
    pub response: u8,
    pub response_hash: B256,
    pub tag: B256,
    pub last_update: U256,
}

impl From<IValidationRegistry::getValidationStatusReturn> for ValidationStatus {
    fn from(r: IValidationRegistry::getValidationStatusReturn) -> Self {
        Self {
            validator_address: r.validatorAddress,
            agent_id: r.agentId,
            response: r.response,
            response_hash: r.responseHash,
            tag: r.tag,
            last_update: r.lastUpdate,
        }
    }
}

/// ABI-encode a view call.
pub fn encode_query<C: SolCall>(call: &C) -> Bytes {
    call.abi_encode().into()
}

/// Decode the return data of a view call.
pub fn decode_return<C: SolCall>(data: &[u8]) -> BlockchainResult<C::Return> {
    C::abi_decode_returns(data).map_err(|e| {
        BlockchainError::Encoding(format!(
            "Failed to decode {} return data: {}",
            C::SIGNATURE,
            e
        ))
    })
}
