//! Typed state-changing contract calls and their call-data codec.

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::{ContractsConfig, GasLimits};
use crate::contracts::abi::{IIdentityRegistry, IStakeToken, IStakingValidator, IValidationRegistry};

/// Parsed addresses of the four protocol contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub validation_registry: Address,
    pub staking_validator: Address,
    pub stake_token: Address,
    pub identity_registry: Address,
}

impl ContractAddresses {
    pub fn from_config(config: &ContractsConfig) -> BlockchainResult<Self> {
        let parse = |name: &str, value: &str| -> BlockchainResult<Address> {
            value.parse().map_err(|e| {
                BlockchainError::Configuration(format!("Invalid {} address '{}': {}", name, value, e))
            })
        };

        Ok(Self {
            validation_registry: parse("validation registry", &config.validation_registry)?,
            staking_validator: parse("staking validator", &config.staking_validator)?,
            stake_token: parse("stake token", &config.stake_token)?,
            identity_registry: parse("identity registry", &config.identity_registry)?,
        })
    }
}

/// The fixed set of state-changing entry points the harness invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Approve,
    Stake,
    RegisterIdentity,
    CreateValidationRequest,
    SubmitValidationResult,
    ClaimRewards,
    Mint,
}

impl Method {
    /// Solidity function name.
    pub fn solidity_name(&self) -> &'static str {
        match self {
            Method::Approve => "approve",
            Method::Stake => "stake",
            Method::RegisterIdentity => "register",
            Method::CreateValidationRequest => "validationRequest",
            Method::SubmitValidationResult => "submitValidation",
            Method::ClaimRewards => "claimRewards",
            Method::Mint => "mint",
        }
    }

    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Approve => "approve",
            Method::Stake => "stake",
            Method::RegisterIdentity => "register_identity",
            Method::CreateValidationRequest => "create_validation_request",
            Method::SubmitValidationResult => "submit_validation_result",
            Method::ClaimRewards => "claim_rewards",
            Method::Mint => "mint",
        }
    }

    /// Configured gas limit for this method.
    pub fn gas_limit(&self, limits: &GasLimits) -> u64 {
        match self {
            Method::Approve => limits.approve,
            Method::Stake => limits.stake,
            Method::RegisterIdentity => limits.register_identity,
            Method::CreateValidationRequest => limits.create_validation_request,
            Method::SubmitValidationResult => limits.submit_validation_result,
            Method::ClaimRewards => limits.claim_rewards,
            Method::Mint => limits.mint,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An on-chain metadata entry attached to a registered agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataEntry {
    pub key: String,
    pub value: Bytes,
}

impl MetadataEntry {
    /// Entry whose value is the UTF-8 encoding of `value`.
    pub fn text(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: Bytes::copy_from_slice(value.as_bytes()),
        }
    }
}

/// A state-changing call with its typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    Approve {
        spender: Address,
        amount: U256,
    },
    Stake {
        amount: U256,
    },
    RegisterIdentity {
        token_uri: String,
        metadata: Vec<MetadataEntry>,
    },
    CreateValidationRequest {
        validator: Address,
        agent_id: U256,
        request_uri: String,
        request_hash: B256,
    },
    SubmitValidationResult {
        request_hash: B256,
        score: u8,
        response_uri: String,
        response_hash: B256,
        tag: B256,
    },
    ClaimRewards,
    Mint {
        to: Address,
        amount: U256,
    },
}

impl ContractCall {
    pub fn method(&self) -> Method {
        match self {
            ContractCall::Approve { .. } => Method::Approve,
            ContractCall::Stake { .. } => Method::Stake,
            ContractCall::RegisterIdentity { .. } => Method::RegisterIdentity,
            ContractCall::CreateValidationRequest { .. } => Method::CreateValidationRequest,
            ContractCall::SubmitValidationResult { .. } => Method::SubmitValidationResult,
            ContractCall::ClaimRewards => Method::ClaimRewards,
            ContractCall::Mint { .. } => Method::Mint,
        }
    }

    /// Contract that receives this call.
    pub fn target(&self, addresses: &ContractAddresses) -> Address {
        match self.method() {
            Method::Approve | Method::Mint => addresses.stake_token,
            Method::Stake | Method::SubmitValidationResult | Method::ClaimRewards => {
                addresses.staking_validator
            }
            Method::RegisterIdentity => addresses.identity_registry,
            Method::CreateValidationRequest => addresses.validation_registry,
        }
    }

    /// ABI-encode the call, selector included.
    pub fn encode(&self) -> Bytes {
        let data = match self {
            ContractCall::Approve { spender, amount } => IStakeToken::approveCall {
                spender: *spender,
                amount: *amount,
            }
            .abi_encode(),
            ContractCall::Stake { amount } => {
                IStakingValidator::stakeCall { amount: *amount }.abi_encode()
            }
            ContractCall::RegisterIdentity { token_uri, metadata } => {
                IIdentityRegistry::registerCall {
                    tokenURI: token_uri.clone(),
                    metadata: metadata
                        .iter()
                        .map(|entry| IIdentityRegistry::MetadataEntry {
                            key: entry.key.clone(),
                            value: entry.value.clone(),
                        })
                        .collect(),
                }
                .abi_encode()
            }
            ContractCall::CreateValidationRequest {
                validator,
                agent_id,
                request_uri,
                request_hash,
            } => IValidationRegistry::validationRequestCall {
                validatorAddress: *validator,
                agentId: *agent_id,
                requestUri: request_uri.clone(),
                requestHash: *request_hash,
            }
            .abi_encode(),
            ContractCall::SubmitValidationResult {
                request_hash,
                score,
                response_uri,
                response_hash,
                tag,
            } => IStakingValidator::submitValidationCall {
                requestHash: *request_hash,
                response: *score,
                responseUri: response_uri.clone(),
                responseHash: *response_hash,
                tag: *tag,
            }
            .abi_encode(),
            ContractCall::ClaimRewards => IStakingValidator::claimRewardsCall {}.abi_encode(),
            ContractCall::Mint { to, amount } => IStakeToken::mintCall {
                to: *to,
                amount: *amount,
            }
            .abi_encode(),
        };
        data.into()
    }

    /// Decode call data produced by [`ContractCall::encode`].
    pub fn decode(data: &[u8]) -> BlockchainResult<Self> {
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| BlockchainError::Encoding("call data shorter than a selector".into()))?;

        let call = match selector {
            s if s == IStakeToken::approveCall::SELECTOR => {
                let c = IStakeToken::approveCall::abi_decode(data).map_err(encoding)?;
                ContractCall::Approve {
                    spender: c.spender,
                    amount: c.amount,
                }
            }
            s if s == IStakingValidator::stakeCall::SELECTOR => {
                let c = IStakingValidator::stakeCall::abi_decode(data).map_err(encoding)?;
                ContractCall::Stake { amount: c.amount }
            }
            s if s == IIdentityRegistry::registerCall::SELECTOR => {
                let c = IIdentityRegistry::registerCall::abi_decode(data).map_err(encoding)?;
                ContractCall::RegisterIdentity {
                    token_uri: c.tokenURI,
                    metadata: c
                        .metadata
                        .into_iter()
                        .map(|entry| MetadataEntry {
                            key: entry.key,
                            value: entry.value,
                        })
                        .collect(),
                }
            }
            s if s == IValidationRegistry::validationRequestCall::SELECTOR => {
                let c = IValidationRegistry::validationRequestCall::abi_decode(data)
                    .map_err(encoding)?;
                ContractCall::CreateValidationRequest {
                    validator: c.validatorAddress,
                    agent_id: c.agentId,
                    request_uri: c.requestUri,
                    request_hash: c.requestHash,
                }
            }
            s if s == IStakingValidator::submitValidationCall::SELECTOR => {
                let c = IStakingValidator::submitValidationCall::abi_decode(data)
                    .map_err(encoding)?;
                ContractCall::SubmitValidationResult {
                    request_hash: c.requestHash,
                    score: c.response,
                    response_uri: c.responseUri,
                    response_hash: c.responseHash,
                    tag: c.tag,
                }
            }
            s if s == IStakingValidator::claimRewardsCall::SELECTOR => {
                IStakingValidator::claimRewardsCall::abi_decode(data).map_err(encoding)?;
                ContractCall::ClaimRewards
            }
            s if s == IStakeToken::mintCall::SELECTOR => {
                let c = IStakeToken::mintCall::abi_decode(data).map_err(encoding)?;
                ContractCall::Mint {
                    to: c.to,
                    amount: c.amount,
                }
            }
            other => {
                return Err(BlockchainError::Encoding(format!(
                    "unknown selector 0x{}",
                    alloy::primitives::hex::encode(other)
                )))
            }
        };
        Ok(call)
    }
}

fn encoding(e: alloy::sol_types::Error) -> BlockchainError {
    BlockchainError::Encoding(e.to_string())
}

/// Request handle: keccak256 of the UTF-8 request data.
pub fn request_hash(request_data: &str) -> B256 {
    keccak256(request_data.as_bytes())
}

/// Tag as submitted on-chain: keccak256 of the tag, or zero when empty.
pub fn tag_hash(tag: &str) -> B256 {
    if tag.is_empty() {
        B256::ZERO
    } else {
        keccak256(tag.as_bytes())
    }
}
