//! Shared utilities for integration testing.
//!
//! `SimulatedChain` is an in-memory ledger that decodes submitted transactions
//! and applies the contract semantics the harness relies on, so whole
//! workflows run without a node.

#![allow(dead_code)]

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, Bytes, Log, TxHash, B256, U256};
use alloy::sol_types::{SolCall, SolEvent, SolValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use validator_harness::blockchain::types::{BlockchainError, BlockchainResult, FeeParams, Receipt};
use validator_harness::blockchain::{Ledger, TransactionExecutor, Wallet};
use validator_harness::config::FeeConfig;
use validator_harness::contracts::abi::{
    IIdentityRegistry, IStakeToken, IStakingValidator, IValidationRegistry,
};
use validator_harness::contracts::{tokens_to_wei, ContractAddresses, ContractCall};
use validator_harness::workflow::ValidationManager;

pub const PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const CHAIN_ID: u64 = 31337;

/// Reward credited per accepted validation.
pub const REWARD_PER_VALIDATION: u64 = 10;
/// Minimum stake for an active validator.
pub const MIN_STAKE: u64 = 100;

pub fn contracts() -> ContractAddresses {
    ContractAddresses {
        validation_registry: Address::repeat_byte(0x11),
        staking_validator: Address::repeat_byte(0x22),
        stake_token: Address::repeat_byte(0x33),
        identity_registry: Address::repeat_byte(0x44),
    }
}

pub fn wallet() -> Wallet {
    Wallet::from_private_key(PRIVATE_KEY, CHAIN_ID).unwrap()
}

pub fn manager(chain: SimulatedChain) -> ValidationManager<SimulatedChain> {
    manager_with_fees(chain, FeeConfig::default())
}

pub fn manager_with_fees(chain: SimulatedChain, fees: FeeConfig) -> ValidationManager<SimulatedChain> {
    ValidationManager::new(TransactionExecutor::new(
        chain,
        wallet(),
        contracts(),
        fees,
        Duration::from_millis(5),
    ))
}

#[derive(Debug, Clone)]
struct Agent {
    owner: Address,
    token_uri: String,
    metadata: HashMap<String, Bytes>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Status {
    validator: Address,
    agent_id: U256,
    response: u8,
    response_hash: B256,
    tag: B256,
    last_update: U256,
}

#[derive(Default)]
struct World {
    block: u64,
    nonces: HashMap<Address, u64>,
    native: HashMap<Address, U256>,
    tokens: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    stakes: HashMap<Address, U256>,
    rewards: HashMap<Address, U256>,
    validations: HashMap<Address, U256>,
    total_staked: U256,
    total_rewards: U256,
    agents: Vec<Agent>,
    requests: HashMap<B256, (Address, U256)>,
    statuses: HashMap<B256, Status>,
    receipts: HashMap<TxHash, Receipt>,
    submitted: Vec<ContractCall>,
}

/// In-memory chain with the protocol contracts deployed. Clones share state.
#[derive(Clone)]
pub struct SimulatedChain {
    contracts: ContractAddresses,
    world: Arc<Mutex<World>>,
}

impl SimulatedChain {
    /// A chain where `account` holds 1 native coin and `tokens` stake tokens.
    pub fn funded(account: Address, tokens: u64) -> Self {
        let mut world = World {
            block: 1,
            ..World::default()
        };
        world.native.insert(account, tokens_to_wei(1));
        world.tokens.insert(account, tokens_to_wei(tokens));
        Self {
            contracts: contracts(),
            world: Arc::new(Mutex::new(world)),
        }
    }

    pub fn token_balance(&self, account: Address) -> U256 {
        self.world.lock().unwrap().tokens.get(&account).copied().unwrap_or_default()
    }

    pub fn stake_of(&self, account: Address) -> U256 {
        self.world.lock().unwrap().stakes.get(&account).copied().unwrap_or_default()
    }

    /// Calls submitted so far, in order.
    pub fn submitted(&self) -> Vec<ContractCall> {
        self.world.lock().unwrap().submitted.clone()
    }

    fn apply(&self, world: &mut World, from: Address, to: Address, call: &ContractCall) -> Result<Vec<Log>, String> {
        let c = &self.contracts;
        if call.target(c) != to {
            return Err(format!("{} sent to wrong contract {}", call.method(), to));
        }

        match call {
            ContractCall::Approve { spender, amount } => {
                world.allowances.insert((from, *spender), *amount);
                Ok(vec![])
            }
            ContractCall::Mint { to, amount } => {
                *world.tokens.entry(*to).or_default() += *amount;
                Ok(vec![])
            }
            ContractCall::Stake { amount } => {
                let allowance = world.allowances.get(&(from, c.staking_validator)).copied().unwrap_or_default();
                let balance = world.tokens.get(&from).copied().unwrap_or_default();
                if allowance < *amount {
                    return Err("insufficient allowance".into());
                }
                if balance < *amount {
                    return Err("insufficient token balance".into());
                }
                world.allowances.insert((from, c.staking_validator), allowance - *amount);
                world.tokens.insert(from, balance - *amount);
                *world.stakes.entry(from).or_default() += *amount;
                world.total_staked += *amount;
                Ok(vec![])
            }
            ContractCall::RegisterIdentity { token_uri, metadata } => {
                world.agents.push(Agent {
                    owner: from,
                    token_uri: token_uri.clone(),
                    metadata: metadata.iter().map(|e| (e.key.clone(), e.value.clone())).collect(),
                });
                let event = IIdentityRegistry::Registered {
                    agentId: U256::from(world.agents.len()),
                    tokenURI: token_uri.clone(),
                    owner: from,
                };
                Ok(vec![Log {
                    address: c.identity_registry,
                    data: event.encode_log_data(),
                }])
            }
            ContractCall::CreateValidationRequest {
                validator,
                agent_id,
                request_uri,
                request_hash,
            } => {
                if agent(world, *agent_id).is_none() {
                    return Err("unknown agent".into());
                }
                if world.requests.contains_key(request_hash) {
                    return Err("request exists".into());
                }
                world.requests.insert(*request_hash, (*validator, *agent_id));
                let event = IValidationRegistry::ValidationRequest {
                    validatorAddress: *validator,
                    agentId: *agent_id,
                    requestUri: request_uri.clone(),
                    requestHash: *request_hash,
                };
                Ok(vec![Log {
                    address: c.validation_registry,
                    data: event.encode_log_data(),
                }])
            }
            ContractCall::SubmitValidationResult {
                request_hash,
                score,
                response_hash,
                tag,
                ..
            } => {
                if world.stakes.get(&from).copied().unwrap_or_default() < tokens_to_wei(MIN_STAKE) {
                    return Err("validator not active".into());
                }
                if *score > 100 {
                    return Err("invalid response".into());
                }
                let (validator, agent_id) = *world.requests.get(request_hash).ok_or("unknown request")?;
                if validator != c.staking_validator {
                    return Err("request assigned to another validator".into());
                }
                if world.statuses.contains_key(request_hash) {
                    return Err("already validated".into());
                }
                world.statuses.insert(
                    *request_hash,
                    Status {
                        validator: c.staking_validator,
                        agent_id,
                        response: *score,
                        response_hash: *response_hash,
                        tag: *tag,
                        last_update: U256::from(world.block),
                    },
                );
                let reward = tokens_to_wei(REWARD_PER_VALIDATION);
                *world.rewards.entry(from).or_default() += reward;
                *world.validations.entry(from).or_default() += U256::from(1u64);
                world.total_rewards += reward;
                Ok(vec![])
            }
            ContractCall::ClaimRewards => {
                let pending = world.rewards.get(&from).copied().unwrap_or_default();
                if pending.is_zero() {
                    return Err("no rewards".into());
                }
                world.rewards.insert(from, U256::ZERO);
                *world.tokens.entry(from).or_default() += pending;
                Ok(vec![])
            }
        }
    }

    fn view(&self, world: &World, to: Address, data: &[u8]) -> BlockchainResult<Vec<u8>> {
        let c = &self.contracts;
        let revert = || BlockchainError::Rejected("execution reverted".into());
        let selector: [u8; 4] = data.get(..4).and_then(|s| s.try_into().ok()).ok_or_else(revert)?;
        let get = |map: &HashMap<Address, U256>, key: &Address| map.get(key).copied().unwrap_or_default();

        let encoded = match (to, selector) {
            (t, s) if t == c.stake_token && s == IStakeToken::balanceOfCall::SELECTOR => {
                let call = IStakeToken::balanceOfCall::abi_decode(data).map_err(|_| revert())?;
                (get(&world.tokens, &call.account),).abi_encode_params()
            }
            (t, s) if t == c.staking_validator && s == IStakingValidator::getValidatorInfoCall::SELECTOR => {
                let call = IStakingValidator::getValidatorInfoCall::abi_decode(data).map_err(|_| revert())?;
                let stake = get(&world.stakes, &call.validator);
                (
                    stake,
                    stake >= tokens_to_wei(MIN_STAKE),
                    get(&world.rewards, &call.validator),
                    get(&world.validations, &call.validator),
                )
                    .abi_encode_params()
            }
            (t, s) if t == c.staking_validator && s == IStakingValidator::getStatsCall::SELECTOR => {
                (world.total_staked, world.total_rewards, U256::ZERO).abi_encode_params()
            }
            (t, s) if t == c.validation_registry && s == IValidationRegistry::getValidationStatusCall::SELECTOR => {
                let call = IValidationRegistry::getValidationStatusCall::abi_decode(data).map_err(|_| revert())?;
                let status = world.statuses.get(&call.requestHash).copied().unwrap_or_default();
                (
                    status.validator,
                    status.agent_id,
                    U256::from(status.response),
                    status.response_hash,
                    status.tag,
                    status.last_update,
                )
                    .abi_encode_params()
            }
            (t, s) if t == c.identity_registry && s == IIdentityRegistry::tokenURICall::SELECTOR => {
                let call = IIdentityRegistry::tokenURICall::abi_decode(data).map_err(|_| revert())?;
                let agent = agent(world, call.tokenId).ok_or_else(revert)?;
                (agent.token_uri.clone(),).abi_encode_params()
            }
            (t, s) if t == c.identity_registry && s == IIdentityRegistry::getMetadataCall::SELECTOR => {
                let call = IIdentityRegistry::getMetadataCall::abi_decode(data).map_err(|_| revert())?;
                let agent = agent(world, call.agentId).ok_or_else(revert)?;
                (agent.metadata.get(&call.key).cloned().unwrap_or_default(),).abi_encode_params()
            }
            _ => return Err(revert()),
        };
        Ok(encoded)
    }
}

fn agent(world: &World, agent_id: U256) -> Option<&Agent> {
    let index: usize = agent_id.try_into().ok()?;
    index.checked_sub(1).and_then(|i| world.agents.get(i))
}

#[async_trait]
impl Ledger for SimulatedChain {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        Ok(CHAIN_ID)
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        Ok(self.world.lock().unwrap().block)
    }

    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        Ok(self.world.lock().unwrap().nonces.get(&address).copied().unwrap_or_default())
    }

    async fn fee_estimate(&self) -> BlockchainResult<FeeParams> {
        Ok(FeeParams {
            max_fee_per_gas: 10_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
        })
    }

    async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        Ok(self.world.lock().unwrap().native.get(&address).copied().unwrap_or_default())
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|e| BlockchainError::Rejected(format!("invalid transaction: {}", e)))?;
        let signed = envelope
            .as_eip1559()
            .ok_or_else(|| BlockchainError::Rejected("unsupported transaction type".into()))?;
        let from = signed
            .recover_signer()
            .map_err(|e| BlockchainError::Rejected(format!("invalid signature: {}", e)))?;
        if envelope.chain_id() != Some(CHAIN_ID) {
            return Err(BlockchainError::Rejected("invalid chain id".into()));
        }

        let mut world = self.world.lock().unwrap();
        let expected = world.nonces.get(&from).copied().unwrap_or_default();
        if envelope.nonce() != expected {
            return Err(BlockchainError::Rejected(format!(
                "nonce mismatch: expected {}, got {}",
                expected,
                envelope.nonce()
            )));
        }
        if world.native.get(&from).copied().unwrap_or_default().is_zero() {
            return Err(BlockchainError::from_rejection("insufficient funds for gas * price + value"));
        }

        let to = envelope.to().unwrap_or_default();
        let call = ContractCall::decode(envelope.input())
            .map_err(|e| BlockchainError::Rejected(e.to_string()))?;

        world.nonces.insert(from, expected + 1);
        world.block += 1;
        world.submitted.push(call.clone());

        let tx_hash = *envelope.tx_hash();
        let (success, logs) = match self.apply(&mut world, from, to, &call) {
            Ok(logs) => (true, logs),
            Err(_) => (false, vec![]),
        };
        let receipt = Receipt {
            tx_hash,
            success,
            block_number: Some(world.block),
            gas_used: 21_000,
            logs,
        };
        world.receipts.insert(tx_hash, receipt);
        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<Receipt>> {
        Ok(self.world.lock().unwrap().receipts.get(&tx_hash).cloned())
    }

    async fn call(&self, to: Address, data: Bytes) -> BlockchainResult<Bytes> {
        let world = self.world.lock().unwrap();
        self.view(&world, to, &data).map(Bytes::from)
    }
}
