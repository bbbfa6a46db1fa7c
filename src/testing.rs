//! In-memory ledger double for unit tests.

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::blockchain::client::Ledger;
use crate::blockchain::types::{BlockchainError, BlockchainResult, FeeParams, Receipt};
use crate::blockchain::wallet::Wallet;
use crate::contracts::ContractAddresses;

pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_CHAIN_ID: u64 = 31337;

pub fn test_wallet() -> Wallet {
    Wallet::from_private_key(TEST_PRIVATE_KEY, TEST_CHAIN_ID).expect("test wallet")
}

pub fn test_contracts() -> ContractAddresses {
    ContractAddresses {
        validation_registry: Address::repeat_byte(0x01),
        staking_validator: Address::repeat_byte(0x02),
        stake_token: Address::repeat_byte(0x03),
        identity_registry: Address::repeat_byte(0x04),
    }
}

/// A transaction as seen by the ledger, decoded from its raw envelope.
#[derive(Debug, Clone)]
pub struct RecordedTx {
    pub tx_hash: TxHash,
    pub nonce: u64,
    pub to: Address,
    pub gas_limit: u64,
    pub chain_id: u64,
    pub input: Bytes,
}

#[derive(Default)]
struct State {
    nonce: u64,
    pending_polls: u32,
    revert: bool,
    never_mined: bool,
    reject: Option<String>,
    offline: bool,
    native_balance: U256,
    submissions: Vec<RecordedTx>,
    receipt_polls: u32,
    /// View call responses keyed by (contract, selector).
    call_responses: HashMap<(Address, [u8; 4]), Bytes>,
    receipt_logs: Vec<alloy::primitives::Log>,
}

/// Configurable ledger double. Clones share state.
#[derive(Clone, Default)]
pub struct MockLedger {
    state: Arc<Mutex<State>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn with_nonce(self, nonce: u64) -> Self {
        self.update(|s| s.nonce = nonce)
    }

    /// Report the receipt as missing for the first `polls` lookups.
    pub fn with_pending_polls(self, polls: u32) -> Self {
        self.update(|s| s.pending_polls = polls)
    }

    pub fn with_revert(self, revert: bool) -> Self {
        self.update(|s| s.revert = revert)
    }

    pub fn never_mined(self) -> Self {
        self.update(|s| s.never_mined = true)
    }

    pub fn reject_with(self, message: &str) -> Self {
        self.update(|s| s.reject = Some(message.to_string()))
    }

    pub fn offline(self) -> Self {
        self.update(|s| s.offline = true)
    }

    pub fn with_native_balance(self, balance: U256) -> Self {
        self.update(|s| s.native_balance = balance)
    }

    pub fn with_call_response(self, contract: Address, selector: [u8; 4], data: Vec<u8>) -> Self {
        self.update(|s| {
            s.call_responses.insert((contract, selector), data.into());
        })
    }

    /// Logs attached to every receipt.
    pub fn with_receipt_logs(self, logs: Vec<alloy::primitives::Log>) -> Self {
        self.update(|s| s.receipt_logs = logs)
    }

    pub fn submissions(&self) -> Vec<RecordedTx> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn receipt_polls(&self) -> u32 {
        self.state.lock().unwrap().receipt_polls
    }

    fn check_online(&self) -> BlockchainResult<()> {
        if self.state.lock().unwrap().offline {
            return Err(BlockchainError::Connection("All RPC providers failed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        self.check_online()?;
        Ok(TEST_CHAIN_ID)
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.check_online()?;
        Ok(100)
    }

    async fn transaction_count(&self, _address: Address) -> BlockchainResult<u64> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().nonce)
    }

    async fn fee_estimate(&self) -> BlockchainResult<FeeParams> {
        self.check_online()?;
        Ok(FeeParams {
            max_fee_per_gas: 20_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
        })
    }

    async fn balance(&self, _address: Address) -> BlockchainResult<U256> {
        self.check_online()?;
        Ok(self.state.lock().unwrap().native_balance)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.reject {
            return Err(BlockchainError::from_rejection(message));
        }

        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|e| BlockchainError::Encoding(e.to_string()))?;
        let recorded = RecordedTx {
            tx_hash: *envelope.tx_hash(),
            nonce: envelope.nonce(),
            to: envelope.to().unwrap_or_default(),
            gas_limit: envelope.gas_limit(),
            chain_id: envelope.chain_id().unwrap_or_default(),
            input: envelope.input().clone(),
        };
        state.nonce += 1;
        state.submissions.push(recorded.clone());
        Ok(recorded.tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<Receipt>> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        state.receipt_polls += 1;
        if state.never_mined {
            return Ok(None);
        }
        if state.pending_polls > 0 {
            state.pending_polls -= 1;
            return Ok(None);
        }
        Ok(Some(Receipt {
            tx_hash,
            success: !state.revert,
            block_number: Some(101),
            gas_used: 50_000,
            logs: state.receipt_logs.clone(),
        }))
    }

    async fn call(&self, to: Address, data: Bytes) -> BlockchainResult<Bytes> {
        self.check_online()?;
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| BlockchainError::Encoding("short call data".into()))?;
        self.state
            .lock()
            .unwrap()
            .call_responses
            .get(&(to, selector))
            .cloned()
            .ok_or_else(|| BlockchainError::Rejected("execution reverted".into()))
    }
}
