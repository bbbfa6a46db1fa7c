//! Chain-specific types and error definitions.

use alloy::primitives::{Address, Bytes, Log, TxHash};
use serde::Serialize;
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// The ledger endpoint could not be reached or timed out.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A required configuration value is missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A caller-supplied argument is outside its domain.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transaction was included but reverted on-chain.
    #[error("Transaction {tx_hash} reverted: {reason}")]
    ChainExecution { tx_hash: TxHash, reason: String },

    /// No receipt was observed before the deadline. The transaction may still land.
    #[error("Transaction {tx_hash} not confirmed within {secs} seconds")]
    ConfirmationTimeout { tx_hash: TxHash, secs: u64 },

    /// Signing key is malformed or signing failed.
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// The account cannot cover the fee ceiling or the token amount.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// The ledger refused the transaction before inclusion.
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// Call data or return data could not be encoded or decoded.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl BlockchainError {
    /// Transaction hash carried by the error, if one was submitted.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::ChainExecution { tx_hash, .. } | Self::ConfirmationTimeout { tx_hash, .. } => {
                Some(*tx_hash)
            }
            _ => None,
        }
    }

    /// Classify an error message returned by the ledger for a submission.
    pub fn from_rejection(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("insufficient funds") || lower.contains("insufficient balance") {
            Self::InsufficientFunds(message.to_string())
        } else {
            Self::Rejected(message.to_string())
        }
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// EIP-1559 fee parameters, in wei per gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParams {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// An unsigned transaction, built for one call and consumed by signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub to: Address,
    pub input: Bytes,
    pub nonce: u64,
    pub fees: FeeParams,
    pub gas_limit: u64,
    pub chain_id: u64,
}

/// A transaction accepted into the ledger's pending pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmittedTransaction {
    pub tx_hash: TxHash,
    /// Unix timestamp of submission, in seconds.
    pub submitted_at: u64,
}

/// Inclusion record for a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    /// `true` if execution succeeded, `false` if it reverted.
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Logs emitted during execution.
    pub logs: Vec<Log>,
}

/// Result of [`TransactionExecutor::execute`](crate::blockchain::TransactionExecutor::execute).
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub submitted: SubmittedTransaction,
    /// Present only when the caller waited and the call succeeded.
    pub receipt: Option<Receipt>,
}

impl ExecutionOutcome {
    pub fn tx_hash(&self) -> TxHash {
        self.submitted.tx_hash
    }
}
