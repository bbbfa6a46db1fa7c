//! Transaction building, signing, submission and confirmation.
//!
//! # Responsibilities
//! - Build one EIP-1559 transaction per call from the ledger's nonce and fees
//! - Sign and broadcast it
//! - Optionally poll for its receipt until a deadline
//!
//! No retries: a timeout or rejection is reported to the caller, who decides
//! whether to resubmit.

use alloy::primitives::{Address, TxHash, U256};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::client::Ledger;
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ExecutionOutcome, FeeParams, PendingTransaction, Receipt,
    SubmittedTransaction,
};
use crate::blockchain::wallet::Wallet;
use crate::config::FeeConfig;
use crate::contracts::{ContractAddresses, ContractCall};
use crate::observability::metrics;

const GWEI: u128 = 1_000_000_000;

/// Executes state-changing contract calls for a single account.
pub struct TransactionExecutor<L> {
    ledger: L,
    wallet: Wallet,
    contracts: ContractAddresses,
    fees: FeeConfig,
    poll_interval: Duration,
}

impl<L: Ledger> TransactionExecutor<L> {
    /// Create a new executor.
    pub fn new(
        ledger: L,
        wallet: Wallet,
        contracts: ContractAddresses,
        fees: FeeConfig,
        poll_interval: Duration,
    ) -> Self {
        Self {
            ledger,
            wallet,
            contracts,
            fees,
            poll_interval,
        }
    }

    /// Build, sign and submit `call`, optionally waiting for its receipt.
    ///
    /// # Arguments
    /// * `call` - Method and typed arguments; not revalidated here
    /// * `wait_for_receipt` - Block until inclusion or timeout
    /// * `timeout_secs` - Upper bound on waiting; ignored when not waiting
    pub async fn execute(
        &self,
        call: &ContractCall,
        wait_for_receipt: bool,
        timeout_secs: u64,
    ) -> BlockchainResult<ExecutionOutcome> {
        let method = call.method();
        let from = self.wallet.address();

        let nonce = self.ledger.transaction_count(from).await?;
        let recommended = self.ledger.fee_estimate().await?;

        let pending = PendingTransaction {
            to: call.target(&self.contracts),
            input: call.encode(),
            nonce,
            fees: self.fee_params(recommended),
            gas_limit: method.gas_limit(&self.fees.gas_limits),
            chain_id: self.wallet.chain_id(),
        };

        let signed = self.wallet.sign_transaction(&pending)?;

        let tx_hash = match self.ledger.send_raw_transaction(&signed.raw).await {
            Ok(hash) => hash,
            Err(e) => {
                metrics::record_transaction(method.as_str(), "rejected");
                tracing::error!(method = %method, nonce = nonce, error = %e, "Transaction submission failed");
                return Err(e);
            }
        };
        if tx_hash != signed.tx_hash {
            tracing::warn!(
                expected = %signed.tx_hash,
                reported = %tx_hash,
                "Ledger reported a different transaction hash"
            );
        }

        let submitted = SubmittedTransaction {
            tx_hash,
            submitted_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        };
        metrics::record_transaction(method.as_str(), "submitted");
        tracing::info!(
            method = %method,
            tx_hash = %tx_hash,
            nonce = nonce,
            gas_limit = pending.gas_limit,
            max_fee_per_gas = pending.fees.max_fee_per_gas,
            "Transaction submitted"
        );

        if !wait_for_receipt {
            return Ok(ExecutionOutcome {
                submitted,
                receipt: None,
            });
        }

        let started = Instant::now();
        let result = self.wait_for_receipt(submitted.tx_hash, timeout_secs).await;
        match &result {
            Ok(receipt) => {
                metrics::record_transaction(method.as_str(), "confirmed");
                metrics::record_confirmation_latency(method.as_str(), started.elapsed());
                tracing::info!(
                    method = %method,
                    tx_hash = %tx_hash,
                    block_number = ?receipt.block_number,
                    gas_used = receipt.gas_used,
                    "Transaction confirmed"
                );
            }
            Err(BlockchainError::ChainExecution { .. }) => {
                metrics::record_transaction(method.as_str(), "reverted");
            }
            Err(BlockchainError::ConfirmationTimeout { .. }) => {
                metrics::record_transaction(method.as_str(), "timeout");
            }
            Err(_) => {}
        }

        Ok(ExecutionOutcome {
            submitted,
            receipt: Some(result?),
        })
    }

    /// Poll for a receipt until one arrives or `timeout_secs` elapses.
    ///
    /// # Arguments
    /// * `tx_hash` - Transaction hash to monitor
    /// * `timeout_secs` - Maximum time to wait for inclusion
    pub async fn wait_for_receipt(&self, tx_hash: TxHash, timeout_secs: u64) -> BlockchainResult<Receipt> {
        let timeout_duration = Duration::from_secs(timeout_secs);

        let result = timeout(timeout_duration, async {
            let mut ticker = interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let receipt = match self.ledger.transaction_receipt(tx_hash).await? {
                    Some(r) => r,
                    None => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                };

                if !receipt.success {
                    tracing::error!(
                        tx_hash = %tx_hash,
                        block_number = ?receipt.block_number,
                        "Transaction reverted"
                    );
                    return Err(BlockchainError::ChainExecution {
                        tx_hash,
                        reason: match receipt.block_number {
                            Some(block) => format!("execution failed (status 0) in block {}", block),
                            None => "execution failed (status 0)".to_string(),
                        },
                    });
                }

                return Ok(receipt);
            }
        })
        .await;

        match result {
            Ok(receipt) => receipt,
            Err(_) => {
                tracing::warn!(tx_hash = %tx_hash, timeout_secs = timeout_secs, "Confirmation timed out");
                Err(BlockchainError::ConfirmationTimeout {
                    tx_hash,
                    secs: timeout_secs,
                })
            }
        }
    }

    /// Fee parameters bounded by the configured ceiling.
    ///
    /// The priority fee is fixed by configuration. The max fee follows the
    /// network recommendation, never below the priority fee nor above the
    /// ceiling.
    pub fn fee_params(&self, recommended: FeeParams) -> FeeParams {
        let ceiling = self.fees.max_fee_per_gas_gwei as u128 * GWEI;
        let priority = self.fees.max_priority_fee_per_gas_gwei as u128 * GWEI;

        if recommended.max_fee_per_gas > ceiling {
            tracing::warn!(
                recommended_gwei = recommended.max_fee_per_gas / GWEI,
                ceiling_gwei = self.fees.max_fee_per_gas_gwei,
                "Network fee above configured ceiling, inclusion may be slow"
            );
        }

        let max_fee_per_gas = recommended.max_fee_per_gas.max(priority).min(ceiling);
        FeeParams {
            max_fee_per_gas,
            max_priority_fee_per_gas: priority.min(max_fee_per_gas),
        }
    }

    /// Worst-case native cost of one transaction: the fee ceiling times the
    /// largest configured gas limit.
    pub fn max_transaction_cost(&self) -> U256 {
        let ceiling = self.fees.max_fee_per_gas_gwei as u128 * GWEI;
        U256::from(ceiling) * U256::from(self.fees.gas_limits.max())
    }

    /// Get the ledger this executor submits to.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Get the signing wallet.
    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    /// Get the contract addresses calls are routed to.
    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    /// Get the wallet address.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}
