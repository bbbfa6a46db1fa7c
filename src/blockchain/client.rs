//! Ledger RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoint
//! - Query chain state (nonce, fees, balances, receipts, view calls)
//! - Submit signed transactions
//! - Handle timeouts and network errors gracefully

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::TransportError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId, FeeParams, Receipt};
use crate::config::LedgerConfig;

/// Read and submission surface of a JSON-RPC ledger.
///
/// The executor and workflow only talk to the ledger through this trait, so
/// tests can substitute an in-memory double.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Chain ID reported by the endpoint.
    async fn chain_id(&self) -> BlockchainResult<u64>;

    /// Latest block number.
    async fn block_number(&self) -> BlockchainResult<u64>;

    /// Transaction count (next nonce) for an address.
    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64>;

    /// Current EIP-1559 fee recommendation.
    async fn fee_estimate(&self) -> BlockchainResult<FeeParams>;

    /// Native balance of an address.
    async fn balance(&self, address: Address) -> BlockchainResult<U256>;

    /// Submit an EIP-2718 encoded transaction to the pending pool.
    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash>;

    /// Receipt for a transaction, `None` while it is pending.
    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<Receipt>>;

    /// Read-only contract call against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> BlockchainResult<Bytes>;
}

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Ledger RPC client with read failover.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers). Submissions use the primary only.
    providers: Vec<DynProvider>,
    /// Configuration.
    config: LedgerConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new ledger client.
    ///
    /// Fails only if the primary URL is malformed. A chain ID mismatch or an
    /// unreachable endpoint is logged; the caller decides whether it is fatal.
    pub async fn new(config: LedgerConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Configuration(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as DynProvider);

        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as DynProvider);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let client = Self {
            providers,
            config: config.clone(),
            timeout_duration,
        };

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    "Ledger client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Ledger client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        self.read("get chain id", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    /// Get the configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Run a read against each provider in turn until one answers.
    ///
    /// Transport failures and timeouts fall through to the next provider. An
    /// error response from the node is final, since every node would give it.
    async fn read<T, F, Fut>(&self, op: &'static str, f: F) -> BlockchainResult<T>
    where
        F: Fn(DynProvider) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, TransportError>> + Send,
        T: Send,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, f(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    if let Some(payload) = e.as_error_resp() {
                        return Err(BlockchainError::from_rejection(&payload.message));
                    }
                    tracing::warn!(provider_idx = i, op = op, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, op = op, "RPC timeout, trying next provider");
                }
            }
        }
        Err(BlockchainError::Connection(format!(
            "All RPC providers failed to {}",
            op
        )))
    }
}

#[async_trait]
impl Ledger for BlockchainClient {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        self.get_chain_id().await.map(u64::from)
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.read("get block number", |p| async move { p.get_block_number().await })
            .await
    }

    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.read("get transaction count", move |p| async move {
            p.get_transaction_count(address).pending().await
        })
        .await
    }

    async fn fee_estimate(&self) -> BlockchainResult<FeeParams> {
        let estimate = self
            .read("estimate fees", |p| async move { p.estimate_eip1559_fees().await })
            .await?;
        Ok(FeeParams {
            max_fee_per_gas: estimate.max_fee_per_gas,
            max_priority_fee_per_gas: estimate.max_priority_fee_per_gas,
        })
    }

    async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        self.read("get balance", move |p| async move { p.get_balance(address).await })
            .await
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        let provider = &self.providers[0];
        match timeout(self.timeout_duration, provider.send_raw_transaction(raw)).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => match e.as_error_resp() {
                Some(payload) => Err(BlockchainError::from_rejection(&payload.message)),
                None => Err(BlockchainError::Connection(format!(
                    "Failed to submit transaction: {}",
                    e
                ))),
            },
            Err(_) => Err(BlockchainError::Connection(format!(
                "Transaction submission timed out after {} seconds",
                self.config.rpc_timeout_secs
            ))),
        }
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<Receipt>> {
        let receipt = self
            .read("get receipt", move |p| async move {
                p.get_transaction_receipt(tx_hash).await
            })
            .await?;
        Ok(receipt.as_ref().map(to_receipt))
    }

    async fn call(&self, to: Address, data: Bytes) -> BlockchainResult<Bytes> {
        let request = TransactionRequest::default().with_to(to).with_input(data);
        self.read("call contract", move |p| {
            let request = request.clone();
            async move { p.call(request).await }
        })
        .await
    }
}

fn to_receipt(receipt: &TransactionReceipt) -> Receipt {
    Receipt {
        tx_hash: receipt.transaction_hash,
        success: receipt.status(),
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
        logs: receipt
            .inner
            .logs()
            .iter()
            .map(|log| log.inner.clone())
            .collect(),
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
