//! ERC-8004 validator staking harness library

pub mod blockchain;
pub mod config;
pub mod contracts;
pub mod observability;
pub mod report;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use blockchain::{BlockchainClient, BlockchainError, Ledger, TransactionExecutor, Wallet};
pub use config::schema::HarnessConfig;
pub use report::RunReport;
pub use workflow::{Pipeline, ValidationManager};
