//! ERC-8004 validator staking harness
//!
//! Drives the validator lifecycle against deployed contracts over JSON-RPC.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI (run | info | status)
//!        │
//!        ▼
//!   config (TOML + ERC8004_* env) ──▶ Wallet (key from env)
//!        │                               │
//!        ▼                               ▼
//!   BlockchainClient ──────────▶ TransactionExecutor
//!   (reads fail over)                    │
//!                                        ▼
//!                               ValidationManager
//!                                        │
//!                                        ▼
//!                         Pipeline (7 stages) ──▶ RunReport (JSON)
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy::primitives::B256;
use validator_harness::blockchain::{BlockchainClient, TransactionExecutor, Wallet};
use validator_harness::config::{load_config, HarnessConfig};
use validator_harness::contracts::{format_tokens, ContractAddresses};
use validator_harness::observability::{logging, metrics};
use validator_harness::workflow::{Pipeline, ValidationManager};

#[derive(Parser)]
#[command(name = "validator-harness")]
#[command(about = "Exercise the ERC-8004 validator staking workflow", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Report output path (overrides the configured path)
    #[arg(short, long, global = true)]
    report: Option<PathBuf>,

    /// Submit transactions without waiting for receipts
    #[arg(long, global = true)]
    no_wait: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full seven-stage workflow
    Run,
    /// Show validator and global staking statistics
    Info,
    /// Show the recorded status of a validation request
    Status {
        /// Request hash (0x-prefixed, 32 bytes)
        request_hash: B256,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if cli.no_wait {
        config.workflow.wait_for_receipt = false;
    }
    if let Some(path) = &cli.report {
        config.workflow.report_path = path.display().to_string();
    }

    logging::init_logging(&config.observability.log_level);
    tracing::info!(
        rpc_url = %config.ledger.rpc_url,
        chain_id = config.ledger.chain_id,
        wait_for_receipt = config.workflow.wait_for_receipt,
        "validator-harness v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let manager = build_manager(&config).await?;

    match cli.command {
        Commands::Run => {
            tokio::select! {
                result = run_workflow(&manager, &config) => result?,
                _ = tokio::signal::ctrl_c() => {
                    tracing::warn!("Interrupted, no report written");
                    std::process::exit(130);
                }
            }
        }
        Commands::Info => print_info(&manager).await?,
        Commands::Status { request_hash } => {
            let status = manager.validation_status(request_hash).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

async fn build_manager(
    config: &HarnessConfig,
) -> Result<ValidationManager<BlockchainClient>, Box<dyn std::error::Error>> {
    let wallet = Wallet::from_env(config.ledger.chain_id)?;
    tracing::info!(address = %wallet.address(), "Wallet loaded");

    let client = BlockchainClient::new(config.ledger.clone()).await?;
    let contracts = ContractAddresses::from_config(&config.contracts)?;

    let executor = TransactionExecutor::new(
        client,
        wallet,
        contracts,
        config.fees.clone(),
        Duration::from_millis(config.ledger.poll_interval_ms),
    );
    Ok(ValidationManager::new(executor))
}

async fn run_workflow(
    manager: &ValidationManager<BlockchainClient>,
    config: &HarnessConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = Pipeline::new(manager, &config.workflow).run().await;
    report.save(Path::new(&config.workflow.report_path))?;

    println!("Transactions:");
    for tx in &report.transactions {
        println!("  {}: {}", tx.name, tx.explorer_url);
    }
    println!("Stages:");
    for (stage, record) in &report.stages {
        println!("  {}: {}", stage, record.status.as_str());
    }

    if !report.all_passed() {
        return Err("workflow failed, see report for details".into());
    }
    Ok(())
}

async fn print_info(
    manager: &ValidationManager<BlockchainClient>,
) -> Result<(), Box<dyn std::error::Error>> {
    let info = manager.validator_info(None).await?;
    let stats = manager.staking_stats().await?;
    let tokens = manager.token_balance(None).await?;
    let native = manager.native_balance(None).await?;

    println!("Validator {}", manager.address());
    println!("  Native balance:   {}", format_tokens(native));
    println!("  Token balance:    {}", format_tokens(tokens));
    println!("  Staked:           {}", format_tokens(info.staked_amount));
    println!("  Active:           {}", info.active);
    println!("  Pending rewards:  {}", format_tokens(info.pending_rewards));
    println!("  Validations:      {}", info.validation_count);
    println!("Global");
    println!("  Total staked:     {}", format_tokens(stats.total_staked));
    println!("  Total rewards:    {}", format_tokens(stats.total_rewards));
    println!("  Total slashed:    {}", format_tokens(stats.total_slashed));
    Ok(())
}
