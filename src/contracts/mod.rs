//! Contract interface for the validator-staking protocol.
//!
//! # Data Flow
//! ```text
//! ContractCall (typed intent)
//!     → call.rs (selector + ABI call data)
//!     → executor signs and submits
//!     → events.rs (values read back from receipt logs)
//!
//! View calls:
//!     → views.rs (encode query, decode typed return)
//! ```

pub mod abi;
pub mod call;
pub mod events;
pub mod views;

use alloy::primitives::utils::format_ether;
use alloy::primitives::U256;

pub use call::{request_hash, tag_hash, ContractAddresses, ContractCall, MetadataEntry, Method};
pub use views::{GlobalStats, ValidationStatus, ValidatorRecord};

/// Token decimals shared by the stake token and the native currency.
pub const TOKEN_DECIMALS: u8 = 18;

/// Convert whole tokens to base units.
pub fn tokens_to_wei(tokens: u64) -> U256 {
    U256::from(tokens) * U256::from(10u64).pow(U256::from(TOKEN_DECIMALS))
}

/// Format base units as a decimal token amount.
pub fn format_tokens(amount: U256) -> String {
    format_ether(amount)
}
