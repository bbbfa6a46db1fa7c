//! Extraction of contract-computed values from receipt logs.
//!
//! A submission only yields a transaction hash; values assigned by a
//! contract (agent IDs, request handles) are only known from emitted events.

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolEvent;

use crate::blockchain::types::{BlockchainError, BlockchainResult, Receipt};
use crate::contracts::abi::{IIdentityRegistry, IValidationRegistry};

/// First event of type `E` emitted by `emitter` in the receipt.
pub fn find_event<E: SolEvent>(receipt: &Receipt, emitter: Address) -> Option<E> {
    receipt
        .logs
        .iter()
        .filter(|log| log.address == emitter)
        .find_map(|log| E::decode_log_data(&log.data).ok())
}

/// Agent ID assigned by the identity registry's `Registered` event.
pub fn agent_id_from_receipt(receipt: &Receipt, identity_registry: Address) -> BlockchainResult<U256> {
    find_event::<IIdentityRegistry::Registered>(receipt, identity_registry)
        .map(|event| event.agentId)
        .ok_or_else(|| {
            BlockchainError::Encoding(format!(
                "Registered event not found in receipt of {}",
                receipt.tx_hash
            ))
        })
}

/// Request hash echoed by the validation registry's `ValidationRequest` event.
pub fn request_hash_from_receipt(receipt: &Receipt, validation_registry: Address) -> Option<B256> {
    find_event::<IValidationRegistry::ValidationRequest>(receipt, validation_registry)
        .map(|event| event.requestHash)
}
