//! Proof that the connected wallet controls an address.

use alloy::primitives::Address;

use crate::wallet::eip1193::{Eip1193Ext, Eip1193Provider};
use crate::wallet::types::WalletError;

/// Message the user signs to prove ownership.
pub fn ownership_message(address: Address, timestamp_ms: u64) -> String {
    format!(
        "Verify wallet ownership\nAddress: {}\nTimestamp: {}",
        address, timestamp_ms
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipProof {
    pub address: Address,
    pub message: String,
    /// 0x-prefixed 65-byte signature.
    pub signature: String,
}

/// Ask the wallet to sign the ownership message for `requested`.
///
/// Fails with `AddressMismatch` when `requested` is not the connected account.
pub async fn verify_ownership(
    provider: &dyn Eip1193Provider,
    requested: Address,
    connected: Address,
    timestamp_ms: u64,
) -> Result<OwnershipProof, WalletError> {
    if requested != connected {
        return Err(WalletError::AddressMismatch { requested, connected });
    }

    let message = ownership_message(requested, timestamp_ms);
    let signature = provider.personal_sign(&message, requested).await?;
    tracing::info!(address = %requested, "Ownership message signed");

    Ok(OwnershipProof {
        address: requested,
        message,
        signature,
    })
}
