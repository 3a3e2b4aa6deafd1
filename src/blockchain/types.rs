//! Chain-specific types, the read-side seam and error definitions.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
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

impl ChainId {
    /// `0x`-prefixed hex form used by wallet RPC methods.
    pub fn to_hex(self) -> String {
        format!("0x{:x}", self.0)
    }

    /// Parse the `0x`-prefixed hex form returned by `eth_chainId`.
    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;
        u64::from_str_radix(hex, 16).ok().map(Self)
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Transaction was not confirmed within expected time.
    #[error("Transaction not confirmed within {0} seconds")]
    ConfirmationTimeout(u64),

    /// Transaction was reverted on-chain.
    #[error("Transaction reverted: {0}")]
    Reverted(String),

    /// Return data could not be decoded against the contract interface.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// No endpoint configured or usable.
    #[error("Blockchain not available: {0}")]
    NotAvailable(String),
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// The parts of a receipt the dApp cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptInfo {
    /// `true` when the transaction executed successfully.
    pub success: bool,
    /// Block the transaction was mined in.
    pub block_number: Option<u64>,
}

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction is pending in mempool.
    Pending,
    /// Transaction has been mined but not enough confirmations.
    Confirming { current: u32, required: u32 },
    /// Transaction is confirmed with required block depth.
    Confirmed { block_number: u64 },
    /// Transaction failed or was dropped.
    Failed(String),
}

/// Read-only access to the chain.
///
/// Everything the poller and the contract binding need from a provider goes
/// through this trait so they can run against a fake in tests.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn chain_id(&self) -> BlockchainResult<ChainId>;

    async fn block_number(&self) -> BlockchainResult<u64>;

    /// Native balance in wei.
    async fn balance(&self, address: Address) -> BlockchainResult<U256>;

    /// `eth_call` against `to` with ABI-encoded `data`.
    async fn call(&self, to: Address, data: Bytes) -> BlockchainResult<Bytes>;

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<ReceiptInfo>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(1u64);
        assert_eq!(chain_id.0, 1);
        assert_eq!(u64::from(chain_id), 1);
    }

    #[test]
    fn test_chain_id_hex() {
        assert_eq!(ChainId(137).to_hex(), "0x89");
        assert_eq!(ChainId::from_hex("0xaa36a7"), Some(ChainId(11_155_111)));
        assert_eq!(ChainId::from_hex("137"), None);
    }

    #[test]
    fn test_error_display() {
        let err = BlockchainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = BlockchainError::ConfirmationTimeout(120);
        assert_eq!(err.to_string(), "Transaction not confirmed within 120 seconds");

        let err = BlockchainError::ChainMismatch {
            expected: 1,
            actual: 137,
        };
        assert!(err.to_string().contains("137"));
    }
}
