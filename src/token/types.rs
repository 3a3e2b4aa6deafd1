//! Token snapshot, write receipts and contract errors.

use alloy::primitives::{Address, TxHash, U256};
use thiserror::Error;

use crate::blockchain::BlockchainError;
use crate::format::{format_token, short_owner, short_supply};
use crate::wallet::{ProviderRpcError, WalletError};

/// Token details for the connected account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenView {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub balance: U256,
    pub owner: Address,
}

impl TokenView {
    pub fn display_balance(&self) -> String {
        format!("{} {}", format_token(self.balance, self.decimals), self.symbol)
    }

    pub fn display_total_supply(&self) -> String {
        short_supply(self.total_supply, self.decimals)
    }

    pub fn display_owner(&self) -> String {
        short_owner(self.owner)
    }
}

/// Confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
}

/// Outcome of a token write: the receipt and the token state after it.
///
/// `view` is `None` when the refresh after a confirmed write failed; the
/// write itself still succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWrite {
    pub receipt: TxReceipt,
    pub view: Option<TokenView>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("User rejected the transaction")]
    UserRejected,

    #[error("Sender doesn't have enough tokens. Balance: {balance} {symbol}")]
    InsufficientBalance { balance: String, symbol: String },

    #[error("Chain error: {0}")]
    ChainError(String),
}

impl From<BlockchainError> for ContractError {
    fn from(e: BlockchainError) -> Self {
        ContractError::ChainError(e.to_string())
    }
}

impl From<ProviderRpcError> for ContractError {
    fn from(e: ProviderRpcError) -> Self {
        if e.is_user_rejection() {
            ContractError::UserRejected
        } else {
            ContractError::ChainError(e.message)
        }
    }
}

impl From<WalletError> for ContractError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::UserRejected => ContractError::UserRejected,
            other => ContractError::ChainError(other.to_string()),
        }
    }
}
