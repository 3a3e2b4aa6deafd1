//! Top-level error and the notifications shown at the action boundary.

use thiserror::Error;

use crate::blockchain::BlockchainError;
use crate::config::ConfigError;
use crate::session::StoreError;
use crate::token::ContractError;
use crate::wallet::WalletError;

#[derive(Debug, Error)]
pub enum DappError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Chain(#[from] BlockchainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Other(String),
}

/// Categories users are told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConnectorNotFound,
    ProviderNotInstalled,
    UserRejected,
    AddressMismatch,
    InsufficientBalance,
    NotConnected,
    InvalidArgument,
    ChainRpcError,
    Unknown,
}

impl DappError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DappError::Wallet(e) => match e {
                WalletError::ConnectorNotFound(_) => ErrorKind::ConnectorNotFound,
                WalletError::ProviderNotInstalled(_) => ErrorKind::ProviderNotInstalled,
                WalletError::UserRejected => ErrorKind::UserRejected,
                WalletError::AddressMismatch { .. } => ErrorKind::AddressMismatch,
                WalletError::Provider(_) | WalletError::Relay(_) => ErrorKind::ChainRpcError,
                _ => ErrorKind::Unknown,
            },
            DappError::Contract(e) => match e {
                ContractError::NotConnected => ErrorKind::NotConnected,
                ContractError::InvalidArgument(_) => ErrorKind::InvalidArgument,
                ContractError::UserRejected => ErrorKind::UserRejected,
                ContractError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
                ContractError::ChainError(_) => ErrorKind::ChainRpcError,
            },
            DappError::Chain(_) => ErrorKind::ChainRpcError,
            DappError::Config(_) | DappError::Store(_) | DappError::Other(_) => ErrorKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

/// One user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }

    /// Failure notification for `action` ("Transfer", "Connect", ...).
    pub fn failure(action: &str, error: &DappError) -> Self {
        let message = match error.kind() {
            ErrorKind::UserRejected => format!("{} cancelled: request rejected in wallet", action),
            ErrorKind::ProviderNotInstalled => {
                format!("{} failed: {}. Install it or pick another wallet", action, error)
            }
            _ => format!("{} failed: {}", action, error),
        };
        Self::error(message)
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.level {
            Level::Info => "info",
            Level::Success => "ok",
            Level::Error => "error",
        };
        write!(f, "[{}] {}", tag, self.message)
    }
}
