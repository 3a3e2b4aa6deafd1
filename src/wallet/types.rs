//! Connector identifiers, activation results and wallet errors.

use std::str::FromStr;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::ChainId;
use crate::wallet::eip1193::ProviderRpcError;

/// Identifies which connector is (or was last) active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorId {
    /// Browser-extension style provider (here: a local key wallet).
    Injected,
    /// QR-paired remote signer.
    #[serde(rename = "walletconnect")]
    WalletConnect,
}

impl ConnectorId {
    pub const ALL: [ConnectorId; 2] = [ConnectorId::Injected, ConnectorId::WalletConnect];

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectorId::Injected => "injected",
            ConnectorId::WalletConnect => "walletconnect",
        }
    }

    /// Name shown to users.
    pub fn display_name(self) -> &'static str {
        match self {
            ConnectorId::Injected => "MetaMask",
            ConnectorId::WalletConnect => "WalletConnect",
        }
    }
}

impl std::fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectorId {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "injected" => Ok(ConnectorId::Injected),
            "walletconnect" => Ok(ConnectorId::WalletConnect),
            other => Err(WalletError::ConnectorNotFound(other.to_string())),
        }
    }
}

/// What a successful activation yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    pub account: Address,
    pub chain_id: ChainId,
}

/// Errors raised by connectors and wallet transports.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("Connector with id {0} not found")]
    ConnectorNotFound(String),

    #[error("{} provider not installed", .0.display_name())]
    ProviderNotInstalled(ConnectorId),

    #[error("User rejected the request")]
    UserRejected,

    #[error("Wallet returned no accounts")]
    NoAccounts,

    #[error("No session to restore")]
    NoSession,

    #[error("Pairing was not approved within {0} seconds")]
    PairingTimeout(u64),

    #[error("Selected address {requested} does not match the connected wallet {connected}")]
    AddressMismatch { requested: Address, connected: Address },

    #[error("Invalid private key format: {0}")]
    InvalidKey(String),

    #[error("Relay error: {0}")]
    Relay(String),

    #[error(transparent)]
    Provider(ProviderRpcError),
}

impl From<ProviderRpcError> for WalletError {
    fn from(e: ProviderRpcError) -> Self {
        if e.is_user_rejection() {
            WalletError::UserRejected
        } else {
            WalletError::Provider(e)
        }
    }
}
