//! Wallet connection state machine.
//!
//! # States
//! - Disconnected: no wallet attached
//! - Connecting: a connector is activating
//! - Connected: account and chain known
//! - Error: the last activation failed
//!
//! # State Transitions
//! ```text
//! Disconnected → Connecting: connect(id)
//! Connecting   → Connected:  activation succeeded
//! Connecting   → Error:      activation failed
//! Connected    → Disconnected: disconnect, empty accounts, provider disconnect
//! Error        → Disconnected: acknowledged
//! Error        → Connecting:   new connect attempt
//! ```

use alloy::primitives::Address;

use crate::blockchain::ChainId;
use crate::wallet::{Activation, ConnectorId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting {
        connector: ConnectorId,
    },
    Connected {
        connector: ConnectorId,
        account: Address,
        chain_id: ChainId,
    },
    Error {
        connector: ConnectorId,
        message: String,
    },
}

impl ConnectionState {
    pub fn connected(connector: ConnectorId, activation: Activation) -> Self {
        ConnectionState::Connected {
            connector,
            account: activation.account,
            chain_id: activation.chain_id,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }

    /// Connector involved in the current state, if any.
    pub fn connector(&self) -> Option<ConnectorId> {
        match self {
            ConnectionState::Disconnected => None,
            ConnectionState::Connecting { connector }
            | ConnectionState::Connected { connector, .. }
            | ConnectionState::Error { connector, .. } => Some(*connector),
        }
    }

    pub fn account(&self) -> Option<Address> {
        match self {
            ConnectionState::Connected { account, .. } => Some(*account),
            _ => None,
        }
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        match self {
            ConnectionState::Connected { chain_id, .. } => Some(*chain_id),
            _ => None,
        }
    }

    /// Short name for logs and metrics labels.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting { .. } => "connecting",
            ConnectionState::Connected { .. } => "connected",
            ConnectionState::Error { .. } => "error",
        }
    }
}
