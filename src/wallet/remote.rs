//! Remote-signer connector: the wallet lives on another device and is paired
//! by scanning a `wc:` URI rendered as a QR code.

use std::sync::Arc;

use alloy::primitives::{hex, Address};
use async_trait::async_trait;

use crate::blockchain::ChainId;
use crate::wallet::connector::Connector;
use crate::wallet::eip1193::{Eip1193Ext, Eip1193Provider, ProviderRpcError};
use crate::wallet::types::{Activation, ConnectorId, WalletError};

/// Pairing invitation handed to the remote wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingUri {
    pub topic: String,
    pub sym_key: String,
    pub relay_protocol: String,
}

impl PairingUri {
    /// Fresh random topic and symmetric key.
    pub fn generate() -> Self {
        Self {
            topic: hex::encode(rand::random::<[u8; 32]>()),
            sym_key: hex::encode(rand::random::<[u8; 32]>()),
            relay_protocol: "irn".to_string(),
        }
    }
}

impl std::fmt::Display for PairingUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "wc:{}@2?relay-protocol={}&symKey={}",
            self.topic, self.relay_protocol, self.sym_key
        )
    }
}

/// Transport to a remote wallet.
#[async_trait]
pub trait PairingTransport: Eip1193Provider {
    /// Resume a previously approved session. `Ok(false)` when there is none.
    async fn restore(&self) -> Result<bool, ProviderRpcError>;

    /// Open a new pairing for `chains`.
    async fn pair(&self, chains: &[u64]) -> Result<PairingUri, ProviderRpcError>;

    /// Wait until the remote wallet approves the pairing and return its accounts.
    async fn wait_for_approval(&self) -> Result<Vec<Address>, WalletError>;

    /// Tear the session down on both ends.
    async fn close(&self) -> Result<(), ProviderRpcError>;
}

/// Callback that shows the pairing URI to the user.
pub type PairingDisplay = Arc<dyn Fn(&PairingUri) + Send + Sync>;

pub struct RemoteConnector<T> {
    transport: Arc<T>,
    chains: Vec<u64>,
    display: PairingDisplay,
}

impl<T: PairingTransport + 'static> RemoteConnector<T> {
    pub fn new(transport: Arc<T>, chains: Vec<u64>) -> Self {
        Self {
            transport,
            chains,
            display: Arc::new(|uri: &PairingUri| {
                tracing::info!(uri = %uri, "Scan the pairing code with your wallet");
            }),
        }
    }

    /// Replace the default (log only) pairing display.
    pub fn with_display(mut self, display: PairingDisplay) -> Self {
        self.display = display;
        self
    }

    async fn session_activation(&self, accounts: Vec<Address>) -> Result<Activation, WalletError> {
        let account = *accounts.first().ok_or(WalletError::NoAccounts)?;
        let chain_id: ChainId = self.transport.chain_id().await?;
        Ok(Activation { account, chain_id })
    }
}

#[async_trait]
impl<T: PairingTransport + 'static> Connector for RemoteConnector<T> {
    fn id(&self) -> ConnectorId {
        ConnectorId::WalletConnect
    }

    fn provider(&self) -> Option<Arc<dyn Eip1193Provider>> {
        Some(self.transport.clone() as Arc<dyn Eip1193Provider>)
    }

    async fn activate(&self) -> Result<Activation, WalletError> {
        if self.transport.restore().await? {
            let accounts = self.transport.accounts().await?;
            if !accounts.is_empty() {
                return self.session_activation(accounts).await;
            }
        }

        let uri = self.transport.pair(&self.chains).await?;
        (self.display)(&uri);

        let accounts = self.transport.wait_for_approval().await?;
        self.session_activation(accounts).await
    }

    async fn connect_eagerly(&self) -> Result<Activation, WalletError> {
        if !self.transport.restore().await? {
            return Err(WalletError::NoSession);
        }
        let accounts = self.transport.accounts().await?;
        self.session_activation(accounts).await
    }

    async fn deactivate(&self) -> Result<(), WalletError> {
        self.transport.close().await.map_err(WalletError::from)
    }
}
