//! Injected connector: a provider living next to the dApp (browser extension
//! in a web front end, a local key wallet here).

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::NetworkConfig;
use crate::wallet::connector::Connector;
use crate::wallet::eip1193::{Eip1193Ext, Eip1193Provider, UNSUPPORTED_METHOD};
use crate::wallet::registration::setup_network;
use crate::wallet::types::{Activation, ConnectorId, WalletError};

pub struct InjectedConnector {
    /// `None` when no wallet is installed.
    provider: Option<Arc<dyn Eip1193Provider>>,
    network: NetworkConfig,
}

impl InjectedConnector {
    pub fn new(provider: Option<Arc<dyn Eip1193Provider>>, network: NetworkConfig) -> Self {
        Self { provider, network }
    }

    fn require_provider(&self) -> Result<&Arc<dyn Eip1193Provider>, WalletError> {
        self.provider
            .as_ref()
            .ok_or(WalletError::ProviderNotInstalled(ConnectorId::Injected))
    }
}

#[async_trait]
impl Connector for InjectedConnector {
    fn id(&self) -> ConnectorId {
        ConnectorId::Injected
    }

    fn provider(&self) -> Option<Arc<dyn Eip1193Provider>> {
        self.provider.clone()
    }

    async fn activate(&self) -> Result<Activation, WalletError> {
        let provider = self.require_provider()?;

        let accounts = provider.request_accounts().await?;
        let account = *accounts.first().ok_or(WalletError::NoAccounts)?;

        let mut chain_id = provider.chain_id().await?;
        if chain_id.0 != self.network.chain_id {
            setup_network(provider.as_ref(), &self.network).await?;
            chain_id = provider.chain_id().await?;
            if chain_id.0 != self.network.chain_id {
                tracing::warn!(
                    expected = self.network.chain_id,
                    actual = chain_id.0,
                    "Wallet stayed on a different network"
                );
            }
        }

        Ok(Activation { account, chain_id })
    }

    async fn connect_eagerly(&self) -> Result<Activation, WalletError> {
        let provider = self.require_provider()?;

        let accounts = provider.accounts().await?;
        let account = *accounts.first().ok_or(WalletError::NoAccounts)?;
        let chain_id = provider.chain_id().await?;

        Ok(Activation { account, chain_id })
    }

    async fn deactivate(&self) -> Result<(), WalletError> {
        let Some(provider) = self.provider.as_ref() else {
            return Ok(());
        };

        // Extensions cannot always be disconnected programmatically.
        match provider.revoke_permissions().await {
            Ok(()) => Ok(()),
            Err(e) if e.code == UNSUPPORTED_METHOD => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for InjectedConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectedConnector")
            .field("installed", &self.provider.is_some())
            .field("chain_id", &self.network.chain_id)
            .finish()
    }
}
