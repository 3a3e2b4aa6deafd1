//! Application context: everything an action needs, built once at startup.
//!
//! # Startup order
//! ```text
//! config → read client → session store → wallet providers → connector registry
//!        → connection session → token service
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy::primitives::Address;

use crate::blockchain::{ChainId, ChainReader, ConfirmationPolicy, NetworkNames, ReadClient};
use crate::config::DappConfig;
use crate::errors::DappError;
use crate::lifecycle::Shutdown;
use crate::session::{BalancePoller, ConnectionSession, FileStore, SessionStore};
use crate::token::{TokenContract, TokenService};
use crate::wallet::eip1193::WatchAssetParams;
use crate::wallet::registration::{register_token, setup_network};
use crate::wallet::remote::PairingDisplay;
use crate::wallet::signature::{verify_ownership, OwnershipProof};
use crate::wallet::{
    ConnectorRegistry, Eip1193Provider, InjectedConnector, LocalKeyProvider, RelayTransport,
    RemoteConnector, WalletError,
};

pub struct DappContext {
    pub config: DappConfig,
    pub reader: Arc<dyn ChainReader>,
    pub names: NetworkNames,
    pub store: Arc<dyn SessionStore>,
    pub session: ConnectionSession,
    pub token: Option<TokenService>,
    pub shutdown: Shutdown,
}

/// Builder allowing the network-facing parts to be swapped (tests, embedding).
pub struct DappContextBuilder {
    config: DappConfig,
    reader: Option<Arc<dyn ChainReader>>,
    store: Option<Arc<dyn SessionStore>>,
    injected: Option<Arc<dyn Eip1193Provider>>,
    pairing_display: Option<PairingDisplay>,
}

impl DappContextBuilder {
    pub fn reader(mut self, reader: Arc<dyn ChainReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use `provider` as the injected wallet instead of the configured key.
    pub fn injected_provider(mut self, provider: Arc<dyn Eip1193Provider>) -> Self {
        self.injected = Some(provider);
        self
    }

    pub fn pairing_display(mut self, display: PairingDisplay) -> Self {
        self.pairing_display = Some(display);
        self
    }

    pub async fn build(self) -> Result<DappContext, DappError> {
        let config = self.config;
        let network = &config.network;

        let (reader, rpc_url): (Arc<dyn ChainReader>, String) = match self.reader {
            Some(reader) => (reader, network.rpc_urls.first().cloned().unwrap_or_default()),
            None => {
                let client = ReadClient::connect(network).await?;
                let url = client.preferred_url().to_string();
                (Arc::new(client), url)
            }
        };

        let store: Arc<dyn SessionStore> = match self.store {
            Some(store) => store,
            None => Arc::new(FileStore::open(Path::new(&config.session.storage_path))?),
        };

        let mut registry = ConnectorRegistry::new();

        if config.connectors.injected.enabled {
            let provider = match self.injected {
                Some(provider) => Some(provider),
                None => {
                    let var = &config.connectors.injected.private_key_env;
                    match LocalKeyProvider::from_env(var, network.chain_id, &rpc_url) {
                        Ok(wallet) => Some(Arc::new(wallet) as Arc<dyn Eip1193Provider>),
                        Err(e) => {
                            tracing::info!(error = %e, "No injected wallet available");
                            None
                        }
                    }
                }
            };
            registry.register(Arc::new(InjectedConnector::new(provider, network.clone())));
        }

        if config.connectors.walletconnect.enabled {
            let transport = Arc::new(RelayTransport::new(
                config.connectors.walletconnect.clone(),
                store.clone(),
            ));
            let mut connector = RemoteConnector::new(transport, vec![network.chain_id]);
            if let Some(display) = self.pairing_display {
                connector = connector.with_display(display);
            }
            registry.register(Arc::new(connector));
        }

        let session = ConnectionSession::new(Arc::new(registry), store.clone());

        let token = if config.contract.address.is_empty() {
            tracing::warn!("No token contract configured");
            None
        } else {
            let address: Address = config.contract.address.parse().map_err(|_| {
                DappError::Other(format!("invalid contract address {}", config.contract.address))
            })?;
            let contract =
                TokenContract::new(address, reader.clone(), ConfirmationPolicy::from_config(network));
            Some(TokenService::new(contract, session.clone(), ChainId(network.chain_id)))
        };

        Ok(DappContext {
            names: NetworkNames::from_config(network),
            reader,
            store,
            session,
            token,
            shutdown: Shutdown::new(),
            config,
        })
    }
}

impl DappContext {
    pub fn builder(config: DappConfig) -> DappContextBuilder {
        DappContextBuilder {
            config,
            reader: None,
            store: None,
            injected: None,
            pairing_display: None,
        }
    }

    /// Build with the real read client, file store and configured wallets.
    pub async fn build(config: DappConfig) -> Result<Self, DappError> {
        Self::builder(config).build().await
    }

    pub fn token(&self) -> Result<&TokenService, DappError> {
        self.token
            .as_ref()
            .ok_or_else(|| DappError::Other("contract.address is not configured".to_string()))
    }

    /// Start the native balance / network poller for this session.
    pub fn spawn_poller(&self) -> BalancePoller {
        BalancePoller::spawn(
            &self.session,
            self.reader.clone(),
            self.names.clone(),
            Duration::from_secs(self.config.session.poll_interval_secs),
            self.shutdown.subscribe(),
        )
    }

    /// Human label for a chain id.
    pub fn network_label(&self, chain_id: ChainId) -> String {
        self.names.label(chain_id.0)
    }

    /// Ask the connected wallet to switch to (or add) the configured chain.
    pub async fn switch_network(&self) -> Result<(), DappError> {
        let provider = self.active_provider()?;
        setup_network(provider.as_ref(), &self.config.network).await?;
        Ok(())
    }

    /// Ask the connected wallet to track the token.
    pub async fn add_token(&self) -> Result<bool, DappError> {
        let provider = self.active_provider()?;
        let contract = self.token()?.contract();
        let asset = WatchAssetParams::erc20(
            contract.address(),
            &contract.symbol().await?,
            contract.decimals().await?,
            self.config.contract.image_url.clone(),
        );
        Ok(register_token(provider.as_ref(), &asset).await?)
    }

    /// Sign the ownership message for `address` with the connected wallet.
    pub async fn verify(&self, address: Address) -> Result<OwnershipProof, DappError> {
        let connected = self.session.state().account().ok_or(WalletError::NoAccounts)?;
        let provider = self.active_provider()?;
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Ok(verify_ownership(provider.as_ref(), address, connected, timestamp_ms).await?)
    }

    fn active_provider(&self) -> Result<Arc<dyn Eip1193Provider>, DappError> {
        let connector = self.session.active_connector().ok_or(WalletError::NoSession)?;
        connector
            .provider()
            .ok_or_else(|| WalletError::ProviderNotInstalled(connector.id()).into())
    }
}

impl std::fmt::Debug for DappContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DappContext")
            .field("chain_id", &self.config.network.chain_id)
            .field("session", &self.session)
            .field("token", &self.token.as_ref().map(|t| t.contract().address()))
            .finish()
    }
}
