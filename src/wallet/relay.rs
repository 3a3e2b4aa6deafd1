//! HTTP relay transport for the remote-signer connector.
//!
//! # Relay API
//! ```text
//! POST   {relay}/v1/pairings                 {projectId, topic, symKey, chains}
//! POST   {relay}/v1/sessions/{topic}/rpc     JSON-RPC 2.0 request → {result} | {error}
//! DELETE {relay}/v1/sessions/{topic}
//! ```
//!
//! The relay forwards each JSON-RPC request to the paired wallet and returns
//! its answer. The session topic is kept in the session store so a later run
//! can resume without pairing again.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::ChainId;
use crate::config::WalletConnectConfig;
use crate::session::store::SessionStore;
use crate::wallet::eip1193::{
    Eip1193Ext, Eip1193Provider, ProviderEvent, ProviderRpcError, DISCONNECTED,
};
use crate::wallet::remote::{PairingTransport, PairingUri};
use crate::wallet::types::WalletError;

/// Store key of the active session topic.
pub const TOPIC_KEY: &str = "walletconnect.topic";

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ProviderRpcError>,
}

pub struct RelayTransport {
    http: reqwest::Client,
    config: WalletConnectConfig,
    store: Arc<dyn SessionStore>,
    topic: Mutex<Option<String>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl RelayTransport {
    pub fn new(config: WalletConnectConfig, store: Arc<dyn SessionStore>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            http: reqwest::Client::new(),
            config,
            store,
            topic: Mutex::new(None),
            events,
        }
    }

    fn base_url(&self) -> &str {
        self.config.relay_url.trim_end_matches('/')
    }

    fn current_topic(&self) -> Option<String> {
        self.topic.lock().ok().and_then(|t| t.clone())
    }

    fn set_topic(&self, topic: Option<String>) {
        if let Ok(mut guard) = self.topic.lock() {
            *guard = topic.clone();
        }
        let result = match topic {
            Some(t) => self.store.set(TOPIC_KEY, &t),
            None => self.store.remove(TOPIC_KEY),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to persist relay topic");
        }
    }

    /// Forget the session locally and tell listeners.
    fn drop_session(&self, reason: ProviderRpcError) {
        self.set_topic(None);
        let _ = self.events.send(ProviderEvent::Disconnect(reason));
    }

    async fn post_rpc(&self, topic: &str, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        let url = format!("{}/v1/sessions/{}/rpc", self.base_url(), topic);
        let body = json!({
            "jsonrpc": "2.0",
            "id": uuid::Uuid::new_v4().to_string(),
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderRpcError::internal(format!("relay unreachable: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderRpcError::new(DISCONNECTED, "relay session expired"));
        }
        if !response.status().is_success() {
            return Err(ProviderRpcError::internal(format!(
                "relay returned status {}",
                response.status()
            )));
        }

        let rpc: RpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderRpcError::internal(format!("invalid relay response: {}", e)))?;

        match (rpc.result, rpc.error) {
            (_, Some(error)) => Err(error),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}

#[async_trait]
impl Eip1193Provider for RelayTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        let topic = self
            .current_topic()
            .ok_or_else(|| ProviderRpcError::new(DISCONNECTED, "no paired wallet"))?;

        match self.post_rpc(&topic, method, params.clone()).await {
            Ok(value) => {
                if method == "wallet_switchEthereumChain" {
                    if let Some(chain_id) = params[0]["chainId"].as_str().and_then(ChainId::from_hex) {
                        let _ = self.events.send(ProviderEvent::ChainChanged(chain_id));
                    }
                }
                Ok(value)
            }
            Err(e) if e.code == DISCONNECTED => {
                tracing::warn!(topic = %topic, "Remote wallet session ended");
                self.drop_session(e.clone());
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl PairingTransport for RelayTransport {
    async fn restore(&self) -> Result<bool, ProviderRpcError> {
        let Some(topic) = self.store.get(TOPIC_KEY) else {
            return Ok(false);
        };
        if let Ok(mut guard) = self.topic.lock() {
            *guard = Some(topic.clone());
        }

        match self.accounts().await {
            Ok(accounts) if !accounts.is_empty() => Ok(true),
            Ok(_) => {
                self.set_topic(None);
                Ok(false)
            }
            Err(e) if e.code == DISCONNECTED => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn pair(&self, chains: &[u64]) -> Result<PairingUri, ProviderRpcError> {
        let uri = PairingUri::generate();
        let url = format!("{}/v1/pairings", self.base_url());

        let response = self
            .http
            .post(&url)
            .json(&json!({
                "projectId": self.config.project_id,
                "topic": uri.topic,
                "symKey": uri.sym_key,
                "chains": chains.iter().map(|c| format!("eip155:{}", c)).collect::<Vec<_>>(),
            }))
            .send()
            .await
            .map_err(|e| ProviderRpcError::internal(format!("relay unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(ProviderRpcError::internal(format!(
                "pairing rejected by relay: {}",
                response.status()
            )));
        }

        if let Ok(mut guard) = self.topic.lock() {
            *guard = Some(uri.topic.clone());
        }
        tracing::debug!(topic = %uri.topic, "Pairing opened");
        Ok(uri)
    }

    async fn wait_for_approval(&self) -> Result<Vec<Address>, WalletError> {
        let deadline = Duration::from_secs(self.config.approval_timeout_secs);
        let poll = Duration::from_millis(self.config.approval_poll_interval_ms.max(1));

        let approved = timeout(deadline, async {
            let mut ticker = interval(poll);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(topic) = self.current_topic() else {
                    return Err(WalletError::NoSession);
                };
                match self.post_rpc(&topic, "eth_accounts", json!([])).await {
                    Ok(value) => {
                        let accounts: Vec<Address> = serde_json::from_value(value).unwrap_or_default();
                        if !accounts.is_empty() {
                            return Ok(accounts);
                        }
                    }
                    Err(e) if e.is_user_rejection() => return Err(WalletError::UserRejected),
                    Err(e) => tracing::debug!(error = %e, "Pairing not approved yet"),
                }
            }
        })
        .await;

        match approved {
            Ok(Ok(accounts)) => {
                self.set_topic(self.current_topic());
                Ok(accounts)
            }
            Ok(Err(e)) => {
                self.set_topic(None);
                Err(e)
            }
            Err(_) => {
                self.set_topic(None);
                Err(WalletError::PairingTimeout(self.config.approval_timeout_secs))
            }
        }
    }

    async fn close(&self) -> Result<(), ProviderRpcError> {
        let Some(topic) = self.current_topic() else {
            return Ok(());
        };
        self.set_topic(None);

        let url = format!("{}/v1/sessions/{}", self.base_url(), topic);
        let result = self.http.delete(&url).send().await;
        match result {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => Err(ProviderRpcError::internal(format!(
                "relay refused to close session: {}",
                response.status()
            ))),
            Err(e) => Err(ProviderRpcError::internal(format!("relay unreachable: {}", e))),
        }
    }
}

impl std::fmt::Debug for RelayTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayTransport")
            .field("relay_url", &self.config.relay_url)
            .field("paired", &self.current_topic().is_some())
            .finish()
    }
}
