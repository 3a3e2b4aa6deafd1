//! Local key wallet acting as the injected provider.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{hex, Address};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::blockchain::ChainId;
use crate::wallet::eip1193::{
    AddChainParams, Eip1193Provider, ProviderEvent, ProviderRpcError, TransactionCall,
    WatchAssetParams, UNAUTHORIZED, UNRECOGNIZED_CHAIN,
};
use crate::wallet::types::WalletError;

/// Default environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "DAPP_PRIVATE_KEY";

/// Wallet holding one key, answering EIP-1193 requests like a browser extension.
#[derive(Debug)]
pub struct LocalKeyProvider {
    signer: PrivateKeySigner,
    /// Chains the wallet knows about: chain id → RPC URL.
    chains: Mutex<HashMap<u64, String>>,
    active_chain: AtomicU64,
    /// Whether the dApp currently has account access.
    authorized: AtomicBool,
    watched_assets: Mutex<Vec<WatchAssetParams>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl LocalKeyProvider {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Chain the wallet starts on
    /// * `rpc_url` - Endpoint used to broadcast transactions on that chain
    pub fn from_private_key(
        private_key_hex: &str,
        chain_id: u64,
        rpc_url: &str,
    ) -> Result<Self, WalletError> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| WalletError::InvalidKey(format!("{}", e)))?;

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id,
            "Local wallet initialized"
        );

        let (events, _) = broadcast::channel(16);
        Ok(Self {
            signer,
            chains: Mutex::new(HashMap::from([(chain_id, rpc_url.to_string())])),
            active_chain: AtomicU64::new(chain_id),
            authorized: AtomicBool::new(true),
            watched_assets: Mutex::new(Vec::new()),
            events,
        })
    }

    /// Load the wallet key from an environment variable.
    pub fn from_env(var: &str, chain_id: u64, rpc_url: &str) -> Result<Self, WalletError> {
        let private_key = std::env::var(var)
            .map_err(|_| WalletError::InvalidKey(format!("Environment variable {} not set", var)))?;

        Self::from_private_key(&private_key, chain_id, rpc_url)
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Chain the wallet is currently on.
    pub fn chain_id(&self) -> u64 {
        self.active_chain.load(Ordering::SeqCst)
    }

    /// Assets the dApp asked the wallet to track.
    pub fn watched_assets(&self) -> Vec<WatchAssetParams> {
        self.watched_assets
            .lock()
            .map(|assets| assets.clone())
            .unwrap_or_default()
    }

    fn accounts_value(&self) -> Value {
        if self.authorized.load(Ordering::SeqCst) {
            json!([self.address()])
        } else {
            json!([])
        }
    }

    fn ensure_own_address(&self, address: Address) -> Result<(), ProviderRpcError> {
        if address != self.address() {
            return Err(ProviderRpcError::new(
                UNAUTHORIZED,
                format!("account {} is not managed by this wallet", address),
            ));
        }
        Ok(())
    }

    fn switch_to(&self, chain_id: ChainId) -> Result<(), ProviderRpcError> {
        let known = self
            .chains
            .lock()
            .map(|chains| chains.contains_key(&chain_id.0))
            .unwrap_or(false);
        if !known {
            return Err(ProviderRpcError::new(
                UNRECOGNIZED_CHAIN,
                format!("Unrecognized chain ID {}", chain_id.to_hex()),
            ));
        }

        let previous = self.active_chain.swap(chain_id.0, Ordering::SeqCst);
        if previous != chain_id.0 {
            let _ = self.events.send(ProviderEvent::ChainChanged(chain_id));
        }
        Ok(())
    }

    fn rpc_url(&self) -> Result<String, ProviderRpcError> {
        let chain = self.chain_id();
        self.chains
            .lock()
            .ok()
            .and_then(|chains| chains.get(&chain).cloned())
            .ok_or_else(|| ProviderRpcError::internal(format!("no RPC URL for chain {}", chain)))
    }

    async fn personal_sign(&self, params: &Value) -> Result<Value, ProviderRpcError> {
        let raw = params[0]
            .as_str()
            .ok_or_else(|| ProviderRpcError::internal("personal_sign expects a message"))?;
        let address: Address = serde_json::from_value(params[1].clone())
            .map_err(|e| ProviderRpcError::internal(format!("invalid address: {}", e)))?;
        self.ensure_own_address(address)?;

        let message = match raw.strip_prefix("0x").map(hex::decode) {
            Some(Ok(bytes)) => bytes,
            _ => raw.as_bytes().to_vec(),
        };

        let signature = self
            .signer
            .sign_message(&message)
            .await
            .map_err(|e| ProviderRpcError::internal(format!("Message signing failed: {}", e)))?;
        Ok(json!(hex::encode_prefixed(signature.as_bytes())))
    }

    async fn send_transaction(&self, params: &Value) -> Result<Value, ProviderRpcError> {
        let call: TransactionCall = serde_json::from_value(params[0].clone())
            .map_err(|e| ProviderRpcError::internal(format!("invalid transaction: {}", e)))?;
        self.ensure_own_address(call.from)?;

        let url: url::Url = self
            .rpc_url()?
            .parse()
            .map_err(|e| ProviderRpcError::internal(format!("invalid RPC URL: {}", e)))?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(self.signer.clone()))
            .connect_http(url);

        let mut tx = TransactionRequest::default()
            .with_from(call.from)
            .with_to(call.to)
            .with_input(call.data);
        if let Some(value) = call.value {
            tx = tx.with_value(value);
        }

        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(|e| ProviderRpcError::internal(format!("transaction rejected: {}", e)))?;
        let tx_hash = *pending.tx_hash();

        tracing::info!(tx_hash = %tx_hash, to = %call.to, "Transaction broadcast");
        Ok(json!(tx_hash))
    }
}

#[async_trait]
impl Eip1193Provider for LocalKeyProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        match method {
            "eth_requestAccounts" => {
                let was_authorized = self.authorized.swap(true, Ordering::SeqCst);
                if !was_authorized {
                    let _ = self
                        .events
                        .send(ProviderEvent::AccountsChanged(vec![self.address()]));
                }
                Ok(self.accounts_value())
            }
            "eth_accounts" => Ok(self.accounts_value()),
            "eth_chainId" => Ok(json!(ChainId(self.chain_id()).to_hex())),
            "wallet_switchEthereumChain" => {
                let chain_id = params[0]["chainId"]
                    .as_str()
                    .and_then(ChainId::from_hex)
                    .ok_or_else(|| ProviderRpcError::internal("invalid chainId"))?;
                self.switch_to(chain_id)?;
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                let add: AddChainParams = serde_json::from_value(params[0].clone())
                    .map_err(|e| ProviderRpcError::internal(format!("invalid chain: {}", e)))?;
                let chain_id = ChainId::from_hex(&add.chain_id)
                    .ok_or_else(|| ProviderRpcError::internal("invalid chainId"))?;
                let rpc_url = add
                    .rpc_urls
                    .first()
                    .cloned()
                    .ok_or_else(|| ProviderRpcError::internal("rpcUrls must not be empty"))?;
                if let Ok(mut chains) = self.chains.lock() {
                    chains.insert(chain_id.0, rpc_url);
                }
                tracing::info!(chain_id = %chain_id, chain_name = %add.chain_name, "Chain added");
                self.switch_to(chain_id)?;
                Ok(Value::Null)
            }
            "wallet_watchAsset" => {
                let asset: WatchAssetParams = serde_json::from_value(params)
                    .map_err(|e| ProviderRpcError::internal(format!("invalid asset: {}", e)))?;
                if let Ok(mut assets) = self.watched_assets.lock() {
                    if !assets.contains(&asset) {
                        assets.push(asset);
                    }
                }
                Ok(Value::Bool(true))
            }
            "wallet_revokePermissions" => {
                if self.authorized.swap(false, Ordering::SeqCst) {
                    let _ = self.events.send(ProviderEvent::AccountsChanged(Vec::new()));
                }
                Ok(Value::Null)
            }
            "personal_sign" => self.personal_sign(&params).await,
            "eth_sendTransaction" => self.send_transaction(&params).await,
            other => Err(ProviderRpcError::unsupported(other)),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
