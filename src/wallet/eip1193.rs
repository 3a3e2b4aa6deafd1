//! EIP-1193 provider seam.
//!
//! Every wallet transport (local key, remote relay) speaks the same
//! `request(method, params)` interface and emits the same events. Typed
//! helpers for the handful of methods the dApp uses live on [`Eip1193Ext`].

use alloy::primitives::{hex, Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::blockchain::ChainId;
use crate::config::{NativeCurrency, NetworkConfig};

/// User rejected the request.
pub const USER_REJECTED: i64 = 4001;
/// The requested method or account has not been authorized.
pub const UNAUTHORIZED: i64 = 4100;
/// The provider does not support the method.
pub const UNSUPPORTED_METHOD: i64 = 4200;
/// The provider is disconnected from all chains.
pub const DISCONNECTED: i64 = 4900;
/// The provider is not connected to the requested chain.
pub const CHAIN_DISCONNECTED: i64 = 4901;
/// The chain has not been added to the wallet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;
/// JSON-RPC internal error.
pub const INTERNAL_ERROR: i64 = -32603;

/// Error object returned by a provider request.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("provider error {code}: {message}")]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
}

impl ProviderRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    pub fn unsupported(method: &str) -> Self {
        Self::new(UNSUPPORTED_METHOD, format!("method {} not supported", method))
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED
    }
}

/// Events a provider pushes to the dApp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// Account list changed; empty means the wallet locked or revoked access.
    AccountsChanged(Vec<Address>),
    ChainChanged(ChainId),
    Disconnect(ProviderRpcError),
}

/// A wallet transport.
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError>;

    /// Subscribe to account/chain/disconnect events.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Parameters for `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
}

impl AddChainParams {
    pub fn from_config(config: &NetworkConfig) -> Self {
        Self {
            chain_id: ChainId(config.chain_id).to_hex(),
            chain_name: config.chain_name.clone(),
            native_currency: config.native_currency.clone(),
            rpc_urls: config.rpc_urls.clone(),
            block_explorer_urls: vec![config.explorer_url.clone()],
        }
    }
}

/// Token description for `wallet_watchAsset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchAssetParams {
    #[serde(rename = "type")]
    pub kind: String,
    pub options: WatchAssetOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchAssetOptions {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl WatchAssetParams {
    pub fn erc20(address: Address, symbol: &str, decimals: u8, image: Option<String>) -> Self {
        Self {
            kind: "ERC20".to_string(),
            options: WatchAssetOptions {
                address,
                symbol: symbol.to_string(),
                decimals,
                image,
            },
        }
    }
}

/// Transaction object for `eth_sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCall {
    pub from: Address,
    pub to: Address,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
}

/// Typed wrappers over [`Eip1193Provider::request`].
#[async_trait]
pub trait Eip1193Ext: Eip1193Provider {
    /// `eth_requestAccounts`: may prompt the user.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderRpcError> {
        let value = self.request("eth_requestAccounts", json!([])).await?;
        parse(value, "account list")
    }

    /// `eth_accounts`: never prompts; empty when not authorized.
    async fn accounts(&self) -> Result<Vec<Address>, ProviderRpcError> {
        let value = self.request("eth_accounts", json!([])).await?;
        parse(value, "account list")
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderRpcError> {
        let value = self.request("eth_chainId", json!([])).await?;
        match &value {
            Value::String(s) => ChainId::from_hex(s),
            Value::Number(n) => n.as_u64().map(ChainId),
            _ => None,
        }
        .ok_or_else(|| ProviderRpcError::internal(format!("invalid chain id {}", value)))
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderRpcError> {
        self.request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": chain_id.to_hex() }]),
        )
        .await
        .map(|_| ())
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), ProviderRpcError> {
        self.request("wallet_addEthereumChain", json!([params]))
            .await
            .map(|_| ())
    }

    /// Returns whether the wallet accepted the asset.
    async fn watch_asset(&self, params: &WatchAssetParams) -> Result<bool, ProviderRpcError> {
        let value = self.request("wallet_watchAsset", json!(params)).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// `personal_sign` over a UTF-8 message; returns the 0x-prefixed signature.
    async fn personal_sign(&self, message: &str, address: Address) -> Result<String, ProviderRpcError> {
        let data = hex::encode_prefixed(message.as_bytes());
        let value = self.request("personal_sign", json!([data, address])).await?;
        parse(value, "signature")
    }

    async fn send_transaction(&self, call: &TransactionCall) -> Result<TxHash, ProviderRpcError> {
        let value = self.request("eth_sendTransaction", json!([call])).await?;
        parse(value, "transaction hash")
    }

    async fn revoke_permissions(&self) -> Result<(), ProviderRpcError> {
        self.request(
            "wallet_revokePermissions",
            json!([{ "eth_accounts": {} }]),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl<T: Eip1193Provider + ?Sized> Eip1193Ext for T {}

fn parse<T: serde::de::DeserializeOwned>(value: Value, what: &str) -> Result<T, ProviderRpcError> {
    serde_json::from_value(value)
        .map_err(|e| ProviderRpcError::internal(format!("invalid {} in response: {}", what, e)))
}
