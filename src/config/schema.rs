//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dApp client.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the token dApp.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DappConfig {
    /// Target network (chain id, RPC endpoints, explorer).
    pub network: NetworkConfig,

    /// The token contract this client talks to.
    pub contract: ContractConfig,

    /// Session persistence and polling.
    pub session: SessionConfig,

    /// Wallet connector settings.
    pub connectors: ConnectorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Chain ID the dApp expects wallets to be on (e.g., 11155111 for Sepolia).
    pub chain_id: u64,

    /// Human readable chain name used when asking a wallet to add the chain.
    pub chain_name: String,

    /// JSON-RPC endpoints. One is picked at random per session; the rest are failovers.
    pub rpc_urls: Vec<String>,

    /// Block explorer base URL.
    pub explorer_url: String,

    /// Native currency of the chain.
    pub native_currency: NativeCurrency,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations a write waits for.
    pub confirmation_blocks: u32,

    /// Maximum time to wait for a write to confirm, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval while waiting for confirmation, in milliseconds.
    pub receipt_poll_interval_ms: u64,

    /// Extra display names keyed by decimal chain id, on top of the built-in table.
    pub network_names: BTreeMap<String, String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: 11_155_111,
            chain_name: "Sepolia Testnet".to_string(),
            rpc_urls: vec!["https://eth-sepolia.public.blastapi.io".to_string()],
            explorer_url: "https://sepolia.etherscan.io/".to_string(),
            native_currency: NativeCurrency::default(),
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 120,
            receipt_poll_interval_ms: 2000,
            network_names: BTreeMap::new(),
        }
    }
}

/// Native currency descriptor sent with `wallet_addEthereumChain`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for NativeCurrency {
    fn default() -> Self {
        Self {
            name: "Sepolia ETH".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

/// Token contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContractConfig {
    /// Address of the ERC20-like token contract.
    pub address: String,

    /// Optional token image URL passed to `wallet_watchAsset`.
    pub image_url: Option<String>,
}

/// Session persistence and refresh cadence.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path of the key/value file holding the last used connector.
    pub storage_path: String,

    /// Native balance refresh interval in seconds.
    pub poll_interval_secs: u64,

    /// Token view refresh interval in seconds (watch mode).
    pub slow_poll_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_path: "dapp-session.json".to_string(),
            poll_interval_secs: 10,
            slow_poll_interval_secs: 60,
        }
    }
}

/// Connector configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ConnectorsConfig {
    pub injected: InjectedConfig,
    pub walletconnect: WalletConnectConfig,
}

/// Injected (local key) connector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InjectedConfig {
    /// Register the injected connector.
    pub enabled: bool,

    /// Environment variable holding the wallet's private key.
    pub private_key_env: String,
}

impl Default for InjectedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            private_key_env: "DAPP_PRIVATE_KEY".to_string(),
        }
    }
}

/// Remote signer (QR pairing) connector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConnectConfig {
    /// Register the walletconnect connector.
    pub enabled: bool,

    /// Project identifier sent to the relay.
    pub project_id: String,

    /// Relay endpoint forwarding requests to the paired wallet.
    pub relay_url: String,

    /// How long to wait for the remote wallet to approve a pairing, in seconds.
    pub approval_timeout_secs: u64,

    /// Poll interval while waiting for approval, in milliseconds.
    pub approval_poll_interval_ms: u64,
}

impl Default for WalletConnectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            project_id: String::new(),
            relay_url: "https://relay.walletconnect.com".to_string(),
            approval_timeout_secs: 120,
            approval_poll_interval_ms: 1000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
