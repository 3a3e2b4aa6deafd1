//! Read-only RPC client with timeout and failover.
//!
//! # Responsibilities
//! - Connect to the configured JSON-RPC endpoints
//! - Pick one endpoint at random per session, keep the rest as failovers
//! - Query chain state (chain id, block number, balances, receipts, calls)
//! - Handle timeouts and network errors gracefully

use std::future::Future;
use std::time::Duration;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use rand::Rng;
use tokio::time::timeout;

use crate::blockchain::types::{
    BlockchainError, BlockchainResult, ChainId, ChainReader, ReceiptInfo,
};
use crate::config::NetworkConfig;

/// RPC read client wrapper with failover support.
#[derive(Clone)]
pub struct ReadClient {
    /// Providers in try order: the session's random pick first, then failovers.
    providers: Vec<DynProvider>,
    /// Endpoint URLs in the same order as `providers`.
    urls: Vec<String>,
    /// Chain the dApp is configured for.
    expected_chain_id: u64,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl ReadClient {
    /// Create a new read client.
    ///
    /// Invalid URLs are skipped with a warning; at least one must be usable.
    /// A chain id mismatch is logged but does not fail construction.
    pub async fn connect(config: &NetworkConfig) -> BlockchainResult<Self> {
        let client = Self::new(config)?;

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %client.urls[0],
                    chain_id = config.chain_id,
                    "Read client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Read client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Build the client without touching the network.
    pub fn new(config: &NetworkConfig) -> BlockchainResult<Self> {
        let mut urls: Vec<String> = Vec::new();
        let mut providers = Vec::new();

        for url_str in &config.rpc_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => {
                    providers.push(ProviderBuilder::new().connect_http(url).erased());
                    urls.push(url_str.clone());
                }
                Err(e) => {
                    tracing::warn!(url = %url_str, error = %e, "Ignoring invalid RPC URL");
                }
            }
        }

        if providers.is_empty() {
            return Err(BlockchainError::NotAvailable(
                "no usable RPC endpoint configured".to_string(),
            ));
        }

        let preferred = rand::thread_rng().gen_range(0..providers.len());
        providers.rotate_left(preferred);
        urls.rotate_left(preferred);

        Ok(Self {
            providers,
            urls,
            expected_chain_id: config.chain_id,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
        })
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let chain_id = self.chain_id().await?;
        if chain_id.0 != self.expected_chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.expected_chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// The endpoint picked for this session.
    pub fn preferred_url(&self) -> &str {
        &self.urls[0]
    }

    /// Get the underlying preferred provider.
    pub fn provider(&self) -> &DynProvider {
        &self.providers[0]
    }

    /// Check if the chain is reachable.
    pub async fn is_healthy(&self) -> bool {
        self.block_number().await.is_ok()
    }

    /// Run `op` against each provider in order until one succeeds.
    async fn with_failover<T, E, F, Fut>(&self, op: &'static str, f: F) -> BlockchainResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, f(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, op, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, op, "RPC timeout, trying next provider");
                }
            }
        }
        Err(BlockchainError::Rpc(format!(
            "All RPC providers failed to {}",
            op
        )))
    }
}

#[async_trait]
impl ChainReader for ReadClient {
    async fn chain_id(&self) -> BlockchainResult<ChainId> {
        self.with_failover("get chain id", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.with_failover("get block number", |p| async move {
            p.get_block_number().await
        })
        .await
    }

    async fn balance(&self, address: Address) -> BlockchainResult<U256> {
        self.with_failover("get balance", |p| async move {
            p.get_balance(address).await
        })
        .await
    }

    async fn call(&self, to: Address, data: Bytes) -> BlockchainResult<Bytes> {
        let tx = TransactionRequest::default().with_to(to).with_input(data);
        self.with_failover("call contract", |p| {
            let tx = tx.clone();
            async move { p.call(tx).await }
        })
        .await
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<ReceiptInfo>> {
        let receipt = self
            .with_failover("get receipt", |p| async move {
                p.get_transaction_receipt(tx_hash).await
            })
            .await?;

        Ok(receipt.map(|r| ReceiptInfo {
            success: r.status(),
            block_number: r.block_number,
        }))
    }
}

impl std::fmt::Debug for ReadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadClient")
            .field("urls", &self.urls)
            .field("chain_id", &self.expected_chain_id)
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}
