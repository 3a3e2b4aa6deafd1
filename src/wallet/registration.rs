//! Asking the wallet to switch/add the dApp chain and to track the token.

use crate::blockchain::ChainId;
use crate::config::NetworkConfig;
use crate::wallet::eip1193::{AddChainParams, Eip1193Ext, Eip1193Provider, WatchAssetParams, UNRECOGNIZED_CHAIN};
use crate::wallet::types::WalletError;

/// Switch the wallet to the configured chain, adding it first if the wallet
/// does not know it.
pub async fn setup_network(
    provider: &dyn Eip1193Provider,
    network: &NetworkConfig,
) -> Result<(), WalletError> {
    let target = ChainId(network.chain_id);

    match provider.switch_chain(target).await {
        Ok(()) => {
            tracing::info!(chain_id = %target, "Wallet switched network");
            Ok(())
        }
        Err(e) if e.code == UNRECOGNIZED_CHAIN => {
            tracing::info!(
                chain_id = %target,
                chain_name = %network.chain_name,
                "Chain unknown to wallet, requesting add"
            );
            provider
                .add_chain(&AddChainParams::from_config(network))
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to add network");
                    WalletError::from(e)
                })
        }
        Err(e) => {
            tracing::error!(chain_id = %target, error = %e, "Failed to switch network");
            Err(e.into())
        }
    }
}

/// Ask the wallet to track the token. Returns whether the user accepted.
pub async fn register_token(
    provider: &dyn Eip1193Provider,
    asset: &WatchAssetParams,
) -> Result<bool, WalletError> {
    let added = provider.watch_asset(asset).await?;
    tracing::info!(
        token = %asset.options.address,
        symbol = %asset.options.symbol,
        added,
        "Token registration answered"
    );
    Ok(added)
}
