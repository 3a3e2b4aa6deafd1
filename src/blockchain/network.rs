//! Chain id → display name lookup.

use std::collections::HashMap;

use crate::config::NetworkConfig;

/// Built-in names for well-known chains.
const KNOWN_NETWORKS: &[(u64, &str)] = &[
    (1, "Ethereum Mainnet"),
    (3, "Ropsten Testnet"),
    (4, "Rinkeby Testnet"),
    (5, "Goerli Testnet"),
    (42, "Kovan Testnet"),
    (56, "Binance Smart Chain"),
    (137, "Polygon Mainnet"),
    (11_155_111, "Sepolia Testnet"),
];

/// Static table mapping chain ids to human readable network labels.
#[derive(Debug, Clone)]
pub struct NetworkNames {
    names: HashMap<u64, String>,
}

impl NetworkNames {
    /// Built-in table only.
    pub fn builtin() -> Self {
        Self {
            names: KNOWN_NETWORKS
                .iter()
                .map(|(id, name)| (*id, (*name).to_string()))
                .collect(),
        }
    }

    /// Built-in table extended (or overridden) by `network.network_names`.
    pub fn from_config(config: &NetworkConfig) -> Self {
        let mut table = Self::builtin();
        for (key, name) in &config.network_names {
            match key.parse::<u64>() {
                Ok(id) => {
                    table.names.insert(id, name.clone());
                }
                Err(_) => tracing::warn!(key = %key, "Ignoring non-numeric network name key"),
            }
        }
        table
    }

    /// Label for `chain_id`; unknown ids get a synthesized label.
    pub fn label(&self, chain_id: u64) -> String {
        self.names
            .get(&chain_id)
            .cloned()
            .unwrap_or_else(|| format!("Chain ID: {}", chain_id))
    }
}

impl Default for NetworkNames {
    fn default() -> Self {
        Self::builtin()
    }
}
