//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::DappConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `network.chain_id`.
pub const ENV_CHAIN_ID: &str = "DAPP_CHAIN_ID";
/// Comma separated list overriding `network.rpc_urls`.
pub const ENV_RPC_URLS: &str = "DAPP_RPC_URLS";
/// Environment variable overriding `contract.address`.
pub const ENV_CONTRACT_ADDRESS: &str = "DAPP_CONTRACT_ADDRESS";
/// Environment variable overriding `connectors.walletconnect.project_id`.
pub const ENV_WALLETCONNECT_PROJECT_ID: &str = "DAPP_WALLETCONNECT_PROJECT_ID";
/// Environment variable overriding `connectors.walletconnect.relay_url`.
pub const ENV_RELAY_URL: &str = "DAPP_RELAY_URL";
/// Environment variable overriding `session.storage_path`.
pub const ENV_SESSION_PATH: &str = "DAPP_SESSION_PATH";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from a TOML file, apply environment overrides and validate.
pub fn load_config(path: &Path) -> Result<DappConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: DappConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;
    finish(config, |key| std::env::var(key).ok())
}

/// Build configuration from defaults plus environment overrides only.
pub fn load_from_env() -> Result<DappConfig, ConfigError> {
    finish(DappConfig::default(), |key| std::env::var(key).ok())
}

fn finish<F>(mut config: DappConfig, lookup: F) -> Result<DappConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply `DAPP_*` overrides on top of file values.
pub fn apply_env_overrides<F>(config: &mut DappConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_CHAIN_ID) {
        config.network.chain_id = parse_chain_id(&raw).ok_or_else(|| ConfigError::Env {
            var: ENV_CHAIN_ID,
            message: format!("'{}' is not a chain id", raw),
        })?;
    }

    if let Some(raw) = lookup(ENV_RPC_URLS) {
        let urls: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if !urls.is_empty() {
            config.network.rpc_urls = urls;
        }
    }

    if let Some(address) = lookup(ENV_CONTRACT_ADDRESS) {
        config.contract.address = address;
    }
    if let Some(project_id) = lookup(ENV_WALLETCONNECT_PROJECT_ID) {
        config.connectors.walletconnect.project_id = project_id;
    }
    if let Some(relay_url) = lookup(ENV_RELAY_URL) {
        config.connectors.walletconnect.relay_url = relay_url;
    }
    if let Some(path) = lookup(ENV_SESSION_PATH) {
        config.session.storage_path = path;
    }

    Ok(())
}

/// Chain ids are accepted in decimal or `0x` hex form.
fn parse_chain_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let mut config = DappConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                (ENV_CHAIN_ID, "0x89"),
                (ENV_RPC_URLS, "http://a:8545, http://b:8545"),
                (ENV_CONTRACT_ADDRESS, "0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            ]),
        )
        .unwrap();

        assert_eq!(config.network.chain_id, 137);
        assert_eq!(config.network.rpc_urls, vec!["http://a:8545", "http://b:8545"]);
        assert_eq!(
            config.contract.address,
            "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
    }

    #[test]
    fn test_invalid_chain_id_env() {
        let mut config = DappConfig::default();
        let err = apply_env_overrides(&mut config, env(&[(ENV_CHAIN_ID, "sepolia")])).unwrap_err();
        assert!(err.to_string().contains(ENV_CHAIN_ID));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [network]
            chain_id = 31337
            rpc_urls = ["http://localhost:8545"]

            [session]
            poll_interval_secs = 5
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.session.poll_interval_secs, 5);
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[network]\nrpc_urls = []").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
