//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that addresses and URLs parse
//! - Validate value ranges (intervals > 0, chain id set)
//! - Require walletconnect settings when that connector is enabled
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DappConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::Address;

use crate::config::schema::DappConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &DappConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.network.chain_id == 0 {
        errors.push(ValidationError::new("network.chain_id", "must be non-zero"));
    }

    if config.network.rpc_urls.is_empty() {
        errors.push(ValidationError::new(
            "network.rpc_urls",
            "at least one RPC endpoint is required",
        ));
    }
    for url_str in &config.network.rpc_urls {
        if let Err(e) = url::Url::parse(url_str) {
            errors.push(ValidationError::new(
                "network.rpc_urls",
                format!("invalid URL '{}': {}", url_str, e),
            ));
        }
    }

    if config.network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be > 0"));
    }
    if config.network.receipt_poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "network.receipt_poll_interval_ms",
            "must be > 0",
        ));
    }
    if config.network.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "network.confirmation_timeout_secs",
            "must be > 0",
        ));
    }
    for key in config.network.network_names.keys() {
        if key.parse::<u64>().is_err() {
            errors.push(ValidationError::new(
                "network.network_names",
                format!("key '{}' is not a decimal chain id", key),
            ));
        }
    }

    if !config.contract.address.is_empty() && config.contract.address.parse::<Address>().is_err() {
        errors.push(ValidationError::new(
            "contract.address",
            format!("'{}' is not a valid address", config.contract.address),
        ));
    }

    if config.session.storage_path.is_empty() {
        errors.push(ValidationError::new("session.storage_path", "must not be empty"));
    }
    if config.session.poll_interval_secs == 0 {
        errors.push(ValidationError::new("session.poll_interval_secs", "must be > 0"));
    }
    if config.session.slow_poll_interval_secs == 0 {
        errors.push(ValidationError::new(
            "session.slow_poll_interval_secs",
            "must be > 0",
        ));
    }

    let wc = &config.connectors.walletconnect;
    if wc.enabled {
        if wc.project_id.is_empty() {
            errors.push(ValidationError::new(
                "connectors.walletconnect.project_id",
                "required when walletconnect is enabled",
            ));
        }
        if url::Url::parse(&wc.relay_url).is_err() {
            errors.push(ValidationError::new(
                "connectors.walletconnect.relay_url",
                format!("invalid URL '{}'", wc.relay_url),
            ));
        }
    }
    if wc.approval_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "connectors.walletconnect.approval_timeout_secs",
            "must be > 0",
        ));
    }
    if wc.approval_poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "connectors.walletconnect.approval_poll_interval_ms",
            "must be > 0",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
