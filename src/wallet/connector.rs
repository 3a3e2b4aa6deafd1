//! The uniform capability set every connector implements.

use std::sync::Arc;

use async_trait::async_trait;

use crate::wallet::eip1193::Eip1193Provider;
use crate::wallet::types::{Activation, ConnectorId, WalletError};

/// Adapter for one wallet transport.
#[async_trait]
pub trait Connector: Send + Sync {
    fn id(&self) -> ConnectorId;

    /// The transport behind this connector, if one is installed.
    fn provider(&self) -> Option<Arc<dyn Eip1193Provider>>;

    /// Interactive activation: may prompt the user or show a pairing code.
    async fn activate(&self) -> Result<Activation, WalletError>;

    /// Silent reconnection using previously granted access. Never prompts.
    async fn connect_eagerly(&self) -> Result<Activation, WalletError>;

    async fn deactivate(&self) -> Result<(), WalletError>;
}
