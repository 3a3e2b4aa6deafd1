//! Lookup table of the connectors available to this run.

use std::collections::HashMap;
use std::sync::Arc;

use crate::wallet::connector::Connector;
use crate::wallet::types::{ConnectorId, WalletError};

#[derive(Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<ConnectorId, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector under its own id, replacing any previous one.
    pub fn register(&mut self, connector: Arc<dyn Connector>) {
        let id = connector.id();
        if self.connectors.insert(id, connector).is_some() {
            tracing::warn!(connector = %id, "Connector replaced");
        }
    }

    pub fn get(&self, id: ConnectorId) -> Result<Arc<dyn Connector>, WalletError> {
        self.connectors
            .get(&id)
            .cloned()
            .ok_or_else(|| WalletError::ConnectorNotFound(id.to_string()))
    }

    /// Resolve a connector from its string form (as typed by a user or read
    /// back from storage).
    pub fn lookup(&self, id: &str) -> Result<Arc<dyn Connector>, WalletError> {
        self.get(id.parse()?)
    }

    pub fn ids(&self) -> Vec<ConnectorId> {
        ConnectorId::ALL
            .into_iter()
            .filter(|id| self.connectors.contains_key(id))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

impl std::fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("connectors", &self.ids())
            .finish()
    }
}
