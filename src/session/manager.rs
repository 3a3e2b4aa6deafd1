//! The connection session: single owner of the wallet connection state.
//!
//! # Responsibilities
//! - Drive connectors through connect / disconnect / eager reconnect
//! - Persist the last connector id as a reconnection hint
//! - Apply provider events (account, chain, disconnect) in place
//!
//! # Concurrency
//! - A busy flag per connector drops duplicate concurrent operations
//! - Every transition bumps an epoch; results of operations started under an
//!   older epoch are discarded
//! - The event listener only holds a weak reference, so dropping the last
//!   session handle stops it

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::observability::metrics;
use crate::session::state::ConnectionState;
use crate::session::store::{SessionStore, CONNECTOR_ID_KEY};
use crate::wallet::{Connector, ConnectorId, ConnectorRegistry, ProviderEvent, WalletError};

/// Cloneable handle to the connection session.
#[derive(Clone)]
pub struct ConnectionSession {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Arc<ConnectorRegistry>,
    store: Arc<dyn SessionStore>,
    state: watch::Sender<ConnectionState>,
    busy: DashMap<ConnectorId, ()>,
    epoch: AtomicU64,
    listener: Mutex<Option<JoinHandle<()>>>,
}

/// Releases the busy flag of a connector when dropped.
struct BusyGuard<'a> {
    busy: &'a DashMap<ConnectorId, ()>,
    id: ConnectorId,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.remove(&self.id);
    }
}

impl Inner {
    fn try_busy(&self, id: ConnectorId) -> Option<BusyGuard<'_>> {
        match self.busy.entry(id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(entry) => {
                entry.insert(());
                Some(BusyGuard {
                    busy: &self.busy,
                    id,
                })
            }
        }
    }

    fn stop_listener(&self) {
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.stop_listener();
    }
}

impl ConnectionSession {
    pub fn new(registry: Arc<ConnectorRegistry>, store: Arc<dyn SessionStore>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                registry,
                store,
                state,
                busy: DashMap::new(),
                epoch: AtomicU64::new(0),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ConnectionState {
        self.inner.state.borrow().clone()
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn registry(&self) -> &Arc<ConnectorRegistry> {
        &self.inner.registry
    }

    /// Persisted reconnection hint, if any.
    pub fn persisted_connector(&self) -> Option<String> {
        self.inner.store.get(CONNECTOR_ID_KEY)
    }

    /// Connector of the current `Connected` state.
    pub fn active_connector(&self) -> Option<Arc<dyn Connector>> {
        match self.state() {
            ConnectionState::Connected { connector, .. } => self.inner.registry.get(connector).ok(),
            _ => None,
        }
    }

    /// Connect with `id`, or disconnect if that connector is already the
    /// active one.
    ///
    /// An unknown id fails with `ConnectorNotFound` and leaves the state
    /// untouched. A failed activation moves to `Error` and is returned.
    pub async fn connect(&self, id: &str) -> Result<ConnectionState, WalletError> {
        let connector = self.inner.registry.lookup(id)?;
        let id = connector.id();
        let current = self.state();

        if let ConnectionState::Connected { connector: active, .. } = current {
            if active == id {
                tracing::info!(connector = %id, "Connector already active, disconnecting");
                self.disconnect().await;
                return Ok(self.state());
            }
        }

        let Some(_busy) = self.inner.try_busy(id) else {
            tracing::debug!(connector = %id, "Connect already in progress");
            return Ok(self.state());
        };

        let epoch = self.bump_epoch();
        self.inner.stop_listener();
        self.set_state(ConnectionState::Connecting { connector: id });

        if let ConnectionState::Connected { connector: previous, .. } = current {
            self.deactivate_quietly(previous).await;
        }

        tracing::info!(connector = %id, "Connecting wallet");
        match connector.activate().await {
            Ok(activation) => {
                if !self.is_current(epoch) {
                    tracing::debug!(connector = %id, "Connect superseded, releasing wallet");
                    self.deactivate_quietly(id).await;
                    return Ok(self.state());
                }

                self.persist(id);
                self.set_state(ConnectionState::connected(id, activation));
                self.spawn_listener(id, connector.as_ref(), epoch);
                metrics::record_connect(id.as_str(), "success");
                tracing::info!(
                    connector = %id,
                    account = %activation.account,
                    chain_id = %activation.chain_id,
                    "Wallet connected"
                );
                Ok(self.state())
            }
            Err(e) => {
                let outcome = if e == WalletError::UserRejected {
                    "rejected"
                } else {
                    "failure"
                };
                metrics::record_connect(id.as_str(), outcome);

                if self.is_current(epoch) {
                    tracing::warn!(connector = %id, error = %e, "Wallet connection failed");
                    self.clear_persisted();
                    self.set_state(ConnectionState::Error {
                        connector: id,
                        message: e.to_string(),
                    });
                }
                Err(e)
            }
        }
    }

    /// Drop the connection. Deactivation problems are logged; the persisted
    /// hint is cleared and the state ends `Disconnected` regardless.
    pub async fn disconnect(&self) {
        let state = self.state();
        let active = match state {
            ConnectionState::Connected { connector, .. } => Some(connector),
            _ => None,
        };

        let _busy = match active {
            Some(id) => match self.inner.try_busy(id) {
                Some(guard) => Some(guard),
                None => {
                    tracing::debug!(connector = %id, "Disconnect already in progress");
                    return;
                }
            },
            None => None,
        };

        self.force_disconnect("user request");

        if let Some(id) = active {
            self.deactivate_quietly(id).await;
        }
    }

    /// Silent reconnection through the persisted connector id.
    ///
    /// Never prompts. Failures are logged, clear the stale hint and leave the
    /// session `Disconnected`.
    pub async fn eager_connect(&self) -> ConnectionState {
        let Some(raw) = self.persisted_connector() else {
            return self.state();
        };
        if self.state() != ConnectionState::Disconnected {
            return self.state();
        }

        let connector = match self.inner.registry.lookup(&raw) {
            Ok(connector) => connector,
            Err(e) => {
                tracing::warn!(connector = %raw, error = %e, "Persisted connector unavailable");
                self.clear_persisted();
                return self.state();
            }
        };
        let id = connector.id();

        let Some(_busy) = self.inner.try_busy(id) else {
            return self.state();
        };
        let epoch = self.bump_epoch();
        self.set_state(ConnectionState::Connecting { connector: id });

        match connector.connect_eagerly().await {
            Ok(activation) if self.is_current(epoch) => {
                self.set_state(ConnectionState::connected(id, activation));
                self.spawn_listener(id, connector.as_ref(), epoch);
                metrics::record_connect(id.as_str(), "eager");
                tracing::info!(
                    connector = %id,
                    account = %activation.account,
                    "Wallet reconnected"
                );
            }
            Ok(_) => {
                tracing::debug!(connector = %id, "Eager connect superseded, releasing wallet");
                if self.state().connector() != Some(id) {
                    self.deactivate_quietly(id).await;
                }
            }
            Err(e) if self.is_current(epoch) => {
                tracing::info!(connector = %id, error = %e, "Eager connection failed");
                self.clear_persisted();
                self.set_state(ConnectionState::Disconnected);
            }
            Err(e) => {
                tracing::debug!(connector = %id, error = %e, "Superseded eager connection failed");
            }
        }
        self.state()
    }

    /// Leave the `Error` state.
    pub fn acknowledge_error(&self) {
        self.inner.state.send_if_modified(|state| {
            if matches!(state, ConnectionState::Error { .. }) {
                *state = ConnectionState::Disconnected;
                true
            } else {
                false
            }
        });
    }

    /// Apply a provider event emitted by connector `source`.
    ///
    /// Events from a connector other than the active one are ignored.
    pub fn handle_event(&self, source: ConnectorId, event: ProviderEvent) {
        let ConnectionState::Connected { connector, .. } = self.state() else {
            return;
        };
        if connector != source {
            return;
        }

        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                None => {
                    tracing::info!(connector = %source, "Wallet returned no accounts, disconnecting");
                    self.force_disconnect("accounts cleared");
                }
                Some(&next) => {
                    let changed = self.inner.state.send_if_modified(|state| match state {
                        ConnectionState::Connected { account, .. } if *account != next => {
                            *account = next;
                            true
                        }
                        _ => false,
                    });
                    if changed {
                        tracing::info!(account = %next, "Active account changed");
                    }
                }
            },
            ProviderEvent::ChainChanged(next) => {
                let changed = self.inner.state.send_if_modified(|state| match state {
                    ConnectionState::Connected { chain_id, .. } if *chain_id != next => {
                        *chain_id = next;
                        true
                    }
                    _ => false,
                });
                if changed {
                    tracing::info!(chain_id = %next, "Wallet network changed");
                }
            }
            ProviderEvent::Disconnect(error) => {
                tracing::warn!(connector = %source, error = %error, "Provider disconnected");
                self.force_disconnect("provider disconnect");
            }
        }
    }

    fn force_disconnect(&self, reason: &'static str) {
        self.bump_epoch();
        self.inner.stop_listener();
        self.clear_persisted();
        self.set_state(ConnectionState::Disconnected);
        tracing::info!(reason, "Wallet disconnected");
    }

    async fn deactivate_quietly(&self, id: ConnectorId) {
        let Ok(connector) = self.inner.registry.get(id) else {
            return;
        };
        if let Err(e) = connector.deactivate().await {
            tracing::warn!(connector = %id, error = %e, "Connector deactivation failed");
        }
    }

    fn spawn_listener(&self, id: ConnectorId, connector: &dyn Connector, epoch: u64) {
        let Some(provider) = connector.provider() else {
            return;
        };
        let events = provider.subscribe();
        let session = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(listen(session, id, events, epoch));

        if let Ok(mut listener) = self.inner.listener.lock() {
            if let Some(previous) = listener.replace(handle) {
                previous.abort();
            }
        }
    }

    fn set_state(&self, next: ConnectionState) {
        metrics::record_connected(next.is_connected());
        let previous = self.inner.state.send_replace(next);
        tracing::debug!(from = previous.label(), to = self.inner.state.borrow().label(), "State transition");
    }

    fn bump_epoch(&self) -> u64 {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.inner.epoch.load(Ordering::SeqCst) == epoch
    }

    fn persist(&self, id: ConnectorId) {
        if let Err(e) = self.inner.store.set(CONNECTOR_ID_KEY, id.as_str()) {
            tracing::warn!(connector = %id, error = %e, "Failed to persist connector id");
        }
    }

    fn clear_persisted(&self) {
        if let Err(e) = self.inner.store.remove(CONNECTOR_ID_KEY) {
            tracing::warn!(error = %e, "Failed to clear persisted connector id");
        }
    }
}

async fn listen(
    session: Weak<Inner>,
    id: ConnectorId,
    mut events: broadcast::Receiver<ProviderEvent>,
    epoch: u64,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let Some(inner) = session.upgrade() else {
                    break;
                };
                let handle = ConnectionSession { inner };
                if !handle.is_current(epoch) {
                    break;
                }
                handle.handle_event(id, event);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(connector = %id, skipped, "Provider events lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

impl std::fmt::Debug for ConnectionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSession")
            .field("state", &self.state())
            .field("epoch", &self.inner.epoch.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ChainId;
    use crate::session::store::MemoryStore;
    use crate::wallet::{Activation, Eip1193Provider, ProviderRpcError};
    use alloy::primitives::{address, Address};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    const ACCOUNT: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const OTHER: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

    struct Events(broadcast::Sender<ProviderEvent>);

    #[async_trait]
    impl Eip1193Provider for Events {
        async fn request(&self, method: &str, _params: Value) -> Result<Value, ProviderRpcError> {
            Err(ProviderRpcError::unsupported(method))
        }

        fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
            self.0.subscribe()
        }
    }

    struct FakeConnector {
        id: ConnectorId,
        fail: Option<WalletError>,
        gate: Option<Arc<Notify>>,
        provider: Arc<Events>,
        activations: AtomicUsize,
        eager_attempts: AtomicUsize,
        deactivations: AtomicUsize,
    }

    impl FakeConnector {
        fn new(id: ConnectorId) -> Self {
            Self {
                id,
                fail: None,
                gate: None,
                provider: Arc::new(Events(broadcast::channel(8).0)),
                activations: AtomicUsize::new(0),
                eager_attempts: AtomicUsize::new(0),
                deactivations: AtomicUsize::new(0),
            }
        }

        fn emit(&self, event: ProviderEvent) {
            let _ = self.provider.0.send(event);
        }
    }

    #[async_trait]
    impl Connector for FakeConnector {
        fn id(&self) -> ConnectorId {
            self.id
        }

        fn provider(&self) -> Option<Arc<dyn Eip1193Provider>> {
            Some(self.provider.clone())
        }

        async fn activate(&self) -> Result<Activation, WalletError> {
            self.activations.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match &self.fail {
                Some(e) => Err(e.clone()),
                None => Ok(Activation {
                    account: ACCOUNT,
                    chain_id: ChainId(11_155_111),
                }),
            }
        }

        async fn connect_eagerly(&self) -> Result<Activation, WalletError> {
            self.eager_attempts.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match &self.fail {
                Some(_) => Err(WalletError::NoAccounts),
                None => Ok(Activation {
                    account: ACCOUNT,
                    chain_id: ChainId(11_155_111),
                }),
            }
        }

        async fn deactivate(&self) -> Result<(), WalletError> {
            self.deactivations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn session_with(
        connectors: Vec<Arc<FakeConnector>>,
    ) -> (ConnectionSession, Arc<MemoryStore>) {
        let mut registry = ConnectorRegistry::new();
        for connector in connectors {
            registry.register(connector);
        }
        let store = Arc::new(MemoryStore::new());
        (ConnectionSession::new(Arc::new(registry), store.clone()), store)
    }

    #[tokio::test]
    async fn test_unknown_connector_leaves_state() {
        let (session, _) = session_with(vec![]);
        let err = session.connect("metamask-snap").await.unwrap_err();
        assert_eq!(err, WalletError::ConnectorNotFound("metamask-snap".to_string()));
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_persists_and_toggle_disconnects() {
        let injected = Arc::new(FakeConnector::new(ConnectorId::Injected));
        let (session, store) = session_with(vec![injected.clone()]);

        let state = session.connect("injected").await.unwrap();
        assert_eq!(state.account(), Some(ACCOUNT));
        assert_eq!(store.get(CONNECTOR_ID_KEY).as_deref(), Some("injected"));

        let state = session.connect("injected").await.unwrap();
        assert_eq!(state, ConnectionState::Disconnected);
        assert!(store.get(CONNECTOR_ID_KEY).is_none());
        assert_eq!(injected.deactivations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_connect_enters_error() {
        let mut connector = FakeConnector::new(ConnectorId::Injected);
        connector.fail = Some(WalletError::UserRejected);
        let (session, store) = session_with(vec![Arc::new(connector)]);
        store.set(CONNECTOR_ID_KEY, "injected").unwrap();

        let err = session.connect("injected").await.unwrap_err();
        assert_eq!(err, WalletError::UserRejected);
        assert!(matches!(session.state(), ConnectionState::Error { .. }));
        assert!(store.get(CONNECTOR_ID_KEY).is_none());

        session.acknowledge_error();
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_switching_connector_deactivates_previous() {
        let injected = Arc::new(FakeConnector::new(ConnectorId::Injected));
        let remote = Arc::new(FakeConnector::new(ConnectorId::WalletConnect));
        let (session, store) = session_with(vec![injected.clone(), remote.clone()]);

        session.connect("injected").await.unwrap();
        let state = session.connect("walletconnect").await.unwrap();

        assert_eq!(state.connector(), Some(ConnectorId::WalletConnect));
        assert_eq!(injected.deactivations.load(Ordering::SeqCst), 1);
        assert_eq!(store.get(CONNECTOR_ID_KEY).as_deref(), Some("walletconnect"));
    }

    #[tokio::test]
    async fn test_duplicate_connect_is_suppressed() {
        let gate = Arc::new(Notify::new());
        let mut connector = FakeConnector::new(ConnectorId::Injected);
        connector.gate = Some(gate.clone());
        let connector = Arc::new(connector);
        let (session, _) = session_with(vec![connector.clone()]);

        let first = tokio::spawn({
            let session = session.clone();
            async move { session.connect("injected").await }
        });
        while connector.activations.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let second = session.connect("injected").await.unwrap();
        assert_eq!(second, ConnectionState::Connecting { connector: ConnectorId::Injected });

        gate.notify_one();
        assert!(first.await.unwrap().unwrap().is_connected());
        assert_eq!(connector.activations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disconnect_during_connect_discards_result() {
        let gate = Arc::new(Notify::new());
        let mut connector = FakeConnector::new(ConnectorId::Injected);
        connector.gate = Some(gate.clone());
        let connector = Arc::new(connector);
        let (session, store) = session_with(vec![connector.clone()]);

        let pending = tokio::spawn({
            let session = session.clone();
            async move { session.connect("injected").await }
        });
        while connector.activations.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        session.disconnect().await;
        gate.notify_one();
        pending.await.unwrap().unwrap();

        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert!(store.get(CONNECTOR_ID_KEY).is_none());
        assert_eq!(connector.deactivations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_eager_connect() {
        let (session, store) = session_with(vec![Arc::new(FakeConnector::new(ConnectorId::Injected))]);
        assert_eq!(session.eager_connect().await, ConnectionState::Disconnected);

        store.set(CONNECTOR_ID_KEY, "injected").unwrap();
        assert!(session.eager_connect().await.is_connected());
    }

    #[tokio::test]
    async fn test_eager_connect_failure_clears_hint() {
        let mut connector = FakeConnector::new(ConnectorId::Injected);
        connector.fail = Some(WalletError::NoAccounts);
        let (session, store) = session_with(vec![Arc::new(connector)]);

        store.set(CONNECTOR_ID_KEY, "injected").unwrap();
        assert_eq!(session.eager_connect().await, ConnectionState::Disconnected);
        assert!(store.get(CONNECTOR_ID_KEY).is_none());

        store.set(CONNECTOR_ID_KEY, "ledger").unwrap();
        assert_eq!(session.eager_connect().await, ConnectionState::Disconnected);
        assert!(store.get(CONNECTOR_ID_KEY).is_none());
    }

    /// Start an eager reconnect on a gated `injected`, connect `walletconnect`
    /// meanwhile, then let the eager attempt finish.
    async fn eager_then_switch(
        injected: Arc<FakeConnector>,
        gate: Arc<Notify>,
    ) -> (ConnectionSession, Arc<MemoryStore>) {
        let walletconnect = Arc::new(FakeConnector::new(ConnectorId::WalletConnect));
        let (session, store) = session_with(vec![injected.clone(), walletconnect]);
        store.set(CONNECTOR_ID_KEY, "injected").unwrap();

        let eager = tokio::spawn({
            let session = session.clone();
            async move { session.eager_connect().await }
        });
        while injected.eager_attempts.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let state = session.connect("walletconnect").await.unwrap();
        assert_eq!(state.connector(), Some(ConnectorId::WalletConnect));

        gate.notify_one();
        eager.await.unwrap();
        (session, store)
    }

    #[tokio::test]
    async fn test_late_eager_failure_keeps_newer_session() {
        let gate = Arc::new(Notify::new());
        let mut injected = FakeConnector::new(ConnectorId::Injected);
        injected.gate = Some(gate.clone());
        injected.fail = Some(WalletError::NoAccounts);

        let (session, store) = eager_then_switch(Arc::new(injected), gate).await;
        assert_eq!(session.state().connector(), Some(ConnectorId::WalletConnect));
        assert_eq!(store.get(CONNECTOR_ID_KEY).as_deref(), Some("walletconnect"));
    }

    #[tokio::test]
    async fn test_late_eager_success_releases_wallet() {
        let gate = Arc::new(Notify::new());
        let mut injected = FakeConnector::new(ConnectorId::Injected);
        injected.gate = Some(gate.clone());
        let injected = Arc::new(injected);

        let (session, store) = eager_then_switch(injected.clone(), gate).await;
        assert_eq!(session.state().connector(), Some(ConnectorId::WalletConnect));
        assert_eq!(store.get(CONNECTOR_ID_KEY).as_deref(), Some("walletconnect"));
        assert_eq!(injected.deactivations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_events_update_in_place() {
        let (session, _) = session_with(vec![Arc::new(FakeConnector::new(ConnectorId::Injected))]);
        session.connect("injected").await.unwrap();

        session.handle_event(ConnectorId::Injected, ProviderEvent::AccountsChanged(vec![OTHER]));
        assert_eq!(session.state().account(), Some(OTHER));

        session.handle_event(ConnectorId::Injected, ProviderEvent::ChainChanged(ChainId(137)));
        assert_eq!(session.state().chain_id(), Some(ChainId(137)));

        // Events from an inactive connector are ignored.
        session.handle_event(ConnectorId::WalletConnect, ProviderEvent::AccountsChanged(vec![]));
        assert!(session.state().is_connected());
    }

    #[tokio::test]
    async fn test_listener_forces_disconnect_on_empty_accounts() {
        let connector = Arc::new(FakeConnector::new(ConnectorId::Injected));
        let (session, store) = session_with(vec![connector.clone()]);
        session.connect("injected").await.unwrap();

        let mut states = session.subscribe();
        connector.emit(ProviderEvent::AccountsChanged(vec![]));
        states
            .wait_for(|state| *state == ConnectionState::Disconnected)
            .await
            .unwrap();
        assert!(store.get(CONNECTOR_ID_KEY).is_none());
    }

    #[tokio::test]
    async fn test_listener_handles_provider_disconnect() {
        let connector = Arc::new(FakeConnector::new(ConnectorId::Injected));
        let (session, _) = session_with(vec![connector.clone()]);
        session.connect("injected").await.unwrap();

        let mut states = session.subscribe();
        connector.emit(ProviderEvent::Disconnect(ProviderRpcError::new(4900, "gone")));
        states
            .wait_for(|state| *state == ConnectionState::Disconnected)
            .await
            .unwrap();
    }
}
