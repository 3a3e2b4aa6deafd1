//! Connection lifecycle through the application context: connect, toggle,
//! persistence, silent reconnection and wallet-pushed events.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{context, context_with, FakeChain, FakeWallet, ACCOUNT, OTHER, SEPOLIA};
use token_dapp::blockchain::ChainId;
use token_dapp::errors::{ErrorKind, Notification};
use token_dapp::session::{FileStore, MemoryStore, SessionStore, CONNECTOR_ID_KEY};
use token_dapp::wallet::{ConnectorId, ProviderEvent, ProviderRpcError, WalletError};
use token_dapp::{ConnectionState, DappError};
use tokio::time::timeout;

async fn wait_for_state(
    context: &token_dapp::DappContext,
    predicate: impl FnMut(&ConnectionState) -> bool,
) -> ConnectionState {
    let mut states = context.session.subscribe();
    let state = timeout(Duration::from_secs(5), states.wait_for(predicate))
        .await
        .expect("state change timed out")
        .expect("session dropped");
    state.clone()
}

#[tokio::test]
async fn test_unknown_connector_leaves_state_untouched() {
    let chain = FakeChain::new();
    let wallet = FakeWallet::new(chain.clone(), SEPOLIA);
    let context = context(chain, wallet).await;

    let err = context.session.connect("ledger").await.unwrap_err();
    assert_eq!(err, WalletError::ConnectorNotFound("ledger".to_string()));
    assert_eq!(err.to_string(), "Connector with id ledger not found");
    assert_eq!(context.session.state(), ConnectionState::Disconnected);
    assert_eq!(DappError::from(err).kind(), ErrorKind::ConnectorNotFound);
}

#[tokio::test]
async fn test_connect_persists_and_second_connect_toggles_off() {
    let chain = FakeChain::new();
    let wallet = FakeWallet::new(chain.clone(), SEPOLIA);
    let context = context(chain, wallet.clone()).await;

    let state = context.session.connect("injected").await.unwrap();
    assert_eq!(
        state,
        ConnectionState::Connected {
            connector: ConnectorId::Injected,
            account: ACCOUNT,
            chain_id: ChainId(SEPOLIA),
        }
    );
    assert_eq!(context.store.get(CONNECTOR_ID_KEY).as_deref(), Some("injected"));

    let state = context.session.connect("injected").await.unwrap();
    assert_eq!(state, ConnectionState::Disconnected);
    assert_eq!(context.store.get(CONNECTOR_ID_KEY), None);
    // Deactivation revoked the wallet's permission.
    assert!(!wallet.authorized.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_rejected_connect_reports_error_then_acknowledges() {
    let chain = FakeChain::new();
    let wallet = FakeWallet::new(chain.clone(), SEPOLIA);
    wallet.reject.store(true, Ordering::SeqCst);
    let context = context(chain, wallet).await;

    let err = context.session.connect("injected").await.unwrap_err();
    assert_eq!(err, WalletError::UserRejected);
    assert!(matches!(
        context.session.state(),
        ConnectionState::Error { connector: ConnectorId::Injected, .. }
    ));
    assert_eq!(context.store.get(CONNECTOR_ID_KEY), None);

    let notification = Notification::failure("Connect", &err.into());
    assert_eq!(notification.message, "Connect cancelled: request rejected in wallet");

    context.session.acknowledge_error();
    assert_eq!(context.session.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_missing_wallet_is_not_installed() {
    let chain = FakeChain::new();
    let context = context_with(chain, None, Arc::new(MemoryStore::new())).await;

    let err = context.session.connect("injected").await.unwrap_err();
    assert_eq!(err, WalletError::ProviderNotInstalled(ConnectorId::Injected));
    assert!(matches!(context.session.state(), ConnectionState::Error { .. }));

    let notification = Notification::failure("Connect", &err.into());
    assert!(notification.message.contains("Install it or pick another wallet"));
}

#[tokio::test]
async fn test_connect_moves_wallet_to_configured_network() {
    let chain = FakeChain::new();
    let wallet = FakeWallet::new(chain.clone(), 1);
    let context = context(chain, wallet.clone()).await;

    let state = context.session.connect("injected").await.unwrap();
    assert_eq!(state.chain_id(), Some(ChainId(SEPOLIA)));
    assert_eq!(*wallet.active_chain.lock().unwrap(), SEPOLIA);
}

#[tokio::test]
async fn test_eager_connect_restores_previous_session() {
    let chain = FakeChain::new();
    let wallet = FakeWallet::new(chain.clone(), SEPOLIA);
    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());

    let first = context_with(chain.clone(), Some(wallet.clone()), store.clone()).await;
    first.session.connect("injected").await.unwrap();
    drop(first);

    let second = context_with(chain, Some(wallet), store).await;
    assert_eq!(second.session.state(), ConnectionState::Disconnected);
    let state = second.session.eager_connect().await;
    assert_eq!(state.account(), Some(ACCOUNT));
    assert_eq!(state.connector(), Some(ConnectorId::Injected));
}

#[tokio::test]
async fn test_eager_connect_without_authorization_clears_hint() {
    let chain = FakeChain::new();
    let wallet = FakeWallet::new(chain.clone(), SEPOLIA);
    let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
    store.set(CONNECTOR_ID_KEY, "injected").unwrap();

    let context = context_with(chain, Some(wallet), store.clone()).await;
    let state = context.session.eager_connect().await;

    assert_eq!(state, ConnectionState::Disconnected);
    assert_eq!(store.get(CONNECTOR_ID_KEY), None);
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let chain = FakeChain::new();
    let wallet = FakeWallet::new(chain.clone(), SEPOLIA);

    {
        let store = Arc::new(FileStore::open(&path).unwrap());
        let context = context_with(chain.clone(), Some(wallet.clone()), store).await;
        context.session.connect("injected").await.unwrap();
    }

    let store = Arc::new(FileStore::open(&path).unwrap());
    assert_eq!(store.get(CONNECTOR_ID_KEY).as_deref(), Some("injected"));
    let context = context_with(chain, Some(wallet), store).await;
    assert!(context.session.eager_connect().await.is_connected());
}

#[tokio::test]
async fn test_wallet_events_update_session_in_place() {
    let chain = FakeChain::new();
    let wallet = FakeWallet::new(chain.clone(), SEPOLIA);
    let context = context(chain, wallet.clone()).await;
    context.session.connect("injected").await.unwrap();

    wallet.emit(ProviderEvent::ChainChanged(ChainId(137)));
    let state = wait_for_state(&context, |s| s.chain_id() == Some(ChainId(137))).await;
    assert!(state.is_connected());
    assert_eq!(context.network_label(ChainId(137)), "Polygon Mainnet");
    assert_eq!(context.network_label(ChainId(999)), "Chain ID: 999");

    wallet.emit(ProviderEvent::AccountsChanged(vec![OTHER]));
    let state = wait_for_state(&context, |s| s.account() == Some(OTHER)).await;
    assert_eq!(state.connector(), Some(ConnectorId::Injected));
    assert_eq!(context.store.get(CONNECTOR_ID_KEY).as_deref(), Some("injected"));
}

#[tokio::test]
async fn test_wallet_lock_and_disconnect_end_session() {
    let chain = FakeChain::new();
    let wallet = FakeWallet::new(chain.clone(), SEPOLIA);
    let context = context(chain, wallet.clone()).await;

    context.session.connect("injected").await.unwrap();
    wallet.emit(ProviderEvent::AccountsChanged(vec![]));
    wait_for_state(&context, |s| *s == ConnectionState::Disconnected).await;
    assert_eq!(context.store.get(CONNECTOR_ID_KEY), None);

    context.session.connect("injected").await.unwrap();
    wallet.emit(ProviderEvent::Disconnect(ProviderRpcError::new(4900, "Disconnected")));
    wait_for_state(&context, |s| *s == ConnectionState::Disconnected).await;
    assert_eq!(context.store.get(CONNECTOR_ID_KEY), None);
}

#[tokio::test]
async fn test_verify_signs_for_connected_account_only() {
    let chain = FakeChain::new();
    let wallet = FakeWallet::new(chain.clone(), SEPOLIA);
    let context = context(chain, wallet).await;

    let err = context.verify(ACCOUNT).await.unwrap_err();
    assert!(matches!(err, DappError::Wallet(WalletError::NoAccounts)));

    context.session.connect("injected").await.unwrap();
    let proof = context.verify(ACCOUNT).await.unwrap();
    assert_eq!(proof.address, ACCOUNT);
    assert!(proof.message.starts_with("Verify wallet ownership\nAddress: "));
    assert_eq!(proof.signature.len(), 132);

    let err = context.verify(OTHER).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AddressMismatch);
}

#[tokio::test]
async fn test_add_token_and_switch_network_need_a_session() {
    let chain = FakeChain::new();
    let wallet = FakeWallet::new(chain.clone(), SEPOLIA);
    let context = context(chain, wallet).await;

    assert!(matches!(
        context.add_token().await,
        Err(DappError::Wallet(WalletError::NoSession))
    ));

    context.session.connect("injected").await.unwrap();
    assert!(context.add_token().await.unwrap());
    context.switch_network().await.unwrap();
}
