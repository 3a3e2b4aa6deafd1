//! Background refresh of the connected account's native balance and network.
//!
//! # Data Flow
//! ```text
//! session state (watch) ──▶ poller task ──▶ WalletInfo (watch)
//!                              │
//!                              └── every poll_interval: ChainReader::balance
//! ```
//!
//! Polling runs only while the session is `Connected`. A fetch that races a
//! state change is dropped instead of published.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::blockchain::{ChainId, ChainReader, NetworkNames};
use crate::observability::metrics;
use crate::session::manager::ConnectionSession;
use crate::session::state::ConnectionState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Balance {
    /// Not fetched yet.
    #[default]
    Unknown,
    Available(U256),
    /// The last fetch failed.
    Unavailable,
}

/// Derived wallet details for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletInfo {
    pub account: Option<Address>,
    pub chain_id: Option<ChainId>,
    pub network: Option<String>,
    pub balance: Balance,
}

/// Handle to the polling task. Dropping it stops polling.
#[derive(Debug)]
pub struct BalancePoller {
    info: watch::Receiver<WalletInfo>,
    task: JoinHandle<()>,
}

impl BalancePoller {
    pub fn spawn(
        session: &ConnectionSession,
        reader: Arc<dyn ChainReader>,
        names: NetworkNames,
        poll_interval: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        let (tx, info) = watch::channel(WalletInfo::default());
        let states = session.subscribe();
        let task = tokio::spawn(run(states, reader, names, poll_interval, tx, shutdown));
        Self { info, task }
    }

    /// Latest snapshot.
    pub fn info(&self) -> WalletInfo {
        self.info.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletInfo> {
        self.info.clone()
    }
}

impl Drop for BalancePoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut states: watch::Receiver<ConnectionState>,
    reader: Arc<dyn ChainReader>,
    names: NetworkNames,
    poll_interval: Duration,
    info: watch::Sender<WalletInfo>,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::debug!(interval_ms = poll_interval.as_millis() as u64, "Balance poller starting");

    'outer: loop {
        let state = states.borrow_and_update().clone();

        let (account, chain_id) = match state {
            ConnectionState::Connected { account, chain_id, .. } => (account, chain_id),
            _ => {
                info.send_if_modified(|current| {
                    let changed = *current != WalletInfo::default();
                    *current = WalletInfo::default();
                    changed
                });
                let keep_running = tokio::select! {
                    changed = states.changed() => changed.is_ok(),
                    _ = shutdown.recv() => false,
                };
                if keep_running {
                    continue;
                }
                break;
            }
        };

        info.send_modify(|current| {
            if current.account != Some(account) || current.chain_id != Some(chain_id) {
                current.balance = Balance::Unknown;
            }
            current.account = Some(account);
            current.chain_id = Some(chain_id);
            current.network = Some(names.label(chain_id.0));
        });

        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let fetched = tokio::select! {
                        result = reader.balance(account) => result,
                        changed = states.changed() => {
                            if changed.is_err() {
                                break 'outer;
                            }
                            continue 'outer;
                        }
                        _ = shutdown.recv() => break 'outer,
                    };

                    if !still_relevant(&states, account, chain_id) {
                        tracing::debug!(account = %account, "Dropping stale balance result");
                        continue 'outer;
                    }

                    let balance = match fetched {
                        Ok(wei) => Balance::Available(wei),
                        Err(e) => {
                            metrics::record_balance_failure();
                            tracing::warn!(account = %account, error = %e, "Balance fetch failed");
                            Balance::Unavailable
                        }
                    };
                    info.send_modify(|current| current.balance = balance);
                }
                changed = states.changed() => {
                    if changed.is_err() {
                        break 'outer;
                    }
                    continue 'outer;
                }
                _ = shutdown.recv() => break 'outer,
            }
        }
    }

    tracing::debug!("Balance poller stopped");
}

fn still_relevant(states: &watch::Receiver<ConnectionState>, account: Address, chain_id: ChainId) -> bool {
    matches!(
        &*states.borrow(),
        ConnectionState::Connected { account: a, chain_id: c, .. } if *a == account && *c == chain_id
    )
}
