//! Wallet connection session.
//!
//! # Data Flow
//! ```text
//! connect(id) ──▶ registry ──▶ connector.activate() ──▶ ConnectionState (watch)
//!                                                           │
//!          provider events ──▶ handle_event ───────────────┤
//!                                                           ▼
//!                                         BalancePoller ──▶ WalletInfo (watch)
//!
//! store.rs keeps the last connector id for eager reconnection.
//! ```

pub mod manager;
pub mod poller;
pub mod state;
pub mod store;

pub use manager::ConnectionSession;
pub use poller::{Balance, BalancePoller, WalletInfo};
pub use state::ConnectionState;
pub use store::{FileStore, MemoryStore, SessionStore, StoreError, CONNECTOR_ID_KEY};
