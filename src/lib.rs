//! Token dApp client library
//!
//! Wallet connection session, connector registry, session persistence,
//! balance/network polling and an ERC20 token binding.

pub mod app;
pub mod blockchain;
pub mod config;
pub mod errors;
pub mod format;
pub mod lifecycle;
pub mod observability;
pub mod session;
pub mod token;
pub mod wallet;

pub use app::DappContext;
pub use config::schema::DappConfig;
pub use errors::{DappError, Notification};
pub use lifecycle::Shutdown;
pub use session::{ConnectionSession, ConnectionState};
