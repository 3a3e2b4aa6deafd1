//! Wallet connectors.
//!
//! # Layout
//! ```text
//! eip1193.rs       provider request/event seam + typed helpers
//! connector.rs     Connector trait {activate, connect_eagerly, deactivate}
//! injected.rs      connector over a provider living beside the dApp
//! local.rs         local key wallet used as the injected provider
//! remote.rs        QR-paired remote-signer connector
//! relay.rs         HTTP relay transport for the remote signer
//! registry.rs      ConnectorId → connector table
//! registration.rs  switch/add chain, watch asset
//! signature.rs     ownership proof
//! ```
//!
//! # Security
//! - Keys come from environment variables only and never reach logs

pub mod connector;
pub mod eip1193;
pub mod injected;
pub mod local;
pub mod registration;
pub mod registry;
pub mod relay;
pub mod remote;
pub mod signature;
pub mod types;

pub use connector::Connector;
pub use eip1193::{Eip1193Ext, Eip1193Provider, ProviderEvent, ProviderRpcError};
pub use injected::InjectedConnector;
pub use local::LocalKeyProvider;
pub use registry::ConnectorRegistry;
pub use relay::RelayTransport;
pub use remote::{PairingTransport, PairingUri, RemoteConnector};
pub use types::{Activation, ConnectorId, WalletError};
