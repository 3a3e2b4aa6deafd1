//! Chain access subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkConfig (chain id, RPC endpoints)
//!     → client.rs (read provider: random pick + failover, timeouts)
//!     → types.rs ChainReader (the read seam used by poller and contract binding)
//!     → confirmation.rs (poll receipts until confirmed)
//!     → network.rs (chain id → display label)
//! ```
//!
//! # Constraints
//! - All RPC calls have configurable timeouts
//! - Reads never need a wallet; writes go through a wallet provider instead

pub mod client;
pub mod confirmation;
pub mod network;
pub mod types;

pub use client::ReadClient;
pub use confirmation::{wait_for_confirmation, ConfirmationPolicy};
pub use network::NetworkNames;
pub use types::{BlockchainError, BlockchainResult, ChainId, ChainReader, ReceiptInfo};
