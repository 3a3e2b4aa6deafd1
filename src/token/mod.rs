//! Token contract binding and the actions built on it.
//!
//! # Data Flow
//! ```text
//! reads:  TokenContract ──▶ ChainReader::call (eth_call on the read client)
//! writes: TokenService guards ──▶ wallet eth_sendTransaction ──▶ confirmation wait
//!                                                          └──▶ refreshed TokenView
//! ```

pub mod contract;
pub mod service;
pub mod types;

pub use contract::{IToken, TokenContract};
pub use service::TokenService;
pub use types::{ContractError, TokenView, TokenWrite, TxReceipt};
