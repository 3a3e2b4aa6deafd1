//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, apply DAPP_* env overrides)
//!     → validation.rs (semantic checks)
//!     → DappConfig (validated, immutable)
//!     → handed to the application context at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    ConnectorsConfig, ContractConfig, DappConfig, InjectedConfig, NativeCurrency, NetworkConfig,
    ObservabilityConfig, SessionConfig, WalletConnectConfig,
};
