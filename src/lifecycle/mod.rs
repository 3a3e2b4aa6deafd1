//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Startup (app.rs):
//!     Load config → Validate → Build context → Eager reconnect
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C (signals.rs) → trigger → poller and listeners exit → process exits
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::spawn_ctrl_c;
