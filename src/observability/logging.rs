//! Structured logging.
//!
//! `RUST_LOG` wins over the configured level when set.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when neither `RUST_LOG` nor the config names a level.
pub const DEFAULT_FILTER: &str = "token_dapp=info";

/// Build the filter directive for a configured level.
///
/// A bare level ("debug") is scoped to this crate; anything containing `=`
/// or `,` is taken as a full directive.
pub fn filter_directive(level: Option<&str>) -> String {
    match level.map(str::trim).filter(|l| !l.is_empty()) {
        None => DEFAULT_FILTER.to_string(),
        Some(l) if l.contains('=') || l.contains(',') => l.to_string(),
        Some(l) => format!("token_dapp={}", l),
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
