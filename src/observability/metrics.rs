//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dapp_connect_total` (counter): connect attempts by connector, outcome
//! - `dapp_connected` (gauge): 1 while a wallet is connected
//! - `dapp_balance_fetch_failures_total` (counter): failed balance polls
//! - `dapp_tx_total` (counter): token writes by method, outcome
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_connect(connector: &'static str, outcome: &'static str) {
    counter!("dapp_connect_total", "connector" => connector, "outcome" => outcome).increment(1);
}

pub fn record_connected(connected: bool) {
    gauge!("dapp_connected").set(if connected { 1.0 } else { 0.0 });
}

pub fn record_balance_failure() {
    counter!("dapp_balance_fetch_failures_total").increment(1);
}

pub fn record_transaction(method: &'static str, outcome: &'static str) {
    counter!("dapp_tx_total", "method" => method, "outcome" => outcome).increment(1);
}
