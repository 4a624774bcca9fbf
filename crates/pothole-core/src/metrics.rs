//! Prometheus metrics helpers for the pothole telemetry service.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pothole_core::metrics::{init_metrics, start_metrics_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let handle = init_metrics();
//!     start_metrics_server(9091, handle).await.unwrap();
//!
//!     metrics::counter!("ingest_readings_total").increment(1);
//! }
//! ```
//!
//! # Metric Naming Conventions
//!
//! - Prefix: component name (`ingest_`, `detector_`, `broadcast_`, `demo_`)
//! - Suffix: unit or type (`_total`, `_seconds`)
//! - Labels: only low-cardinality values (field names, drop reasons)

use axum::{Router, routing::get};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;

/// Initialize the Prometheus metrics recorder.
///
/// This must be called once at startup before any metrics are recorded.
///
/// # Panics
///
/// Panics if called more than once (the recorder can only be installed once).
pub fn init_metrics() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    register_common_metrics();

    handle
}

/// Start the Prometheus metrics HTTP server on `port`.
///
/// The listener is bound before returning so a taken port is reported to
/// the caller; serving then continues on a background task.
pub async fn start_metrics_server(
    port: u16,
    handle: PrometheusHandle,
) -> Result<(), std::io::Error> {
    let app = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on http://{}/metrics", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "metrics server stopped");
        }
    });

    Ok(())
}

/// Register descriptions for every metric the service records.
fn register_common_metrics() {
    // =========================================================================
    // Ingestion
    // =========================================================================

    describe_counter!("ingest_readings_total", "Readings persisted and published");
    describe_counter!(
        "ingest_readings_defaulted_total",
        "Garbled submission fields replaced with zero (label: field)"
    );
    describe_counter!(
        "ingest_storage_failures_total",
        "Readings rejected because the append to the store failed"
    );
    describe_histogram!(
        "ingest_commit_duration_seconds",
        "Time spent appending a reading to the store"
    );

    // =========================================================================
    // Detection
    // =========================================================================

    describe_counter!(
        "detector_pothole_events_total",
        "Pothole events detected (rising severity edges)"
    );
    describe_gauge!(
        "detector_pothole_count",
        "Cumulative pothole count held by the detector"
    );

    // =========================================================================
    // Broadcast
    // =========================================================================

    describe_gauge!("broadcast_subscribers", "Live subscribers currently registered");
    describe_counter!(
        "broadcast_deliveries_total",
        "Readings queued for delivery to a subscriber"
    );
    describe_counter!(
        "broadcast_dropped_total",
        "Deliveries skipped (label: reason = full|closed)"
    );

    // =========================================================================
    // Demo source
    // =========================================================================

    describe_counter!("demo_readings_total", "Simulated readings submitted by the demo source");
}
