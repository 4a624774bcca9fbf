//! Pothole Serve - pothole telemetry ingestion and live update server.
//!
//! This binary accepts readings over HTTP, persists them to SQLite, and
//! pushes each stored reading to live dashboard subscribers.

use std::sync::atomic::Ordering;

use axum::http::Request;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use pothole_core::metrics::{init_metrics, start_metrics_server};
use pothole_ingest::{DemoConfig, DemoSource};
use pothole_serve::{AppState, Config, open_store, router};

/// Pothole telemetry server.
#[derive(Parser, Debug)]
#[command(name = "pothole-serve")]
#[command(about = "Pothole telemetry ingestion and live update server", long_about = None)]
struct Args {
    /// Path to .env file (optional).
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    dotenv: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load .env file if it exists
    if std::path::Path::new(&args.dotenv).exists() {
        dotenvy::from_path(&args.dotenv)?;
        eprintln!("Loaded environment from {}", args.dotenv);
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();

    if let Some(port) = config.metrics_port {
        let handle = init_metrics();
        start_metrics_server(port, handle).await?;
    }

    // Storage and pipeline
    let store = open_store(&config)?;
    let (state, committer) = AppState::start(store, &config);

    // Demo source idles until the mode becomes "demo"
    let demo = DemoSource::new(
        DemoConfig {
            interval: config.demo_interval,
            ..DemoConfig::default()
        },
        state.pipeline.clone(),
        state.mode.clone(),
    );
    let demo_running = demo.running_flag();
    let demo_task = tokio::spawn(demo.run());

    // Build router with middleware
    let app = router(state.clone())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    query = request.uri().query().unwrap_or("")
                )
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "starting server");

    let shutdown_state = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutdown requested");
            shutdown_state.begin_shutdown();
        })
        .await?;

    // Stop producers, then let the committer drain what is already queued
    demo_running.store(false, Ordering::SeqCst);
    demo_task.await?;
    drop(state);
    committer.await?;

    tracing::info!("shutdown complete");
    Ok(())
}
