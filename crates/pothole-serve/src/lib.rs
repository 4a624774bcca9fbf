//! Pothole Serve - HTTP front door for pothole telemetry
//!
//! Accepts readings from the vehicle, stores them, and streams every stored
//! reading to connected dashboards as server-sent events.
//!
//! # Architecture
//!
//! - **AppState**: Ingestion pipeline, broadcaster, reading store and mode
//! - **Config**: Environment-driven settings (typically from a `.env` file)
//! - **Routes**: Endpoint handlers, one module per concern

pub mod config;
mod error;
mod routes;
mod state;

pub use self::config::Config;
pub use self::error::ApiError;
pub use self::routes::router;
pub use self::state::{AppState, open_store};
