//! HTTP route definitions.

mod health;
mod ingest;
mod live;
mod mode;
mod readings;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

/// Build the complete router.
///
/// # Route Structure
///
/// - `GET /health` - Health check with live subscriber count
/// - `POST /api/road-data` - Submit a reading (lenient JSON)
/// - `GET /api/road-data` - Stored readings after a cursor
/// - `POST /set_mode` - Switch data-origin mode
/// - `GET /events` - Live readings as server-sent `update` events
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/road-data",
            post(ingest::submit_reading).get(readings::readings_since),
        )
        .route("/set_mode", post(mode::set_mode))
        .route("/events", get(live::live_updates))
        .with_state(state)
}
