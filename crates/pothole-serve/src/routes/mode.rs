//! Mode switch endpoint.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use pothole_core::DEFAULT_MODE;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct ModeResponse {
    ok: bool,
    mode: String,
}

/// `POST /set_mode`
///
/// Takes `{"mode": "<name>"}`. Anything without a string `mode` resets the
/// mode to `"hardware"`.
pub async fn set_mode(State(state): State<AppState>, body: Bytes) -> Json<ModeResponse> {
    let mode = requested_mode(&body);
    let previous = state.mode.set(mode.clone());

    if previous != mode {
        tracing::info!(from = %previous, to = %mode, "mode changed");
    }

    Json(ModeResponse { ok: true, mode })
}

fn requested_mode(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("mode")?.as_str().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_MODE.to_string())
}
