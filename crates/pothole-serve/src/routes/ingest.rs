//! Reading submission endpoint.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use pothole_core::RawReading;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Acknowledgement sent once a reading is stored.
#[derive(Debug, Clone, Serialize)]
pub struct Ack {
    ok: bool,
}

/// `POST /api/road-data`
///
/// The body is read as raw bytes so that a missing content type, malformed
/// JSON or wrongly typed fields still produce a (zero-defaulted) reading
/// instead of a rejection.
pub async fn submit_reading(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Ack>, ApiError> {
    let raw = RawReading::from_slice(&body);
    let stored = state.pipeline.ingest(&raw).await?;

    tracing::debug!(
        id = stored.id,
        severity = stored.reading.severity,
        pothole_event = stored.reading.pothole_event,
        "reading accepted"
    );

    Ok(Json(Ack { ok: true }))
}
