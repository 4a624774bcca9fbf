//! Cursor-based catch-up over the stored reading log.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use pothole_core::{RecordId, StoredReading};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Page size when `limit` is omitted.
pub const DEFAULT_LIMIT: usize = 50;

/// Largest page a single request may ask for.
pub const MAX_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct CatchUpParams {
    /// Return records with ids strictly greater than this (default 0).
    after: Option<RecordId>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CatchUpResponse {
    readings: Vec<StoredReading>,
    /// Pass as `after` to continue; unchanged when nothing new was found.
    cursor: RecordId,
}

/// `GET /api/road-data?after=<cursor>&limit=<n>`
pub async fn readings_since(
    State(state): State<AppState>,
    params: Result<Query<CatchUpParams>, QueryRejection>,
) -> Result<Json<CatchUpResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let after = params.after.unwrap_or(0);
    if after < 0 {
        return Err(ApiError::BadRequest("after must not be negative".into()));
    }
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);

    let store = state.store.clone();
    let readings = tokio::task::spawn_blocking(move || store.read_since(after, Some(limit)))
        .await
        .map_err(|e| ApiError::Internal(e.into()))??;

    let cursor = readings.last().map_or(after, |r| r.id);
    Ok(Json(CatchUpResponse { readings, cursor }))
}
