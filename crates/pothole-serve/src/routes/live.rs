//! Live update channel (server-sent events).

use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt, stream};

use crate::state::AppState;

/// Name of the SSE event carrying a stamped reading.
pub const UPDATE_EVENT: &str = "update";

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// `GET /events`
///
/// Streams every reading published after the client connected. The
/// subscription is dropped, and so unregistered, when the client goes away
/// or the server shuts down.
pub async fn live_updates(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription = state.broadcaster.subscribe();
    tracing::debug!(subscription = subscription.id(), "live client connected");

    let updates = stream::unfold(subscription, |mut subscription| async move {
        let reading = subscription.recv().await?;
        Some((reading, subscription))
    })
    .map(|reading| Event::default().event(UPDATE_EVENT).json_data(reading))
    .take_until(state.shutdown_signal());

    Sse::new(updates).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}
