//! Server-Sent Events (SSE) stream of dependent notifications.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use thermolink_domain::dependent::DependentState;

use crate::state::AppState;

fn to_event(state: &DependentState) -> Option<Event> {
    match serde_json::to_string(state) {
        Ok(json) => Some(Event::default().event("state").data(json)),
        Err(err) => {
            tracing::warn!(%err, "failed to serialize notification for SSE stream");
            None
        }
    }
}

/// `GET /api/events/stream`: every notification published by a unit, as
/// JSON `data:` frames, until the client disconnects.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let receiver = state.bus.subscribe();
    let events = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(notification) => to_event(&notification).map(Ok),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE subscriber lagged, some notifications were dropped");
            None
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
