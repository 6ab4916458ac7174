//! Server-Sent Events (SSE) stream for occupancy publications.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use occupancy_timer_app::ports::{EventPublisher, SwitchInput};

use crate::state::AppState;

/// `GET /api/events/stream` — SSE stream of occupancy events.
///
/// Each [`OccupancyEvent`](occupancy_timer_domain::event::OccupancyEvent)
/// is sent as a JSON `data:` frame, with its kind as the SSE event name.
/// The stream ends when the client disconnects or the bus is dropped.
pub async fn stream<S, P>(
    State(state): State<AppState<S, P>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, std::convert::Infallible>>>
where
    S: SwitchInput + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    let event_rx = state.event_bus.subscribe();
    let event_stream = BroadcastStream::new(event_rx).filter_map(|result| match result {
        Ok(event) => match Event::default().event(event.kind.name()).json_data(&event) {
            Ok(frame) => Some(Ok(frame)),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize event for SSE stream");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(skipped = n, "SSE subscriber lagged, some events were dropped");
            None
        }
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}
