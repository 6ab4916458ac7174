//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod accessories;
pub mod schema;
pub mod sse;

use axum::Router;
use axum::routing::{get, put};

use occupancy_timer_app::ports::{EventPublisher, SwitchInput};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<S, P>() -> Router<AppState<S, P>>
where
    S: SwitchInput + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/schema", get(schema::get))
        // Accessories
        .route("/accessories", get(accessories::list::<S, P>))
        .route(
            "/accessories/{id}",
            get(accessories::get::<S, P>).delete(accessories::delete::<S, P>),
        )
        .route(
            "/accessories/{id}/switches/{index}",
            put(accessories::set_switch::<S, P>),
        )
        .route(
            "/accessories/{id}/delay",
            put(accessories::set_delay::<S, P>),
        )
        // Events
        .route("/events/stream", get(sse::stream::<S, P>))
}
