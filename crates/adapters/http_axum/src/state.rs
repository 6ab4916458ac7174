//! Shared application state for axum handlers.

use std::sync::Arc;

use occupancy_timer_app::event_bus::InProcessEventBus;
use occupancy_timer_app::services::accessory_service::AccessoryService;

/// Application state shared across all axum handlers.
///
/// Generic over the switch type and event publisher to avoid dynamic
/// dispatch. `Clone` is implemented manually so neither type needs to be
/// `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<S, P> {
    /// Accessory registry and actuation.
    pub accessory_service: Arc<AccessoryService<S, P>>,
    /// Broadcast bus the SSE stream subscribes to.
    pub event_bus: Arc<InProcessEventBus>,
}

impl<S, P> Clone for AppState<S, P> {
    fn clone(&self) -> Self {
        Self {
            accessory_service: Arc::clone(&self.accessory_service),
            event_bus: Arc::clone(&self.event_bus),
        }
    }
}

impl<S, P> AppState<S, P> {
    /// Create the state from pre-wrapped `Arc`s.
    ///
    /// The service is shared with the composition root, which shuts it
    /// down after the server stops.
    pub fn new(
        accessory_service: Arc<AccessoryService<S, P>>,
        event_bus: Arc<InProcessEventBus>,
    ) -> Self {
        Self {
            accessory_service,
            event_bus,
        }
    }
}
