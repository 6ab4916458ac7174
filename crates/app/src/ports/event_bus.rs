//! Event bus port — outward publication of occupancy events.

use std::future::Future;

use occupancy_timer_domain::error::OccupancyError;
use occupancy_timer_domain::event::OccupancyEvent;

/// Publishes occupancy events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(
        &self,
        event: OccupancyEvent,
    ) -> impl Future<Output = Result<(), OccupancyError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        event: OccupancyEvent,
    ) -> impl Future<Output = Result<(), OccupancyError>> + Send {
        (**self).publish(event)
    }
}
