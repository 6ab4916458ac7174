//! Reconfiguration port — runtime delay updates.

use std::future::Future;

use occupancy_timer_domain::delay::Delay;
use occupancy_timer_domain::error::OccupancyError;

/// Accepts a new release delay while an accessory is running.
///
/// The value is clamped to the valid range and takes effect at the next
/// release countdown; a countdown already in progress keeps its duration.
pub trait ReconfigurationPort {
    /// Apply `delay_seconds`, returning the delay actually stored.
    fn reconfigure(
        &self,
        delay_seconds: i64,
    ) -> impl Future<Output = Result<Delay, OccupancyError>> + Send;
}
