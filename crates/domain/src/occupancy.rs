//! Occupancy state as seen from outside the aggregator.

use serde::{Deserialize, Serialize};

use crate::delay::Delay;

/// Point-in-time view of an aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancySnapshot {
    pub occupied: bool,
    /// Seconds left before release. Only meaningful while occupied with a
    /// non-zero delay.
    pub remaining_seconds: u32,
    pub delay: Delay,
    pub countdown_running: bool,
}

impl OccupancySnapshot {
    /// Whether the accessory is occupied only because of the grace delay.
    #[must_use]
    pub fn is_releasing(&self) -> bool {
        self.occupied && self.countdown_running
    }
}
