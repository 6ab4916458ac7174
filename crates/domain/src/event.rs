//! Event — an immutable record of a value published to the host.
//!
//! One event is produced per outward publication: occupancy edges,
//! remaining-time updates while draining, and delay acknowledgements.

use serde::{Deserialize, Serialize};

use crate::delay::Delay;
use crate::id::{AccessoryId, EventId};
use crate::time::{Timestamp, now};

/// What was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    OccupancyChanged { occupied: bool },
    RemainingChanged { remaining_seconds: u32 },
    DelayChanged { delay: Delay },
}

impl EventKind {
    /// The serialized `type` tag.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OccupancyChanged { .. } => "occupancy_changed",
            Self::RemainingChanged { .. } => "remaining_changed",
            Self::DelayChanged { .. } => "delay_changed",
        }
    }
}

/// A publication from one accessory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyEvent {
    pub id: EventId,
    pub accessory_id: AccessoryId,
    #[serde(flatten)]
    pub kind: EventKind,
    pub timestamp: Timestamp,
}

impl OccupancyEvent {
    /// Create a new event stamped with the current time.
    #[must_use]
    pub fn new(accessory_id: AccessoryId, kind: EventKind) -> Self {
        Self {
            id: EventId::new(),
            accessory_id,
            kind,
            timestamp: now(),
        }
    }
}
