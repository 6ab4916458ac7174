//! Timestamp helpers for published events.

use chrono::{DateTime, Utc};

/// UTC timestamp attached to every [`OccupancyEvent`](crate::event::OccupancyEvent).
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}
