//! Countdown arithmetic for the release timer.

use std::time::Duration;

use crate::delay::Delay;

/// Whole seconds left in a countdown of `total`, rounded to nearest
/// (halves round up) and never negative.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn remaining_seconds(total: Delay, elapsed: Duration) -> u32 {
    let left = f64::from(total.seconds()) - elapsed.as_secs_f64();
    if left <= 0.0 {
        return 0;
    }
    // `left` is within (0, 3600], so the rounded value fits in u32.
    left.round() as u32
}

/// De-duplicates remaining-time reports within one countdown run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemainingTracker {
    last_emitted: Option<u32>,
}

impl RemainingTracker {
    /// Record `remaining`; returns it only when it differs from the last
    /// value reported.
    pub fn observe(&mut self, remaining: u32) -> Option<u32> {
        if self.last_emitted == Some(remaining) {
            return None;
        }
        self.last_emitted = Some(remaining);
        Some(remaining)
    }
}
