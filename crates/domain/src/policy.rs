//! Occupancy decision policy.
//!
//! Every poll is judged from scratch: the number of switches that reported
//! `on`, the last published occupancy, and whether a release countdown is
//! in flight fully determine what happens next.

/// What the aggregator must do after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Already occupied and still occupied. Cancel any pending release and
    /// publish nothing.
    HoldOccupied,
    /// Not-occupied to occupied edge. Publish occupancy.
    BecomeOccupied,
    /// Nothing on and no countdown running. Start the release countdown
    /// with the delay currently configured.
    StartRelease,
    /// Nothing on and the countdown is already draining. Leave it alone.
    KeepDraining,
}

/// Outcome of a single poll over all switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollTally {
    /// Switches that answered `on`.
    pub on: usize,
    /// Switches that answered at all.
    pub answered: usize,
    /// Switches polled.
    pub polled: usize,
}

impl PollTally {
    /// Switches whose read failed and were left out of the count.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.polled - self.answered
    }
}

/// Decide the next step from a poll.
#[must_use]
pub fn decide(occupied_count: usize, last_occupied: bool, countdown_running: bool) -> Decision {
    if occupied_count > 0 {
        if last_occupied {
            Decision::HoldOccupied
        } else {
            Decision::BecomeOccupied
        }
    } else if countdown_running {
        Decision::KeepDraining
    } else {
        Decision::StartRelease
    }
}
