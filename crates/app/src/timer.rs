//! Countdown timer — drives the release grace period.
//!
//! ```text
//!            start(d > 0)
//!   Idle ────────────────► Running ──┬── expired ──► Idle
//!    ▲  start(0): expires at once    │
//!    └───────────────────────────────┴── stop() ───► Idle
//! ```
//!
//! While running, a background task delivers [`TimerEvent`]s into the
//! owner's inbox: a `Tick` whenever the rounded remaining time changes and
//! a single `Expired` when the delay has elapsed. Every run is tagged with
//! a [`RunId`]; the owner passes incoming events through
//! [`CountdownTimer::accept`], which rejects anything from a run that was
//! stopped or superseded even if it was already queued.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use occupancy_timer_domain::countdown::{RemainingTracker, remaining_seconds};
use occupancy_timer_domain::delay::Delay;

/// Identifies one run of the timer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunId(u64);

impl RunId {
    fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEventKind {
    /// Rounded seconds left; only sent when it changed.
    Tick(u32),
    Expired,
}

/// Event delivered by a running timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub run: RunId,
    pub kind: TimerEventKind,
}

/// Result of [`CountdownTimer::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Expiry and ticks are scheduled.
    Running,
    /// The delay was zero: the run expired on the spot and nothing was
    /// scheduled.
    Expired,
}

/// Single-owner countdown timer.
///
/// `M` is the owner's inbox message type.
pub struct CountdownTimer<M> {
    tick_interval: Duration,
    inbox: mpsc::WeakUnboundedSender<M>,
    run: RunId,
    started_at: Option<Instant>,
    task: Option<JoinHandle<()>>,
}

impl<M> CountdownTimer<M>
where
    M: From<TimerEvent> + Send + 'static,
{
    /// Create an idle timer that reports into `inbox`.
    ///
    /// Only a weak reference to the inbox is kept while idle.
    #[must_use]
    pub fn new(tick_interval: Duration, inbox: &mpsc::UnboundedSender<M>) -> Self {
        Self {
            tick_interval,
            inbox: inbox.downgrade(),
            run: RunId::default(),
            started_at: None,
            task: None,
        }
    }

    /// Start a countdown of `delay`, stopping any run in progress first.
    pub fn start(&mut self, delay: Delay) -> StartOutcome {
        self.stop();
        self.run = self.run.next();

        if delay.is_zero() {
            tracing::debug!("countdown started with zero delay, expiring immediately");
            return StartOutcome::Expired;
        }

        let started_at = Instant::now();
        self.started_at = Some(started_at);
        // Upgrading only fails when every handle is gone and the owner is
        // draining its last messages; there is nobody left to notify.
        if let Some(inbox) = self.inbox.upgrade() {
            self.task = Some(tokio::spawn(drive(
                self.run,
                started_at,
                delay,
                self.tick_interval,
                inbox,
            )));
        }
        tracing::debug!(%delay, "countdown started");
        StartOutcome::Running
    }

    /// Cancel the current run. Safe to call in any state.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("countdown stopped");
        }
        self.started_at = None;
    }

    /// Whether `event` belongs to the current run.
    ///
    /// Accepting an `Expired` event returns the timer to idle.
    pub fn accept(&mut self, event: &TimerEvent) -> bool {
        if !self.is_running() || event.run != self.run {
            return false;
        }
        if event.kind == TimerEventKind::Expired {
            self.task = None;
            self.started_at = None;
        }
        true
    }
}

impl<M> CountdownTimer<M> {
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }
}

impl<M> Drop for CountdownTimer<M> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn drive<M: From<TimerEvent>>(
    run: RunId,
    started_at: Instant,
    total: Delay,
    tick_interval: Duration,
    inbox: mpsc::UnboundedSender<M>,
) {
    let expiry = time::sleep_until(started_at + total.as_duration());
    tokio::pin!(expiry);

    let mut ticker = time::interval_at(started_at + tick_interval, tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut tracker = RemainingTracker::default();

    loop {
        tokio::select! {
            biased;
            () = &mut expiry => {
                let _ = inbox.send(TimerEvent { run, kind: TimerEventKind::Expired }.into());
                return;
            }
            _ = ticker.tick() => {
                let remaining = remaining_seconds(total, started_at.elapsed());
                if let Some(remaining) = tracker.observe(remaining) {
                    let event = TimerEvent { run, kind: TimerEventKind::Tick(remaining) };
                    if inbox.send(event.into()).is_err() {
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(250);

    fn timer() -> (
        CountdownTimer<TimerEvent>,
        mpsc::UnboundedSender<TimerEvent>,
        mpsc::UnboundedReceiver<TimerEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (CountdownTimer::new(TICK, &tx), tx, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn should_expire_immediately_with_zero_delay() {
        let (mut timer, _tx, mut rx) = timer();

        assert_eq!(timer.start(Delay::ZERO), StartOutcome::Expired);
        assert!(!timer.is_running());

        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn should_tick_down_then_expire_once() {
        let (mut timer, _tx, mut rx) = timer();
        let started = Instant::now();

        assert_eq!(timer.start(Delay::clamped(2)), StartOutcome::Running);
        assert!(timer.is_running());

        let mut ticks = Vec::new();
        loop {
            let event = rx.recv().await.unwrap();
            assert!(timer.accept(&event));
            match event.kind {
                TimerEventKind::Tick(remaining) => ticks.push(remaining),
                TimerEventKind::Expired => break,
            }
        }

        assert_eq!(ticks, vec![2, 1, 0]);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
        assert!(!timer.is_running());

        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn should_deliver_nothing_after_stop() {
        let (mut timer, _tx, mut rx) = timer();
        timer.start(Delay::clamped(5));

        time::sleep(Duration::from_secs(1)).await;
        timer.stop();
        while rx.try_recv().is_ok() {}

        time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn should_reject_events_queued_before_stop() {
        let (mut timer, _tx, mut rx) = timer();
        timer.start(Delay::clamped(5));

        let queued = rx.recv().await.unwrap();
        timer.stop();

        assert!(!timer.accept(&queued));
    }

    #[tokio::test(start_paused = true)]
    async fn should_reject_events_from_a_superseded_run() {
        let (mut timer, _tx, mut rx) = timer();
        timer.start(Delay::clamped(5));
        let stale = rx.recv().await.unwrap();

        timer.start(Delay::clamped(10));
        let fresh = rx.recv().await.unwrap();

        assert!(!timer.accept(&stale));
        assert!(timer.accept(&fresh));
        assert_eq!(fresh.kind, TimerEventKind::Tick(10));
    }

    #[tokio::test(start_paused = true)]
    async fn should_treat_repeated_stop_as_no_op() {
        let (mut timer, _tx, _rx) = timer();
        timer.stop();
        timer.start(Delay::clamped(3));
        timer.stop();
        timer.stop();
        assert!(!timer.is_running());
    }
}
