//! Occupancy aggregator — combines N switches into one hysteretic
//! occupancy signal.
//!
//! Each aggregator runs as a single tokio task that owns all of its state.
//! Switch-change notifications, timer events, reconfiguration requests and
//! snapshot queries arrive as messages on one unbounded inbox and are
//! handled strictly in arrival order, so two decisions can never
//! interleave. Callers talk to the task through an [`AggregatorHandle`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tracing::Instrument;

use occupancy_timer_domain::accessory::AccessoryConfig;
use occupancy_timer_domain::delay::Delay;
use occupancy_timer_domain::error::{OccupancyError, ReadError, UnavailableError};
use occupancy_timer_domain::event::{EventKind, OccupancyEvent};
use occupancy_timer_domain::id::{AccessoryId, SwitchId};
use occupancy_timer_domain::occupancy::OccupancySnapshot;
use occupancy_timer_domain::policy::{Decision, PollTally, decide};

use crate::ports::{EventPublisher, ReconfigurationPort, SwitchInput, SwitchNotifier};
use crate::timer::{CountdownTimer, StartOutcome, TimerEvent, TimerEventKind};

/// Tunables shared by every aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorSettings {
    /// How often a running countdown re-evaluates the remaining time.
    pub tick_interval: Duration,
    /// Upper bound for a single switch read during a poll.
    pub read_timeout: Duration,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(250),
            read_timeout: Duration::from_secs(2),
        }
    }
}

/// Messages processed by the aggregator task.
#[derive(Debug)]
enum Command {
    SwitchChanged(SwitchId),
    Timer(TimerEvent),
    Reconfigure {
        delay: Delay,
        reply: oneshot::Sender<Delay>,
    },
    Snapshot {
        reply: oneshot::Sender<OccupancySnapshot>,
    },
    Shutdown,
}

impl From<TimerEvent> for Command {
    fn from(event: TimerEvent) -> Self {
        Self::Timer(event)
    }
}

/// The state owned by one aggregator task.
pub struct OccupancyAggregator<S, P> {
    accessory_id: AccessoryId,
    switches: Vec<Arc<S>>,
    delay: Delay,
    occupied: bool,
    remaining: u32,
    timer: CountdownTimer<Command>,
    publisher: P,
    read_timeout: Duration,
}

impl<S, P> OccupancyAggregator<S, P>
where
    S: SwitchInput + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Take ownership of `switches` and start the aggregator task.
    ///
    /// Every switch gets a notifier that feeds its changes into the task's
    /// inbox. The notifiers only hold a weak reference, so the task ends
    /// once every [`AggregatorHandle`] is dropped or
    /// [`AggregatorHandle::shutdown`] is called.
    pub fn spawn(
        accessory_id: AccessoryId,
        config: &AccessoryConfig,
        switches: Vec<Arc<S>>,
        publisher: P,
        settings: AggregatorSettings,
    ) -> (AggregatorHandle, JoinHandle<()>) {
        let (inbox, commands) = mpsc::unbounded_channel();

        for switch in &switches {
            let weak = inbox.downgrade();
            let id = switch.id();
            switch.attach(SwitchNotifier::new(move || {
                if let Some(inbox) = weak.upgrade() {
                    let _ = inbox.send(Command::SwitchChanged(id));
                }
            }));
        }

        let aggregator = Self {
            accessory_id,
            switches,
            delay: config.delay,
            occupied: false,
            remaining: 0,
            timer: CountdownTimer::new(settings.tick_interval, &inbox),
            publisher,
            read_timeout: settings.read_timeout,
        };

        let span = tracing::info_span!("aggregator", accessory = %config.name);
        let task = tokio::spawn(aggregator.run(commands).instrument(span));

        let handle = AggregatorHandle {
            accessory: Arc::from(config.name.as_str()),
            inbox,
        };
        (handle, task)
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        tracing::info!(
            switches = self.switches.len(),
            delay = %self.delay,
            "aggregator started"
        );

        while let Some(command) = commands.recv().await {
            match command {
                Command::SwitchChanged(switch) => {
                    tracing::debug!(%switch, "switch changed");
                    self.on_switch_changed().await;
                }
                Command::Timer(event) => self.on_timer_event(event).await,
                Command::Reconfigure { delay, reply } => {
                    let applied = self.reconfigure(delay).await;
                    let _ = reply.send(applied);
                }
                Command::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                }
                Command::Shutdown => break,
            }
        }

        self.timer.stop();
        tracing::info!("aggregator stopped");
    }

    /// Re-poll every switch and apply the decision policy.
    async fn on_switch_changed(&mut self) {
        let tally = self.poll().await;
        let decision = decide(tally.on, self.occupied, self.timer.is_running());
        tracing::debug!(
            on = tally.on,
            polled = tally.polled,
            dropped = tally.dropped(),
            last_occupied = self.occupied,
            ?decision,
            "poll complete"
        );

        match decision {
            Decision::HoldOccupied => self.timer.stop(),
            Decision::BecomeOccupied => self.set_occupancy_detected().await,
            Decision::StartRelease => self.start_release().await,
            Decision::KeepDraining => {}
        }
    }

    /// Read every switch concurrently and wait for all of them.
    ///
    /// Failed or timed-out reads are left out of the tally, which makes
    /// them count as `off`.
    async fn poll(&self) -> PollTally {
        let mut reads = JoinSet::new();
        for switch in &self.switches {
            let switch = Arc::clone(switch);
            let timeout = self.read_timeout;
            reads.spawn(async move {
                let id = switch.id();
                match tokio::time::timeout(timeout, switch.read()).await {
                    Ok(answer) => answer,
                    Err(_) => Err(ReadError::TimedOut {
                        switch: id,
                        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    }
                    .into()),
                }
            });
        }

        let mut tally = PollTally {
            polled: self.switches.len(),
            ..PollTally::default()
        };
        while let Some(joined) = reads.join_next().await {
            match joined {
                Ok(Ok(on)) => {
                    tally.answered += 1;
                    if on {
                        tally.on += 1;
                    }
                }
                Ok(Err(err)) => {
                    tracing::warn!(%err, "switch read failed, leaving it out of the tally");
                }
                Err(err) => {
                    tracing::warn!(%err, "switch read task failed, leaving it out of the tally");
                }
            }
        }
        tally
    }

    async fn start_release(&mut self) {
        match self.timer.start(self.delay) {
            StartOutcome::Running => {
                tracing::info!(delay = %self.delay, "all switches off, release countdown started");
            }
            StartOutcome::Expired => self.on_timer_expired().await,
        }
    }

    async fn on_timer_event(&mut self, event: TimerEvent) {
        if !self.timer.accept(&event) {
            tracing::trace!(?event, "discarding event from a stopped countdown");
            return;
        }
        match event.kind {
            TimerEventKind::Tick(remaining) => self.on_timer_tick(remaining).await,
            TimerEventKind::Expired => self.on_timer_expired().await,
        }
    }

    async fn on_timer_tick(&mut self, remaining: u32) {
        tracing::trace!(remaining, "countdown tick");
        self.set_remaining(remaining).await;
    }

    async fn on_timer_expired(&mut self) {
        self.set_occupancy_not_detected().await;
    }

    async fn set_occupancy_detected(&mut self) {
        self.timer.stop();
        self.occupied = true;
        tracing::info!("occupancy detected");
        self.publish(EventKind::OccupancyChanged { occupied: true })
            .await;
        if !self.delay.is_zero() {
            self.set_remaining(self.delay.seconds()).await;
        }
    }

    async fn set_occupancy_not_detected(&mut self) {
        self.timer.stop();
        self.occupied = false;
        tracing::info!("occupancy no longer detected");
        self.publish(EventKind::OccupancyChanged { occupied: false })
            .await;
        self.set_remaining(0).await;
    }

    /// Publish the remaining time if it changed.
    async fn set_remaining(&mut self, remaining: u32) {
        if self.remaining == remaining {
            return;
        }
        self.remaining = remaining;
        self.publish(EventKind::RemainingChanged {
            remaining_seconds: remaining,
        })
        .await;
    }

    async fn reconfigure(&mut self, delay: Delay) -> Delay {
        let previous = self.delay;
        self.delay = delay;
        tracing::info!(%previous, %delay, "delay changed");
        self.publish(EventKind::DelayChanged { delay }).await;
        delay
    }

    fn snapshot(&self) -> OccupancySnapshot {
        OccupancySnapshot {
            occupied: self.occupied,
            remaining_seconds: self.remaining,
            delay: self.delay,
            countdown_running: self.timer.is_running(),
        }
    }

    async fn publish(&self, kind: EventKind) {
        let event = OccupancyEvent::new(self.accessory_id, kind);
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(%err, "failed to publish occupancy event");
        }
    }
}

/// Cheap, cloneable handle to a running aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorHandle {
    accessory: Arc<str>,
    inbox: mpsc::UnboundedSender<Command>,
}

impl AggregatorHandle {
    /// Ask the aggregator to re-poll its switches.
    ///
    /// Switches normally do this themselves through their notifier.
    ///
    /// # Errors
    ///
    /// Returns [`OccupancyError::Unavailable`] if the task has stopped.
    pub fn notify_switch_changed(&self, switch: SwitchId) -> Result<(), OccupancyError> {
        self.inbox
            .send(Command::SwitchChanged(switch))
            .map_err(|_| self.unavailable())
    }

    /// Current occupancy state, answered after every message queued before
    /// this one.
    ///
    /// # Errors
    ///
    /// Returns [`OccupancyError::Unavailable`] if the task has stopped.
    pub async fn snapshot(&self) -> Result<OccupancySnapshot, OccupancyError> {
        let (reply, answer) = oneshot::channel();
        self.inbox
            .send(Command::Snapshot { reply })
            .map_err(|_| self.unavailable())?;
        answer.await.map_err(|_| self.unavailable())
    }

    /// Store a new delay for the next release countdown.
    ///
    /// # Errors
    ///
    /// Returns [`OccupancyError::Unavailable`] if the task has stopped.
    pub async fn set_delay(&self, delay: Delay) -> Result<Delay, OccupancyError> {
        let (reply, answer) = oneshot::channel();
        self.inbox
            .send(Command::Reconfigure { delay, reply })
            .map_err(|_| self.unavailable())?;
        answer.await.map_err(|_| self.unavailable())
    }

    /// Ask the task to stop after the messages already queued. Cancels any
    /// running countdown. Stopping a stopped aggregator is a no-op.
    pub fn shutdown(&self) {
        let _ = self.inbox.send(Command::Shutdown);
    }

    fn unavailable(&self) -> OccupancyError {
        UnavailableError {
            accessory: self.accessory.to_string(),
        }
        .into()
    }
}

impl ReconfigurationPort for AggregatorHandle {
    fn reconfigure(
        &self,
        delay_seconds: i64,
    ) -> impl Future<Output = Result<Delay, OccupancyError>> + Send {
        self.set_delay(Delay::clamped(delay_seconds))
    }
}
