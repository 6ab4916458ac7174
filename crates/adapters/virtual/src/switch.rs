//! Virtual switch — an in-memory boolean that accepts writes through a
//! single exposed capability.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use occupancy_timer_app::ports::{SwitchInput, SwitchNotifier};
use occupancy_timer_domain::characteristic::Capability;
use occupancy_timer_domain::error::{OccupancyError, ReadError, ValidationError};
use occupancy_timer_domain::id::SwitchId;

/// A simulated switch.
///
/// Only the capability chosen at construction accepts writes. The
/// attached notifier fires when a write changes the value, never for a
/// write that leaves it as it was.
pub struct VirtualSwitch {
    id: SwitchId,
    name: String,
    capability: Capability,
    on: AtomicBool,
    reachable: AtomicBool,
    latency: Duration,
    notifier: Mutex<Option<SwitchNotifier>>,
}

impl VirtualSwitch {
    #[must_use]
    pub fn new(id: SwitchId, name: impl Into<String>, capability: Capability) -> Self {
        Self {
            id,
            name: name.into(),
            capability,
            on: AtomicBool::new(false),
            reachable: AtomicBool::new(true),
            latency: Duration::ZERO,
            notifier: Mutex::new(None),
        }
    }

    /// Delay every read by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The capability that accepts writes.
    #[must_use]
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Make reads fail until called again with `true`.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn lock_notifier(&self) -> MutexGuard<'_, Option<SwitchNotifier>> {
        self.notifier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl SwitchInput for VirtualSwitch {
    fn id(&self) -> SwitchId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> Result<bool, OccupancyError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(ReadError::Unreachable { switch: self.id }.into());
        }
        Ok(self.on.load(Ordering::SeqCst))
    }

    fn attach(&self, notifier: SwitchNotifier) {
        *self.lock_notifier() = Some(notifier);
    }

    fn actuate(&self, capability: Capability, on: bool) -> Result<bool, OccupancyError> {
        if capability != self.capability {
            return Err(ValidationError::CapabilityNotExposed { capability }.into());
        }

        let previous = self.on.swap(on, Ordering::SeqCst);
        if previous != on {
            tracing::debug!(switch = %self.name, on, "virtual switch changed");
            let notifier = self.lock_notifier().clone();
            if let Some(notifier) = notifier {
                notifier.notify();
            }
        }
        Ok(on)
    }
}
