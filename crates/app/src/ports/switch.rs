//! Switch port — the boolean inputs an aggregator polls.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use occupancy_timer_domain::characteristic::Capability;
use occupancy_timer_domain::error::OccupancyError;
use occupancy_timer_domain::id::SwitchId;

/// Callback a switch invokes whenever its value changes.
///
/// Installed by the aggregator when it takes ownership of the switch.
#[derive(Clone)]
pub struct SwitchNotifier {
    callback: Arc<dyn Fn() + Send + Sync>,
}

impl SwitchNotifier {
    pub fn new(callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Signal that the switch changed. Never blocks.
    pub fn notify(&self) {
        (self.callback)();
    }
}

impl fmt::Debug for SwitchNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchNotifier").finish_non_exhaustive()
    }
}

/// One independently actuatable boolean input.
///
/// Implementations live in adapter crates (e.g. `adapter_virtual`).
pub trait SwitchInput: Send + Sync {
    /// Position of this switch inside its accessory.
    fn id(&self) -> SwitchId;

    /// Display name.
    fn name(&self) -> &str;

    /// Read the current value.
    ///
    /// This is an external read: it may take a while or fail. Callers treat
    /// every answer as a snapshot that may already be stale.
    fn read(&self) -> impl Future<Output = Result<bool, OccupancyError>> + Send;

    /// Install the notifier invoked after every change. Replaces any
    /// previous notifier.
    fn attach(&self, notifier: SwitchNotifier);

    /// Set the value through `capability`, returning the new value.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `capability` is not the one this
    /// switch exposes for actuation.
    fn actuate(&self, capability: Capability, on: bool) -> Result<bool, OccupancyError>;
}
