//! # occupancy-timer-adapter-virtual
//!
//! In-memory switches for driving occupancy accessories without hardware.
//!
//! | Mode | Exposed capability | Writes through `on` |
//! |------|--------------------|---------------------|
//! | normal | `on` | accepted |
//! | protected | `enabled` | rejected |
//!
//! ## Dependency rule
//!
//! Depends on `occupancy-timer-app` (port traits) and
//! `occupancy-timer-domain` only.

mod switch;

use std::sync::Arc;
use std::time::Duration;

use occupancy_timer_domain::accessory::AccessoryConfig;
use occupancy_timer_domain::id::SwitchId;

pub use switch::VirtualSwitch;

/// Simulated transport behaviour applied to every switch of an accessory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Simulation {
    /// Delay added to every read.
    pub read_latency: Duration,
    /// Zero-based indices of switches whose reads fail.
    pub unreachable: Vec<usize>,
}

/// Build the switches of one accessory, named and gated after `config`.
///
/// Indices in `simulation.unreachable` past the last switch are ignored.
#[must_use]
pub fn switches_for(config: &AccessoryConfig, simulation: &Simulation) -> Vec<Arc<VirtualSwitch>> {
    let capability = config.actuation_capability();
    config
        .switch_names()
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            let switch = VirtualSwitch::new(SwitchId::new(index), name, capability)
                .with_latency(simulation.read_latency);
            if simulation.unreachable.contains(&index) {
                tracing::debug!(accessory = %config.name, index, "switch starts unreachable");
                switch.set_reachable(false);
            }
            Arc::new(switch)
        })
        .collect()
}
