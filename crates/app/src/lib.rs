//! # occupancy-timer-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - `SwitchInput` — a boolean input that can be read and actuated
//!   - `EventPublisher` — outward publication of occupancy events
//!   - `ReconfigurationPort` — runtime delay updates from an external actor
//! - Provide the **countdown timer** and the **aggregator worker** that owns
//!   one accessory's occupancy state
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//! - Host any number of accessories through `AccessoryService`
//!
//! ## Dependency rule
//! Depends on `occupancy-timer-domain` only (plus `tokio` for tasks,
//! channels and time). Never imports adapter crates.

pub mod aggregator;
pub mod event_bus;
pub mod ports;
pub mod services;
pub mod timer;
