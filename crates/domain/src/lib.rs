//! # occupancy-timer-domain
//!
//! Pure domain model for the occupancy timer.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **release delay** and its clamping rules
//! - Define **accessory configuration** (name, switch count, delay, protected mode)
//! - Define the **characteristic schema** published to the host
//! - Define the **occupancy decision policy** and **countdown arithmetic**
//! - Define the **events** published outward on every transition
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod accessory;
pub mod characteristic;
pub mod countdown;
pub mod delay;
pub mod event;
pub mod occupancy;
pub mod policy;
