//! Characteristic schema — the declarative description of every value the
//! host exposes for an occupancy accessory and its switches.
//!
//! Hosts register these definitions as-is; nothing here holds state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::delay::Delay;

/// Wire format of a characteristic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Bool,
    Uint8,
    Uint64,
}

/// Unit attached to a numeric characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Seconds,
}

/// Access right granted to controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Notify,
}

/// A single characteristic definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Characteristic {
    pub name: &'static str,
    pub uuid: &'static str,
    pub format: Format,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_step: Option<u64>,
    pub perms: &'static [Permission],
}

const READ_NOTIFY: &[Permission] = &[Permission::Read, Permission::Notify];
const READ_WRITE_NOTIFY: &[Permission] = &[Permission::Read, Permission::Write, Permission::Notify];

/// Seconds left before occupancy is released.
pub const TIME_REMAINING: Characteristic = Characteristic {
    name: "Time Remaining",
    uuid: "1000006D-0000-1000-8000-0026BB765291",
    format: Format::Uint64,
    unit: Some(Unit::Seconds),
    min_value: Some(0),
    max_value: Some(Delay::MAX_SECONDS as u64),
    min_step: Some(5),
    perms: READ_NOTIFY,
};

/// `1` while occupied, `0` otherwise.
pub const OCCUPANCY_DETECTED: Characteristic = Characteristic {
    name: "Occupancy Detected",
    uuid: "00000071-0000-1000-8000-0026BB765291",
    format: Format::Uint8,
    unit: None,
    min_value: Some(0),
    max_value: Some(1),
    min_step: Some(1),
    perms: READ_NOTIFY,
};

/// Plain power state, reachable from voice assistants.
pub const ON: Characteristic = Characteristic {
    name: "On",
    uuid: "00000025-0000-1000-8000-0026BB765291",
    format: Format::Bool,
    unit: None,
    min_value: None,
    max_value: None,
    min_step: None,
    perms: READ_WRITE_NOTIFY,
};

/// Gated power state used in protected mode.
pub const ENABLED: Characteristic = Characteristic {
    name: "Enabled",
    uuid: "10000071-0000-1000-8000-0026BB765291",
    format: Format::Bool,
    unit: None,
    min_value: None,
    max_value: None,
    min_step: None,
    perms: READ_WRITE_NOTIFY,
};

/// Every characteristic an accessory may register.
pub const ALL: [Characteristic; 4] = [OCCUPANCY_DETECTED, TIME_REMAINING, ON, ENABLED];

/// The switch capability an actuation is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    On,
    Enabled,
}

impl Capability {
    /// The capability that drives a switch in the given mode.
    #[must_use]
    pub fn for_mode(protected_mode: bool) -> Self {
        if protected_mode {
            Self::Enabled
        } else {
            Self::On
        }
    }

    #[must_use]
    pub fn characteristic(self) -> &'static Characteristic {
        match self {
            Self::On => &ON,
            Self::Enabled => &ENABLED,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Enabled => f.write_str("enabled"),
        }
    }
}
