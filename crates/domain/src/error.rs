//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`OccupancyError`] via `#[from]`.

use crate::characteristic::Capability;
use crate::id::SwitchId;

/// Root error type shared by the domain and application layers.
#[derive(Debug, thiserror::Error)]
pub enum OccupancyError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(#[from] NotFoundError),

    #[error("switch read failed: {0}")]
    Read(#[from] ReadError),

    #[error("accessory unavailable: {0}")]
    Unavailable(#[from] UnavailableError),
}

/// A domain invariant was violated by caller input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("an accessory named {0:?} already exists")]
    DuplicateName(String),

    #[error("an accessory takes between 1 and {max} switches, got {count}")]
    SwitchCount { count: usize, max: usize },

    #[error("switch index {index} is out of range (accessory has {count} switches)")]
    SwitchOutOfRange { index: usize, count: usize },

    #[error("accessory expects {expected} switches but {actual} were supplied")]
    SwitchCountMismatch { expected: usize, actual: usize },

    #[error("capability {capability} is not exposed in this mode")]
    CapabilityNotExposed { capability: Capability },
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A switch could not report its current value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    #[error("switch {switch} did not answer within {timeout_ms} ms")]
    TimedOut { switch: SwitchId, timeout_ms: u64 },

    #[error("switch {switch} is unreachable")]
    Unreachable { switch: SwitchId },
}

/// The worker that owns an accessory's state is gone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("aggregator for {accessory:?} has stopped")]
pub struct UnavailableError {
    pub accessory: String,
}
