//! Accessory — one occupancy sensor plus the switches that drive it.

use serde::{Deserialize, Serialize};

use crate::characteristic::Capability;
use crate::delay::Delay;
use crate::error::{OccupancyError, ValidationError};
use crate::id::{AccessoryId, SwitchId};
use crate::occupancy::OccupancySnapshot;

/// Construction parameters of an occupancy accessory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryConfig {
    pub name: String,
    pub slave_count: usize,
    pub delay: Delay,
    pub protected_mode: bool,
}

impl AccessoryConfig {
    pub const DEFAULT_NAME: &'static str = "OccupancyTimer";

    /// Most switches one accessory can aggregate.
    pub const MAX_SWITCHES: usize = 64;

    /// Create a builder for constructing an [`AccessoryConfig`].
    #[must_use]
    pub fn builder() -> AccessoryConfigBuilder {
        AccessoryConfigBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`OccupancyError::Validation`] when `name` is blank or
    /// `slave_count` lies outside `1..=MAX_SWITCHES`.
    pub fn validate(&self) -> Result<(), OccupancyError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if !(1..=Self::MAX_SWITCHES).contains(&self.slave_count) {
            return Err(ValidationError::SwitchCount {
                count: self.slave_count,
                max: Self::MAX_SWITCHES,
            }
            .into());
        }
        Ok(())
    }

    /// Display names of the switches, in switch order.
    ///
    /// A lone switch shares the accessory name; several switches are
    /// numbered from one.
    #[must_use]
    pub fn switch_names(&self) -> Vec<String> {
        if self.slave_count == 1 {
            return vec![self.name.clone()];
        }
        (1..=self.slave_count)
            .map(|n| format!("{} {n}", self.name))
            .collect()
    }

    /// The capability that actuates this accessory's switches.
    #[must_use]
    pub fn actuation_capability(&self) -> Capability {
        Capability::for_mode(self.protected_mode)
    }
}

impl Default for AccessoryConfig {
    fn default() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            slave_count: 1,
            delay: Delay::ZERO,
            protected_mode: false,
        }
    }
}

/// Step-by-step builder for [`AccessoryConfig`].
///
/// Numeric inputs are clamped, never rejected.
#[derive(Debug, Default)]
pub struct AccessoryConfigBuilder {
    name: Option<String>,
    slave_count: Option<i64>,
    delay: Option<Delay>,
    protected_mode: bool,
}

impl AccessoryConfigBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Number of switches, clamped to `1..=`[`AccessoryConfig::MAX_SWITCHES`].
    #[must_use]
    pub fn slave_count(mut self, count: i64) -> Self {
        self.slave_count = Some(count);
        self
    }

    #[must_use]
    pub fn delay(mut self, delay: Delay) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn delay_seconds(self, seconds: i64) -> Self {
        self.delay(Delay::clamped(seconds))
    }

    #[must_use]
    pub fn protected_mode(mut self, protected_mode: bool) -> Self {
        self.protected_mode = protected_mode;
        self
    }

    /// Consume the builder, validate, and return an [`AccessoryConfig`].
    ///
    /// A missing name falls back to [`AccessoryConfig::DEFAULT_NAME`].
    ///
    /// # Errors
    ///
    /// Returns [`OccupancyError::Validation`] if the name is blank.
    pub fn build(self) -> Result<AccessoryConfig, OccupancyError> {
        let slave_count = self
            .slave_count
            .map_or(1, |count| {
                usize::try_from(count.max(1))
                    .unwrap_or(usize::MAX)
                    .min(AccessoryConfig::MAX_SWITCHES)
            });
        let config = AccessoryConfig {
            name: self
                .name
                .unwrap_or_else(|| AccessoryConfig::DEFAULT_NAME.to_string()),
            slave_count,
            delay: self.delay.unwrap_or_default(),
            protected_mode: self.protected_mode,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Current state of one switch, as reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchStatus {
    pub id: SwitchId,
    pub name: String,
    /// `None` when the switch failed to answer.
    pub on: Option<bool>,
    pub capability: Capability,
}

/// Current state of one accessory and its switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessoryStatus {
    pub id: AccessoryId,
    pub name: String,
    pub protected_mode: bool,
    #[serde(flatten)]
    pub occupancy: OccupancySnapshot,
    pub switches: Vec<SwitchStatus>,
}
