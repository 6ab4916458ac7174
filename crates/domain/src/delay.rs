//! Release delay — how long occupancy is held after the last switch turns off.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Grace period in whole seconds, always within `0..=Delay::MAX_SECONDS`.
///
/// Out-of-range input is clamped rather than rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u32")]
pub struct Delay(u32);

impl Delay {
    /// Upper bound for the delay, one hour.
    pub const MAX_SECONDS: u32 = 3600;

    pub const ZERO: Self = Self(0);

    /// Clamp an arbitrary integer into the valid range.
    #[must_use]
    pub fn clamped(seconds: i64) -> Self {
        let bounded = seconds.clamp(0, i64::from(Self::MAX_SECONDS));
        // `bounded` fits in u32 after the clamp above.
        Self(u32::try_from(bounded).unwrap_or(Self::MAX_SECONDS))
    }

    /// Parse a textual delay the forgiving way: optional surrounding
    /// whitespace, an optional sign, then as many decimal digits as are
    /// present. Anything unparseable becomes zero.
    ///
    /// `"30"` → 30 s, `"45s"` → 45 s, `"-5"` → 0 s, `"soon"` → 0 s.
    #[must_use]
    pub fn parse_lenient(text: &str) -> Self {
        let trimmed = text.trim_start();
        let (negative, digits) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        let magnitude = digits[..end].parse::<i64>().unwrap_or(match end {
            0 => 0,
            // Longer than i64: saturate, the clamp takes it from there.
            _ => i64::MAX,
        });
        Self::clamped(if negative { -magnitude } else { magnitude })
    }

    #[must_use]
    pub fn seconds(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::from_secs(u64::from(self.0))
    }
}

impl From<i64> for Delay {
    fn from(seconds: i64) -> Self {
        Self::clamped(seconds)
    }
}

impl From<Delay> for u32 {
    fn from(delay: Delay) -> Self {
        delay.0
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
