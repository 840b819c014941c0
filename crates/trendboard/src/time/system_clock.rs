use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::time::TimeSource;

/// Custom epoch: Wednesday, January 1, 2025 00:00:00 UTC
///
/// With 41 timestamp bits this leaves room until roughly 2094.
pub const CUSTOM_EPOCH: Duration = Duration::from_millis(1_735_689_600_000);

/// A wall-clock time source offset from a custom epoch.
///
/// Every call reads `SystemTime::now()`, so the value follows NTP steps and
/// manual adjustments, including backwards ones. The allocator detects such
/// regressions and refuses to issue identifiers rather than risk a repeat.
///
/// Readings taken before the epoch saturate to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemClock {
    epoch: Duration,
}

impl Default for SystemClock {
    /// Constructs a clock aligned to [`CUSTOM_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(CUSTOM_EPOCH)
    }
}

impl SystemClock {
    /// Constructs a clock whose zero point is `epoch`, given as a duration
    /// since 1970-01-01 UTC.
    pub const fn with_epoch(epoch: Duration) -> Self {
        Self { epoch }
    }

    /// The configured epoch.
    pub const fn epoch(&self) -> Duration {
        self.epoch
    }
}

impl TimeSource for SystemClock {
    #[allow(clippy::cast_possible_truncation)]
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .saturating_sub(self.epoch)
            .as_millis() as u64
    }
}
