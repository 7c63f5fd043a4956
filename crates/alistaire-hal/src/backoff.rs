//! Bounded exponential backoff for status polling.

use std::time::Duration;

use crate::error::{HalError, HalResult};

/// Polling cadence used by the dispatcher.
///
/// Intervals start at `initial`, grow by `factor` after every poll and never
/// exceed `max_interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub initial: Duration,
    pub factor: u32,
    pub max_interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(50),
            factor: 2,
            max_interval: Duration::from_secs(2),
        }
    }
}

impl PollPolicy {
    pub fn new(initial: Duration, factor: u32, max_interval: Duration) -> HalResult<Self> {
        let policy = Self {
            initial,
            factor,
            max_interval,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> HalResult<()> {
        if self.initial.is_zero() {
            return Err(HalError::InvalidConfiguration(
                "initial poll interval must be positive".into(),
            ));
        }
        if self.factor == 0 {
            return Err(HalError::InvalidConfiguration(
                "backoff factor must be at least 1".into(),
            ));
        }
        if self.max_interval < self.initial {
            return Err(HalError::InvalidConfiguration(
                "poll ceiling is below the initial interval".into(),
            ));
        }
        Ok(())
    }

    /// Infinite sequence of sleep intervals.
    pub fn intervals(&self) -> Backoff {
        Backoff {
            next: self.initial.min(self.max_interval),
            factor: self.factor,
            ceiling: self.max_interval,
        }
    }
}

/// Iterator over backoff intervals; see [`PollPolicy::intervals`].
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    factor: u32,
    ceiling: Duration,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        self.next = current
            .checked_mul(self.factor)
            .unwrap_or(self.ceiling)
            .min(self.ceiling);
        Some(current)
    }
}
