//! Time management for the agent
//!
//! Readings carry a wall-clock UTC timestamp. Sources that replay recorded
//! data without their own timestamps stamp each sample when it is pulled,
//! so they need a clock:
//! - System clock (live deployments and replays)
//! - Fixed clock (deterministic tests)

use chrono::{DateTime, Duration, Utc};

/// Source of wall-clock time
pub trait Clock {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed time source for testing
#[derive(Debug, Clone)]
pub struct FixedClock {
    timestamp: DateTime<Utc>,
}

impl FixedClock {
    /// Clock frozen at `timestamp`
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp }
    }

    /// Clock frozen at a Unix timestamp in seconds
    pub fn from_unix_secs(secs: i64) -> Self {
        Self {
            timestamp: DateTime::from_timestamp(secs, 0).unwrap_or_default(),
        }
    }

    /// Move the clock to `timestamp`
    pub fn set(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = timestamp;
    }

    /// Move the clock forward
    pub fn advance(&mut self, ms: i64) {
        self.timestamp += Duration::milliseconds(ms);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
