//! Trusted time
//!
//! Temporal claims are only as good as the clock they are compared against. A
//! clock that cannot vouch for the current time returns `None`, and the gate
//! refuses to arm rather than guessing.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current Unix time in seconds
pub trait Clock: Send + Sync {
    /// `None` when no trusted time is available
    fn now(&self) -> Option<i64>;
}

/// Wall clock of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Option<i64> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|d| i64::try_from(d.as_secs()).ok())
    }
}

/// A clock pinned to one instant, or to no time at all
///
/// Useful in simulation, where the vehicle clock is driven externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(Option<i64>);

impl FixedClock {
    pub fn at(unix_seconds: i64) -> Self {
        Self(Some(unix_seconds))
    }

    pub fn unavailable() -> Self {
        Self(None)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Option<i64> {
        self.0
    }
}
