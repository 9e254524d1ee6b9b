//! The shared logical clock.
//!
//! Timestamps are seconds on the ledger's monotonically increasing logical
//! clock, visible identically to every participant. All deadline checks
//! compare against this clock, never against any node's wall clock, so all
//! observers agree on whether a window has opened or closed.
//!
//! Governance windows are denominated in whole days (`vote_prepare_days`,
//! `signing_days`, ...), hence the day helpers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds in one logical day.
pub const SECS_PER_DAY: u64 = 86_400;

/// A point on the shared logical clock, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// This timestamp advanced by a whole number of days.
    pub fn add_days(&self, days: u16) -> Self {
        Self(self.0.saturating_add(u64::from(days) * SECS_PER_DAY))
    }

    /// This timestamp advanced by raw seconds.
    pub fn add_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Whether this deadline has passed (inclusive) relative to `now`.
    pub fn has_passed(&self, now: Timestamp) -> bool {
        now.0 >= self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}
