//! Shared type definitions and newtypes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Credit amount (for clarity in function signatures)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Credits(pub i64);

impl Credits {
    pub fn new(amount: i64) -> Self {
        Credits(amount)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} credits", self.0)
    }
}

/// Remaining seconds rendered as `m:ss`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown(pub u64);

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Percentage of the current interval already elapsed, 0..100
pub fn interval_progress(elapsed_seconds: u64, interval_seconds: u64) -> f64 {
    if interval_seconds == 0 {
        return 0.0;
    }
    (elapsed_seconds % interval_seconds) as f64 / interval_seconds as f64 * 100.0
}
