//! Cooldown bookkeeping driven by the backend's earn answers

use hostcredits_core::EarnOutcome;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CooldownSnapshot {
    pub remaining_seconds: u64,
    pub can_earn: bool,
    pub attempt_in_flight: bool,
}

/// Local countdown toward the next allowed earn
#[derive(Debug, Clone, Default)]
pub struct CooldownState {
    remaining_seconds: u64,
    in_flight: bool,
}

impl CooldownState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn can_earn(&self) -> bool {
        self.remaining_seconds == 0
    }

    pub fn attempt_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn snapshot(&self) -> CooldownSnapshot {
        CooldownSnapshot {
            remaining_seconds: self.remaining_seconds,
            can_earn: self.can_earn(),
            attempt_in_flight: self.in_flight,
        }
    }

    /// Mark an attempt as outstanding. False if one already is.
    ///
    /// A running countdown does not block the attempt; the backend decides.
    pub fn begin_attempt(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Adopt the backend's answer
    pub fn apply(&mut self, outcome: &EarnOutcome) {
        self.in_flight = false;
        self.remaining_seconds = match outcome {
            EarnOutcome::Granted { next_earn_in, .. } => *next_earn_in,
            EarnOutcome::Rejected {
                remaining_seconds, ..
            } => *remaining_seconds,
        };
    }

    pub fn attempt_failed(&mut self) {
        self.in_flight = false;
    }

    /// One second of countdown. Returns true on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if self.remaining_seconds == 0 {
            return false;
        }
        self.remaining_seconds -= 1;
        self.remaining_seconds == 0
    }
}
