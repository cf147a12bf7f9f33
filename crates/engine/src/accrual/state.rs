//! Accrual bookkeeping, free of any clock or I/O

use hostcredits_core::{interval_progress, EarnConfig};
use serde::Serialize;
use std::fmt;

/// What was submitted with an outstanding claim
///
/// Recorded at submission so success can subtract exactly what was sent,
/// even when more intervals complete while the request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClaimTicket {
    pub intervals: u64,
    pub credits: u64,
    /// Whole intervals covered when the claim was sent; 0 after a config change
    pub interval_index: u64,
}

/// Why a claim could not be started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClaimRejected {
    NothingToClaim,
    InFlight,
}

impl fmt::Display for ClaimRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimRejected::NothingToClaim => write!(f, "nothing to claim yet"),
            ClaimRejected::InFlight => write!(f, "a claim is already in flight"),
        }
    }
}

/// Point-in-time view of the accrual counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccrualSnapshot {
    pub config: EarnConfig,
    pub elapsed_seconds: u64,
    pub earned_unclaimed: u64,
    pub unclaimed_intervals: u64,
    pub visible: bool,
    pub claim_in_flight: bool,
    /// Percentage of the current interval already elapsed
    pub progress: f64,
}

/// Visibility-driven accrual counters
#[derive(Debug, Clone)]
pub struct AccrualState {
    config: EarnConfig,
    elapsed_seconds: u64,
    earned_unclaimed: u64,
    unclaimed_intervals: u64,
    last_claimed_interval_index: u64,
    visible: bool,
    in_flight: Option<ClaimTicket>,
}

impl AccrualState {
    pub fn new(config: EarnConfig, visible: bool) -> Self {
        Self {
            config,
            elapsed_seconds: 0,
            earned_unclaimed: 0,
            unclaimed_intervals: 0,
            last_claimed_interval_index: 0,
            visible,
            in_flight: None,
        }
    }

    pub fn config(&self) -> EarnConfig {
        self.config
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn earned_unclaimed(&self) -> u64 {
        self.earned_unclaimed
    }

    pub fn unclaimed_intervals(&self) -> u64 {
        self.unclaimed_intervals
    }

    pub fn last_claimed_interval_index(&self) -> u64 {
        self.last_claimed_interval_index
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn in_flight(&self) -> Option<ClaimTicket> {
        self.in_flight
    }

    pub fn progress(&self) -> f64 {
        interval_progress(self.elapsed_seconds, self.config.interval_seconds)
    }

    pub fn snapshot(&self) -> AccrualSnapshot {
        AccrualSnapshot {
            config: self.config,
            elapsed_seconds: self.elapsed_seconds,
            earned_unclaimed: self.earned_unclaimed,
            unclaimed_intervals: self.unclaimed_intervals,
            visible: self.visible,
            claim_in_flight: self.in_flight.is_some(),
            progress: self.progress(),
        }
    }

    /// One second of visible time. Returns the credits granted by this tick.
    pub fn tick(&mut self) -> u64 {
        if !self.visible {
            return 0;
        }

        self.elapsed_seconds += 1;
        let completed = self.elapsed_seconds / self.config.interval_seconds;
        if completed <= self.last_claimed_interval_index {
            return 0;
        }

        let intervals = completed - self.last_claimed_interval_index;
        let credits = intervals.saturating_mul(self.config.credits_per_interval);
        self.unclaimed_intervals += intervals;
        self.earned_unclaimed = self.earned_unclaimed.saturating_add(credits);
        self.last_claimed_interval_index = completed;
        credits
    }

    /// Apply a visibility change.
    ///
    /// Becoming hidden with something earned and no claim outstanding starts
    /// a claim; the returned ticket is what must be submitted.
    pub fn set_visible(&mut self, visible: bool) -> Option<ClaimTicket> {
        if self.visible == visible {
            return None;
        }
        self.visible = visible;
        if visible {
            return None;
        }
        self.begin_claim().ok()
    }

    /// Start a claim for everything earned so far
    pub fn begin_claim(&mut self) -> Result<ClaimTicket, ClaimRejected> {
        if self.in_flight.is_some() {
            return Err(ClaimRejected::InFlight);
        }
        if self.earned_unclaimed == 0 {
            return Err(ClaimRejected::NothingToClaim);
        }

        let ticket = ClaimTicket {
            intervals: self.unclaimed_intervals,
            credits: self.earned_unclaimed,
            interval_index: self.last_claimed_interval_index,
        };
        self.in_flight = Some(ticket);
        Ok(ticket)
    }

    /// The backend confirmed the outstanding claim.
    ///
    /// Removes exactly what the ticket carried. When no interval completed
    /// in flight the counters start over from 0; otherwise elapsed time and
    /// the interval index are both cut back by the ticket's whole intervals,
    /// so intervals completed in flight stay counted exactly once.
    ///
    /// Returns `None` when no claim was outstanding, so a duplicate
    /// confirmation changes nothing.
    pub fn claim_succeeded(&mut self) -> Option<ClaimTicket> {
        let ticket = self.in_flight.take()?;

        self.earned_unclaimed = self.earned_unclaimed.saturating_sub(ticket.credits);
        self.unclaimed_intervals = self.unclaimed_intervals.saturating_sub(ticket.intervals);

        let completed_in_flight = self.last_claimed_interval_index > ticket.interval_index;
        if completed_in_flight || ticket.interval_index == 0 {
            let claimed_seconds = ticket
                .interval_index
                .saturating_mul(self.config.interval_seconds);
            self.elapsed_seconds = self.elapsed_seconds.saturating_sub(claimed_seconds);
            self.last_claimed_interval_index -= ticket.interval_index;
        } else {
            self.elapsed_seconds = 0;
            self.last_claimed_interval_index = 0;
        }

        Some(ticket)
    }

    /// The outstanding claim failed; counters stay as they were
    pub fn claim_failed(&mut self) -> Option<ClaimTicket> {
        self.in_flight.take()
    }

    /// Switch to a new earn configuration from the next tick on.
    ///
    /// Banked credits are kept. Progress into the current interval is carried
    /// over proportionally, capped below one full new interval.
    pub fn update_config(&mut self, config: EarnConfig) {
        if config == self.config {
            return;
        }

        let old_interval = self.config.interval_seconds;
        let partial = self
            .elapsed_seconds
            .saturating_sub(self.last_claimed_interval_index.saturating_mul(old_interval));
        let rebased = (u128::from(partial) * u128::from(config.interval_seconds)
            / u128::from(old_interval))
        .min(u128::from(config.interval_seconds - 1));

        self.config = config;
        // Below the new interval, so it fits
        self.elapsed_seconds = rebased as u64;
        self.last_claimed_interval_index = 0;

        // Elapsed time was already rebased; success must not cut it back again
        if let Some(ticket) = self.in_flight.as_mut() {
            ticket.interval_index = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(cpi: u64, interval: u64) -> EarnConfig {
        EarnConfig::new(cpi, interval).unwrap()
    }

    fn ticks(state: &mut AccrualState, n: u64) -> u64 {
        (0..n).map(|_| state.tick()).sum()
    }

    #[test]
    fn test_earned_matches_completed_intervals() {
        let mut state = AccrualState::new(config(3, 7), true);
        for _ in 0..100 {
            state.tick();
            let expected = 3 * (state.elapsed_seconds() / 7);
            assert_eq!(state.earned_unclaimed(), expected);
            assert_eq!(state.unclaimed_intervals(), state.elapsed_seconds() / 7);
        }
    }

    #[test]
    fn test_partial_interval_grants_nothing() {
        let mut state = AccrualState::new(config(1, 60), true);
        assert_eq!(ticks(&mut state, 59), 0);
        assert_eq!(state.earned_unclaimed(), 0);
        assert_eq!(state.tick(), 1);
        assert_eq!(state.last_claimed_interval_index(), 1);
    }

    #[test]
    fn test_hidden_ticks_ignored() {
        let mut state = AccrualState::new(config(1, 2), false);
        assert_eq!(ticks(&mut state, 10), 0);
        assert_eq!(state.elapsed_seconds(), 0);
    }

    #[test]
    fn test_hide_starts_claim_once() {
        let mut state = AccrualState::new(config(1, 2), true);
        ticks(&mut state, 10);
        assert_eq!(state.earned_unclaimed(), 5);

        let ticket = state.set_visible(false).unwrap();
        assert_eq!(ticket.intervals, 5);
        assert_eq!(ticket.credits, 5);

        // Repeated hide and a second hide cycle do not resubmit
        assert!(state.set_visible(false).is_none());
        assert!(state.set_visible(true).is_none());
        assert!(state.set_visible(false).is_none());

        assert_eq!(state.claim_succeeded(), Some(ticket));
        assert_eq!(state.earned_unclaimed(), 0);
        assert_eq!(state.unclaimed_intervals(), 0);
        assert_eq!(state.elapsed_seconds(), 0);
        assert_eq!(state.last_claimed_interval_index(), 0);
    }

    #[test]
    fn test_hide_with_nothing_earned() {
        let mut state = AccrualState::new(config(1, 60), true);
        ticks(&mut state, 30);
        assert!(state.set_visible(false).is_none());
        assert!(state.in_flight().is_none());
    }

    #[test]
    fn test_failed_claim_is_retryable() {
        let mut state = AccrualState::new(config(1, 2), true);
        ticks(&mut state, 6);
        let first = state.begin_claim().unwrap();
        assert_eq!(state.begin_claim(), Err(ClaimRejected::InFlight));

        state.claim_failed();
        assert_eq!(state.earned_unclaimed(), 3);

        let retry = state.begin_claim().unwrap();
        assert_eq!(retry, first);
        state.claim_succeeded();
        assert_eq!(state.earned_unclaimed(), 0);

        // Late duplicate confirmation changes nothing
        assert!(state.claim_succeeded().is_none());
        assert_eq!(state.begin_claim(), Err(ClaimRejected::NothingToClaim));
    }

    #[test]
    fn test_accrual_during_flight_is_kept() {
        let mut state = AccrualState::new(config(1, 2), true);
        ticks(&mut state, 10);
        state.begin_claim().unwrap();
        ticks(&mut state, 3);
        assert_eq!(state.earned_unclaimed(), 6);

        state.claim_succeeded();
        assert_eq!(state.earned_unclaimed(), 1);
        assert_eq!(state.unclaimed_intervals(), 1);
        assert_eq!(state.elapsed_seconds(), 3);
        assert_eq!(state.last_claimed_interval_index(), 1);

        // The next interval completes at the right time
        assert_eq!(state.tick(), 1);
        assert_eq!(state.earned_unclaimed(), 2);
    }

    #[test]
    fn test_unaligned_claim_never_counts_an_interval_twice() {
        let mut state = AccrualState::new(config(1, 60), true);
        ticks(&mut state, 61);
        state.begin_claim().unwrap();

        // The second interval completes while the claim is in flight
        let mut granted = 1;
        granted += ticks(&mut state, 59);
        assert_eq!(granted, 2);

        state.claim_succeeded();
        assert_eq!(state.earned_unclaimed(), 1);
        assert_eq!(state.elapsed_seconds(), 60);
        assert_eq!(state.last_claimed_interval_index(), 1);

        for t in 121..=240u64 {
            granted += state.tick();
            assert!(granted <= t / 60, "{} intervals granted by t={}", granted, t);
        }
        assert_eq!(granted, 4);
        assert_eq!(state.earned_unclaimed(), 3);
    }

    #[test]
    fn test_unaligned_claim_with_nothing_completed_in_flight_resets() {
        let mut state = AccrualState::new(config(1, 60), true);
        ticks(&mut state, 61);
        state.begin_claim().unwrap();
        ticks(&mut state, 10);

        state.claim_succeeded();
        assert_eq!(state.earned_unclaimed(), 0);
        assert_eq!(state.elapsed_seconds(), 0);
        assert_eq!(state.last_claimed_interval_index(), 0);
        assert_eq!(ticks(&mut state, 59), 0);
        assert_eq!(state.tick(), 1);
    }

    #[test]
    fn test_large_server_values_do_not_overflow() {
        let mut state = AccrualState::new(config(u64::MAX, 1), true);
        assert_eq!(state.tick(), u64::MAX);
        state.tick();
        assert_eq!(state.earned_unclaimed(), u64::MAX);

        let mut state = AccrualState::new(config(1, 60), true);
        ticks(&mut state, 30);
        state.update_config(config(1, u64::MAX));
        assert_eq!(state.elapsed_seconds(), u64::MAX / 2);
        assert_eq!(state.earned_unclaimed(), 0);
    }

    #[test]
    fn test_config_change_only_affects_future_ticks() {
        let mut state = AccrualState::new(config(1, 60), true);
        ticks(&mut state, 100);
        assert_eq!(state.earned_unclaimed(), 1);

        state.update_config(config(1, 30));
        assert_eq!(state.earned_unclaimed(), 1);
        assert_eq!(state.elapsed_seconds(), 20);
        assert_eq!(state.last_claimed_interval_index(), 0);

        assert_eq!(ticks(&mut state, 9), 0);
        assert_eq!(state.tick(), 1);
        assert_eq!(state.earned_unclaimed(), 2);
    }

    #[test]
    fn test_config_change_never_grants_retroactively() {
        let mut state = AccrualState::new(config(1, 60), true);
        ticks(&mut state, 59);
        state.update_config(config(5, 10));
        assert_eq!(state.earned_unclaimed(), 0);
        assert_eq!(state.elapsed_seconds(), 9);
        assert_eq!(state.tick(), 5);
    }

    #[test]
    fn test_config_change_while_claim_in_flight() {
        let mut state = AccrualState::new(config(1, 10), true);
        ticks(&mut state, 25);
        state.begin_claim().unwrap();
        state.update_config(config(1, 20));
        assert_eq!(state.elapsed_seconds(), 10);

        state.claim_succeeded();
        assert_eq!(state.earned_unclaimed(), 0);
        assert_eq!(state.elapsed_seconds(), 10);
        assert_eq!(ticks(&mut state, 10), 1);
    }

    #[test]
    fn test_snapshot() {
        let mut state = AccrualState::new(config(2, 4), true);
        ticks(&mut state, 6);
        let snap = state.snapshot();
        assert_eq!(snap.earned_unclaimed, 2);
        assert_eq!(snap.unclaimed_intervals, 1);
        assert_eq!(snap.progress, 50.0);
        assert!(snap.visible);
        assert!(!snap.claim_in_flight);
    }
}
