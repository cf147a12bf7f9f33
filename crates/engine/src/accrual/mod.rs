//! Visibility-driven accrual timer
//!
//! While the surface is visible a one-second tick accumulates elapsed time
//! and converts whole completed intervals into unclaimed credits. Hiding the
//! surface (or an explicit request) submits a claim for the completed
//! intervals; the backend's total then replaces the cached balance.

mod driver;
mod state;

pub use driver::{spawn_accrual_timer, AccrualEvent, AccrualHandle};
pub use state::{AccrualSnapshot, AccrualState, ClaimRejected, ClaimTicket};
