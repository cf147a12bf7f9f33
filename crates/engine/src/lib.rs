//! Hostcredits Engine - Session state and the credit-earning timers
//!
//! Two earning models share one [`Session`] and one [`CreditsBackend`]:
//! the visibility-driven [`accrual`] timer and the server-gated
//! [`cooldown`] timer. In both, the backend's answer is the balance.

pub mod accrual;
pub mod backend;
pub mod cooldown;
pub mod session;

#[cfg(test)]
mod testing;

pub use accrual::{
    spawn_accrual_timer, AccrualEvent, AccrualHandle, AccrualSnapshot, AccrualState, ClaimRejected,
};
pub use backend::CreditsBackend;
pub use cooldown::{
    spawn_cooldown_timer, CooldownEvent, CooldownHandle, CooldownSnapshot, CooldownState,
};
pub use session::Session;
