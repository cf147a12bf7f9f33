//! Cooldown-claim timer
//!
//! A discrete earn action gated by the backend. The backend answers with a
//! grant or with the seconds left on the cooldown; the client only counts
//! that number down to re-enable the action.

mod driver;
mod state;

pub use driver::{spawn_cooldown_timer, CooldownEvent, CooldownHandle};
pub use state::{CooldownSnapshot, CooldownState};
