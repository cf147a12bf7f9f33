//! High-level API wrappers for the credits backend
//!
//! These sit on top of the raw HTTP client and add validation before a
//! request is sent, plus fallbacks where the backend has more than one
//! way to answer.

mod admin;
mod shop;
mod user;

pub use admin::*;
pub use shop::*;
pub use user::*;
