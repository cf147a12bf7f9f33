//! Data models for hostcredits entities

mod admin;
mod claim;
mod config;
mod history;
mod notification;
mod shop;
mod user;

pub use admin::*;
pub use claim::*;
pub use config::*;
pub use history::*;
pub use notification::*;
pub use shop::*;
pub use user::*;
