//! Hostcredits Networking - REST client and API wrappers for the credits backend

pub mod api;
pub mod http;

pub use http::CreditsClient;
