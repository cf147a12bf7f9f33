//! HTTP transport

mod client;

pub use client::{CreditsClient, DEFAULT_BASE_URL};
