//! Claim and earn models for `/credits/claim` and `/user/earn-credits`

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Body of `POST /credits/claim`
///
/// Only the interval count is sent; the backend converts it to credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClaimRequest {
    pub intervals: u64,
}

/// Response from `POST /credits/claim`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResponse {
    /// Authoritative balance after the claim
    pub total_credits: i64,
    #[serde(default)]
    pub message: Option<String>,
}

/// Raw response from `POST /user/earn-credits`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EarnResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    /// New balance (granted only)
    #[serde(default)]
    pub credits: Option<i64>,
    /// Seconds until the next earn is allowed (granted only)
    #[serde(default)]
    pub next_earn_in: Option<u64>,
    /// Seconds left on the cooldown (rejected only)
    #[serde(default)]
    pub remaining_seconds: Option<u64>,
    /// FastAPI error detail, present on non-2xx answers
    #[serde(default)]
    pub detail: Option<String>,
}

/// Typed result of a discrete earn attempt
///
/// A cooldown rejection is an expected business answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EarnOutcome {
    Granted {
        credits: i64,
        next_earn_in: u64,
        message: String,
    },
    Rejected {
        remaining_seconds: u64,
        message: String,
    },
}

impl TryFrom<EarnResponse> for EarnOutcome {
    type Error = Error;

    fn try_from(r: EarnResponse) -> Result<Self> {
        let message = if r.message.is_empty() {
            r.detail.unwrap_or_default()
        } else {
            r.message
        };

        if r.success {
            let credits = r
                .credits
                .ok_or_else(|| Error::InvalidData("earn grant without credits".into()))?;
            let next_earn_in = r
                .next_earn_in
                .ok_or_else(|| Error::InvalidData("earn grant without next_earn_in".into()))?;
            Ok(EarnOutcome::Granted {
                credits,
                next_earn_in,
                message,
            })
        } else {
            let remaining_seconds = r.remaining_seconds.ok_or_else(|| {
                Error::InvalidData(format!("earn rejected without remaining_seconds: {}", message))
            })?;
            Ok(EarnOutcome::Rejected {
                remaining_seconds,
                message,
            })
        }
    }
}
