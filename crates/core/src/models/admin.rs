//! Admin-only request and response models

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Body of `POST /admin/add-credits` and `POST /admin/remove-credits`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditAdjustment {
    pub user_id: String,
    /// Always positive; the endpoint decides the sign
    pub amount: i64,
    pub reason: String,
}

impl CreditAdjustment {
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::Validation("user id must not be empty".into()));
        }
        if self.amount <= 0 {
            return Err(Error::Validation(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.reason.trim().is_empty() {
            return Err(Error::Validation("a reason is required".into()));
        }
        Ok(())
    }
}

/// Response from the admin credit endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub new_credits: i64,
}

/// Generic `{success, message}` acknowledgement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjustment_validation() {
        let ok = CreditAdjustment {
            user_id: "u1".into(),
            amount: 10,
            reason: "promo".into(),
        };
        assert!(ok.validate().is_ok());
        assert!(CreditAdjustment { amount: 0, ..ok.clone() }.validate().is_err());
        assert!(CreditAdjustment { reason: "".into(), ..ok.clone() }.validate().is_err());
        assert!(CreditAdjustment { user_id: " ".into(), ..ok }.validate().is_err());
    }
}
