//! Earn-rate configuration
//!
//! The backend exposes the same two numbers under two different shapes:
//! `GET /config` answers `{credits_per_interval, interval_seconds}` while
//! `GET /admin/settings` answers `{credit_amount, credit_interval, ...}`.
//! Both are resolved once into [`EarnConfig`] at the client boundary.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Canonical earn configuration used by the timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EarnConfig {
    pub credits_per_interval: u64,
    pub interval_seconds: u64,
}

impl EarnConfig {
    pub fn new(credits_per_interval: u64, interval_seconds: u64) -> Result<Self> {
        if credits_per_interval == 0 {
            return Err(Error::InvalidData(
                "credits per interval must be greater than zero".into(),
            ));
        }
        if interval_seconds == 0 {
            return Err(Error::InvalidData(
                "interval seconds must be greater than zero".into(),
            ));
        }
        Ok(Self {
            credits_per_interval,
            interval_seconds,
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for EarnConfig {
    fn default() -> Self {
        Self {
            credits_per_interval: 1,
            interval_seconds: 60,
        }
    }
}

/// Either wire shape of the earn configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawEarnConfig {
    Public {
        credits_per_interval: u64,
        interval_seconds: u64,
    },
    Settings {
        credit_amount: u64,
        credit_interval: u64,
    },
}

impl TryFrom<RawEarnConfig> for EarnConfig {
    type Error = Error;

    fn try_from(raw: RawEarnConfig) -> Result<Self> {
        match raw {
            RawEarnConfig::Public {
                credits_per_interval,
                interval_seconds,
            } => EarnConfig::new(credits_per_interval, interval_seconds),
            RawEarnConfig::Settings {
                credit_amount,
                credit_interval,
            } => EarnConfig::new(credit_amount, credit_interval),
        }
    }
}

/// Global settings document managed from the admin panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSettings {
    pub credit_amount: u64,
    /// Seconds between discrete earns
    pub credit_interval: u64,
    #[serde(default = "default_anti_adblock")]
    pub anti_adblock_enabled: bool,
}

fn default_anti_adblock() -> bool {
    true
}

impl AdminSettings {
    pub fn earn_config(&self) -> Result<EarnConfig> {
        EarnConfig::new(self.credit_amount, self.credit_interval)
    }
}

/// Partial update for `PUT /admin/settings`; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anti_adblock_enabled: Option<bool>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.credit_amount.is_none()
            && self.credit_interval.is_none()
            && self.anti_adblock_enabled.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::Validation("nothing to update".into()));
        }
        if self.credit_amount == Some(0) {
            return Err(Error::Validation("credit amount must be positive".into()));
        }
        if self.credit_interval == Some(0) {
            return Err(Error::Validation("credit interval must be positive".into()));
        }
        Ok(())
    }
}
