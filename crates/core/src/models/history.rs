//! Credit history entries from `/user/credit-history`

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One balance adjustment (earn, purchase, admin action)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditHistoryEntry {
    pub id: String,
    pub user_id: String,
    /// Signed amount; purchases and removals are negative
    pub amount: i64,
    #[serde(default)]
    pub reason: String,
    /// ISO timestamp, with or without offset
    pub timestamp: String,
}

impl CreditHistoryEntry {
    /// Parse the timestamp; offset-less values are taken as UTC
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn is_credit(&self) -> bool {
        self.amount > 0
    }
}
