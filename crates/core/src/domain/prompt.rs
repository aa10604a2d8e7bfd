use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::participant::{DailyName, UserId};

/// Per-day reminder bookkeeping, one row per (user, daily, date). Created
/// lazily the first time the scheduler looks at a participant on a date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub user_id: UserId,
    pub daily: DailyName,
    pub date: NaiveDate,
    pub last_prompted_at: Option<DateTime<Utc>>,
    pub submitted: bool,
}

impl Prompt {
    pub fn fresh(user_id: UserId, daily: DailyName, date: NaiveDate) -> Self {
        Self { user_id, daily, date, last_prompted_at: None, submitted: false }
    }

    /// True when a reminder went out within the last `throttle_minutes`.
    pub fn throttled(&self, now: DateTime<Utc>, throttle_minutes: i64) -> bool {
        match self.last_prompted_at {
            Some(at) => (now - at).num_minutes() < throttle_minutes,
            None => false,
        }
    }
}
