use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::participant::UserId;

/// Cached timezone offset for a user, persisted externally and refreshed
/// from the chat platform when stale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneOffset {
    pub user_id: UserId,
    pub offset_seconds: i32,
    pub fetched_at: DateTime<Utc>,
}

impl TimezoneOffset {
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl_hours: i64) -> bool {
        (now - self.fetched_at).num_hours() < ttl_hours
    }
}
