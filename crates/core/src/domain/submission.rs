use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::participant::{DailyName, UserId};

/// A structured daily update, one row per (user, daily, date), upserted on
/// resubmission. `posted = false` marks a pre-filled "tomorrow mode" update
/// waiting for its scheduled post time in the author's timezone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub user_id: UserId,
    pub daily: DailyName,
    pub date: NaiveDate,
    pub done_items: Vec<String>,
    pub undone_items: Vec<String>,
    pub unplanned_items: Vec<String>,
    /// Carried-over items first, then newly stated plans. This ordering is
    /// what the next day's pre-fill reproduces.
    pub today_plans: Vec<String>,
    pub blockers: String,
    pub answers: Vec<String>,
    pub posted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn has_blockers(&self) -> bool {
        !self.blockers.trim().is_empty()
    }
}
