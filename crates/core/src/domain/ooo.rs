use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::participant::{DailyName, UserId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OooId(pub String);

impl OooId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Out-of-office window. Covered dates are excused from both prompting and
/// scheduled posting; the range is inclusive on both ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OooRecord {
    pub id: OooId,
    pub user_id: UserId,
    pub daily: DailyName,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl OooRecord {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}
