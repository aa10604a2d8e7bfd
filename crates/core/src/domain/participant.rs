use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::localtime::LocalTimeOfDay;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DailyName(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleName(pub String);

/// One person's membership in one daily. The schedule binding is immutable;
/// changing it means removing and re-adding the participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    pub daily: DailyName,
    pub schedule: ScheduleName,
    pub time_override: Option<LocalTimeOfDay>,
    pub created_at: DateTime<Utc>,
}
