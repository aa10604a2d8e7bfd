use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::participant::{DailyName, UserId};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItemId(pub String);

impl WorkItemId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Pending,
    Done,
    Dropped,
    Carried,
}

impl WorkItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Dropped => "dropped",
            Self::Carried => "carried",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "done" => Some(Self::Done),
            "dropped" => Some(Self::Dropped),
            "carried" => Some(Self::Carried),
            _ => None,
        }
    }

    /// Open items are the ones carry chains and bottleneck queries look at.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Carried)
    }
}

/// A single task text tracked across days. Carrying forward never creates a
/// new row: the same row's `carry_count` increments while the text reappears
/// in the next day's pre-fill.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub user_id: UserId,
    pub daily: DailyName,
    pub text: String,
    pub status: WorkItemStatus,
    pub carry_count: u32,
    pub created_date: NaiveDate,
    pub completed_date: Option<NaiveDate>,
    pub snoozed_until: Option<NaiveDate>,
}

impl WorkItem {
    pub fn new_plan(user_id: UserId, daily: DailyName, text: String, created: NaiveDate) -> Self {
        Self {
            id: WorkItemId::generate(),
            user_id,
            daily,
            text,
            status: WorkItemStatus::Pending,
            carry_count: 0,
            created_date: created,
            completed_date: None,
            snoozed_until: None,
        }
    }

    pub fn can_transition_to(&self, next: WorkItemStatus) -> bool {
        // Done and dropped are terminal.
        self.status.is_open() && next != WorkItemStatus::Pending
    }

    pub fn complete(&mut self, on: NaiveDate) -> Result<(), DomainError> {
        self.transition_to(WorkItemStatus::Done)?;
        self.completed_date = Some(on);
        Ok(())
    }

    pub fn drop_item(&mut self) -> Result<(), DomainError> {
        self.transition_to(WorkItemStatus::Dropped)
    }

    /// Survives another day unresolved: bump the carry count on this row.
    pub fn carry(&mut self) -> Result<(), DomainError> {
        self.transition_to(WorkItemStatus::Carried)?;
        self.carry_count += 1;
        Ok(())
    }

    /// Snoozed items stay out of bottleneck reports without changing state.
    pub fn snoozed_on(&self, date: NaiveDate) -> bool {
        matches!(self.snoozed_until, Some(until) if until > date)
    }

    fn transition_to(&mut self, next: WorkItemStatus) -> Result<(), DomainError> {
        if self.can_transition_to(next) {
            self.status = next;
            return Ok(());
        }
        Err(DomainError::InvalidItemTransition { from: self.status, to: next })
    }
}
