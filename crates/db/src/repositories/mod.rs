use async_trait::async_trait;
use thiserror::Error;

use huddle_core::chrono::{DateTime, NaiveDate, Utc};
use huddle_core::domain::ooo::OooRecord;
use huddle_core::domain::participant::{DailyName, Participant, UserId};
use huddle_core::domain::prompt::Prompt;
use huddle_core::domain::submission::Submission;
use huddle_core::domain::timezone::TimezoneOffset;
use huddle_core::domain::work_item::{WorkItem, WorkItemId};

pub mod memory;
pub mod ooo;
pub mod participant;
pub mod prompt;
pub mod submission;
pub mod timezone;
pub mod work_item;

pub use memory::{
    InMemoryOooRepository, InMemoryParticipantRepository, InMemoryPromptRepository,
    InMemorySubmissionRepository, InMemoryTimezoneRepository, InMemoryWorkItemRepository,
};
pub use ooo::SqlOooRepository;
pub use participant::SqlParticipantRepository;
pub use prompt::SqlPromptRepository;
pub use submission::SqlSubmissionRepository;
pub use timezone::SqlTimezoneRepository;
pub use work_item::SqlWorkItemRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ParticipantRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Participant>, RepositoryError>;
    async fn list_for_daily(&self, daily: &DailyName) -> Result<Vec<Participant>, RepositoryError>;
    async fn save(&self, participant: Participant) -> Result<(), RepositoryError>;
    async fn remove(&self, user: &UserId, daily: &DailyName) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait PromptRepository: Send + Sync {
    /// Fetch the (user, daily, date) row, creating an empty one on first
    /// contact. The upsert keeps re-runs idempotent.
    async fn load_or_create(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<Prompt, RepositoryError>;

    async fn mark_prompted(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    async fn mark_submitted(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<(), RepositoryError>;

    async fn purge_older_than(&self, cutoff: NaiveDate) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn find(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<Option<Submission>, RepositoryError>;

    /// Most recent submission strictly before `date`, for pre-fill.
    async fn find_latest_before(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<Option<Submission>, RepositoryError>;

    async fn upsert(&self, submission: Submission) -> Result<(), RepositoryError>;

    async fn mark_posted(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<(), RepositoryError>;

    async fn list_unposted(&self) -> Result<Vec<Submission>, RepositoryError>;

    async fn list_for_daily_between(
        &self,
        daily: &DailyName,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Submission>, RepositoryError>;

    async fn purge_older_than(&self, cutoff: NaiveDate) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait WorkItemRepository: Send + Sync {
    async fn save(&self, item: WorkItem) -> Result<(), RepositoryError>;

    /// Open (pending or carried) rows matching the exact text, used by
    /// disposition matching.
    async fn find_open_by_text(
        &self,
        user: &UserId,
        daily: &DailyName,
        text: &str,
    ) -> Result<Vec<WorkItem>, RepositoryError>;

    async fn list_open_for_daily(
        &self,
        daily: &DailyName,
    ) -> Result<Vec<WorkItem>, RepositoryError>;

    async fn list_for_daily_created_between(
        &self,
        daily: &DailyName,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WorkItem>, RepositoryError>;

    /// Set `snoozed_until` on one item. Returns whether a row matched.
    async fn snooze(&self, id: &WorkItemId, until: NaiveDate) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait OooRepository: Send + Sync {
    async fn save(&self, record: OooRecord) -> Result<(), RepositoryError>;
    async fn clear(&self, user: &UserId, daily: &DailyName) -> Result<(), RepositoryError>;

    /// Record whose inclusive range covers `date`, if any.
    async fn active_for(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<Option<OooRecord>, RepositoryError>;
}

#[async_trait]
pub trait TimezoneCacheRepository: Send + Sync {
    async fn find(&self, user: &UserId) -> Result<Option<TimezoneOffset>, RepositoryError>;
    async fn put(&self, entry: TimezoneOffset) -> Result<(), RepositoryError>;
}

pub(crate) fn parse_date(column: &str, value: String) -> Result<NaiveDate, RepositoryError> {
    value.parse::<NaiveDate>().map_err(|error| {
        RepositoryError::Decode(format!("invalid date in `{column}`: `{value}` ({error})"))
    })
}

pub(crate) fn parse_timestamp(
    column: &str,
    value: String,
) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

pub(crate) fn parse_optional_timestamp(
    column: &str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    value.map(|timestamp| parse_timestamp(column, timestamp)).transpose()
}

pub(crate) fn parse_optional_date(
    column: &str,
    value: Option<String>,
) -> Result<Option<NaiveDate>, RepositoryError> {
    value.map(|date| parse_date(column, date)).transpose()
}

pub(crate) fn parse_u32(column: &str, value: i64) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| {
        RepositoryError::Decode(format!(
            "invalid value for `{column}` (expected non-negative u32): {value}"
        ))
    })
}
