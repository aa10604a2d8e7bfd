//! In-memory repository implementations backed by `RwLock<HashMap>`, used by
//! service-level tests that do not need a real database.

use std::collections::HashMap;

use tokio::sync::RwLock;

use huddle_core::chrono::{DateTime, NaiveDate, Utc};
use huddle_core::domain::ooo::OooRecord;
use huddle_core::domain::participant::{DailyName, Participant, UserId};
use huddle_core::domain::prompt::Prompt;
use huddle_core::domain::submission::Submission;
use huddle_core::domain::timezone::TimezoneOffset;
use huddle_core::domain::work_item::{WorkItem, WorkItemId};

use super::{
    OooRepository, ParticipantRepository, PromptRepository, RepositoryError, SubmissionRepository,
    TimezoneCacheRepository, WorkItemRepository,
};

#[derive(Default)]
pub struct InMemoryParticipantRepository {
    rows: RwLock<HashMap<(UserId, DailyName), Participant>>,
}

#[async_trait::async_trait]
impl ParticipantRepository for InMemoryParticipantRepository {
    async fn list_all(&self) -> Result<Vec<Participant>, RepositoryError> {
        let rows = self.rows.read().await;
        let mut all: Vec<Participant> = rows.values().cloned().collect();
        all.sort_by(|a, b| (&a.daily.0, &a.user_id.0).cmp(&(&b.daily.0, &b.user_id.0)));
        Ok(all)
    }

    async fn list_for_daily(&self, daily: &DailyName) -> Result<Vec<Participant>, RepositoryError> {
        let rows = self.rows.read().await;
        let mut matching: Vec<Participant> =
            rows.values().filter(|row| &row.daily == daily).cloned().collect();
        matching.sort_by(|a, b| a.user_id.0.cmp(&b.user_id.0));
        Ok(matching)
    }

    async fn save(&self, participant: Participant) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        rows.insert((participant.user_id.clone(), participant.daily.clone()), participant);
        Ok(())
    }

    async fn remove(&self, user: &UserId, daily: &DailyName) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        rows.remove(&(user.clone(), daily.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPromptRepository {
    rows: RwLock<HashMap<(UserId, DailyName, NaiveDate), Prompt>>,
}

#[async_trait::async_trait]
impl PromptRepository for InMemoryPromptRepository {
    async fn load_or_create(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<Prompt, RepositoryError> {
        let mut rows = self.rows.write().await;
        let entry = rows
            .entry((user.clone(), daily.clone(), date))
            .or_insert_with(|| Prompt::fresh(user.clone(), daily.clone(), date));
        Ok(entry.clone())
    }

    async fn mark_prompted(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        let entry = rows
            .entry((user.clone(), daily.clone(), date))
            .or_insert_with(|| Prompt::fresh(user.clone(), daily.clone(), date));
        entry.last_prompted_at = Some(at);
        Ok(())
    }

    async fn mark_submitted(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        let entry = rows
            .entry((user.clone(), daily.clone(), date))
            .or_insert_with(|| Prompt::fresh(user.clone(), daily.clone(), date));
        entry.submitted = true;
        Ok(())
    }

    async fn purge_older_than(&self, cutoff: NaiveDate) -> Result<u64, RepositoryError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|(_, _, date), _| *date >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemorySubmissionRepository {
    rows: RwLock<HashMap<(UserId, DailyName, NaiveDate), Submission>>,
}

#[async_trait::async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn find(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<Option<Submission>, RepositoryError> {
        let rows = self.rows.read().await;
        Ok(rows.get(&(user.clone(), daily.clone(), date)).cloned())
    }

    async fn find_latest_before(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<Option<Submission>, RepositoryError> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|row| &row.user_id == user && &row.daily == daily && row.date < date)
            .max_by_key(|row| row.date)
            .cloned())
    }

    async fn upsert(&self, submission: Submission) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        rows.insert(
            (submission.user_id.clone(), submission.daily.clone(), submission.date),
            submission,
        );
        Ok(())
    }

    async fn mark_posted(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        if let Some(row) = rows.get_mut(&(user.clone(), daily.clone(), date)) {
            row.posted = true;
        }
        Ok(())
    }

    async fn list_unposted(&self) -> Result<Vec<Submission>, RepositoryError> {
        let rows = self.rows.read().await;
        let mut unposted: Vec<Submission> =
            rows.values().filter(|row| !row.posted).cloned().collect();
        unposted.sort_by(|a, b| (a.date, &a.user_id.0).cmp(&(b.date, &b.user_id.0)));
        Ok(unposted)
    }

    async fn list_for_daily_between(
        &self,
        daily: &DailyName,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Submission>, RepositoryError> {
        let rows = self.rows.read().await;
        let mut matching: Vec<Submission> = rows
            .values()
            .filter(|row| &row.daily == daily && row.date >= from && row.date <= to)
            .cloned()
            .collect();
        matching.sort_by(|a, b| (a.date, &a.user_id.0).cmp(&(b.date, &b.user_id.0)));
        Ok(matching)
    }

    async fn purge_older_than(&self, cutoff: NaiveDate) -> Result<u64, RepositoryError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|(_, _, date), _| *date >= cutoff);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryWorkItemRepository {
    rows: RwLock<HashMap<WorkItemId, WorkItem>>,
}

#[async_trait::async_trait]
impl WorkItemRepository for InMemoryWorkItemRepository {
    async fn save(&self, item: WorkItem) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        rows.insert(item.id.clone(), item);
        Ok(())
    }

    async fn find_open_by_text(
        &self,
        user: &UserId,
        daily: &DailyName,
        text: &str,
    ) -> Result<Vec<WorkItem>, RepositoryError> {
        let rows = self.rows.read().await;
        let mut matching: Vec<WorkItem> = rows
            .values()
            .filter(|item| {
                &item.user_id == user
                    && &item.daily == daily
                    && item.text == text
                    && item.status.is_open()
            })
            .cloned()
            .collect();
        matching.sort_by_key(|item| item.created_date);
        Ok(matching)
    }

    async fn list_open_for_daily(
        &self,
        daily: &DailyName,
    ) -> Result<Vec<WorkItem>, RepositoryError> {
        let rows = self.rows.read().await;
        let mut matching: Vec<WorkItem> = rows
            .values()
            .filter(|item| &item.daily == daily && item.status.is_open())
            .cloned()
            .collect();
        matching.sort_by(|a, b| (a.created_date, &a.id.0).cmp(&(b.created_date, &b.id.0)));
        Ok(matching)
    }

    async fn list_for_daily_created_between(
        &self,
        daily: &DailyName,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WorkItem>, RepositoryError> {
        let rows = self.rows.read().await;
        let mut matching: Vec<WorkItem> = rows
            .values()
            .filter(|item| {
                &item.daily == daily && item.created_date >= from && item.created_date <= to
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| (a.created_date, &a.id.0).cmp(&(b.created_date, &b.id.0)));
        Ok(matching)
    }

    async fn snooze(&self, id: &WorkItemId, until: NaiveDate) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(id) {
            Some(item) => {
                item.snoozed_until = Some(until);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryOooRepository {
    rows: RwLock<Vec<OooRecord>>,
}

#[async_trait::async_trait]
impl OooRepository for InMemoryOooRepository {
    async fn save(&self, record: OooRecord) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        rows.retain(|row| row.id != record.id);
        rows.push(record);
        Ok(())
    }

    async fn clear(&self, user: &UserId, daily: &DailyName) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        rows.retain(|row| !(&row.user_id == user && &row.daily == daily));
        Ok(())
    }

    async fn active_for(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<Option<OooRecord>, RepositoryError> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|row| &row.user_id == user && &row.daily == daily && row.covers(date))
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryTimezoneRepository {
    rows: RwLock<HashMap<UserId, TimezoneOffset>>,
}

#[async_trait::async_trait]
impl TimezoneCacheRepository for InMemoryTimezoneRepository {
    async fn find(&self, user: &UserId) -> Result<Option<TimezoneOffset>, RepositoryError> {
        let rows = self.rows.read().await;
        Ok(rows.get(user).cloned())
    }

    async fn put(&self, entry: TimezoneOffset) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        rows.insert(entry.user_id.clone(), entry);
        Ok(())
    }
}
