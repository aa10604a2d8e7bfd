//! Submission recording: resolving dispositions over the pre-filled carry
//! chain, persisting the day's update, and keeping the work-item rows in
//! step.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::warn;

use huddle_core::carry::{build_carry_chain, resolve, CarryResolution, Disposition};
use huddle_core::domain::participant::{DailyName, UserId};
use huddle_core::domain::submission::Submission;
use huddle_core::domain::work_item::WorkItem;
use huddle_db::repositories::{
    PromptRepository, RepositoryError, SubmissionRepository, WorkItemRepository,
};

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One day's answers from one participant, before carry resolution.
#[derive(Clone, Debug, Default)]
pub struct SubmissionInput {
    /// Disposition per pre-filled item text; unstated items continue.
    pub dispositions: HashMap<String, Disposition>,
    pub new_plans: Vec<String>,
    pub unplanned_items: Vec<String>,
    pub blockers: String,
    pub answers: Vec<String>,
}

pub struct SubmissionService {
    submissions: Arc<dyn SubmissionRepository>,
    prompts: Arc<dyn PromptRepository>,
    work_items: Arc<dyn WorkItemRepository>,
}

impl SubmissionService {
    pub fn new(
        submissions: Arc<dyn SubmissionRepository>,
        prompts: Arc<dyn PromptRepository>,
        work_items: Arc<dyn WorkItemRepository>,
    ) -> Self {
        Self { submissions, prompts, work_items }
    }

    /// Pre-fill for the form: the previous submission's plan list.
    pub async fn prefill(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<Vec<String>, SubmissionError> {
        let previous = self.submissions.find_latest_before(user, daily, date).await?;
        Ok(previous.as_ref().map(build_carry_chain).unwrap_or_default())
    }

    /// Record (or re-record) a day's update. The submission save and the
    /// prompt flag are the transaction that matters; work-item bookkeeping
    /// is best-effort and never fails the call.
    pub async fn record(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
        input: SubmissionInput,
        now: DateTime<Utc>,
    ) -> Result<Submission, SubmissionError> {
        let prefilled = self.prefill(user, daily, date).await?;
        let resolution = resolve(&prefilled, &input.dispositions, &input.new_plans);

        let existing = self.submissions.find(user, daily, date).await?;
        let created_at = existing.as_ref().map(|previous| previous.created_at).unwrap_or(now);

        let mut undone_items = resolution.continued.clone();
        undone_items.extend(resolution.dropped.iter().cloned());

        let submission = Submission {
            user_id: user.clone(),
            daily: daily.clone(),
            date,
            done_items: resolution.done.clone(),
            undone_items,
            unplanned_items: input.unplanned_items,
            today_plans: resolution.today_plans(),
            blockers: input.blockers,
            answers: input.answers,
            posted: false,
            created_at,
            updated_at: now,
        };

        self.submissions.upsert(submission.clone()).await?;
        self.prompts.mark_submitted(user, daily, date).await?;

        if let Err(error) =
            self.apply_work_items(user, daily, date, &resolution, existing.as_ref()).await
        {
            warn!(
                event_name = "work_item_bookkeeping_failed",
                user = %user.0,
                daily = %daily.0,
                date = %date,
                error = %error,
                "work item bookkeeping failed, submission saved anyway"
            );
        }

        Ok(submission)
    }

    async fn apply_work_items(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
        resolution: &CarryResolution,
        existing: Option<&Submission>,
    ) -> Result<(), RepositoryError> {
        // Items the stored submission for this date already continued. A
        // re-recording must not carry them a second time; one carry per item
        // per day keeps `carry_count` equal to the days the item survived.
        let already_carried: HashSet<&str> = existing
            .map(|previous| {
                previous
                    .undone_items
                    .iter()
                    .filter(|text| previous.today_plans.contains(text))
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default();

        for text in &resolution.done {
            if let Some(mut item) = self.first_open(user, daily, text).await? {
                if item.complete(date).is_ok() {
                    self.work_items.save(item).await?;
                }
            }
        }

        for text in &resolution.dropped {
            if let Some(mut item) = self.first_open(user, daily, text).await? {
                if item.drop_item().is_ok() {
                    self.work_items.save(item).await?;
                }
            }
        }

        for text in &resolution.continued {
            if already_carried.contains(text.as_str()) {
                continue;
            }
            if let Some(mut item) = self.first_open(user, daily, text).await? {
                if item.carry().is_ok() {
                    self.work_items.save(item).await?;
                }
            }
        }

        for text in &resolution.new_plans {
            // A matching open row means the text re-entered the chain by
            // hand; do not double-track it.
            if self.first_open(user, daily, text).await?.is_none() {
                let item =
                    WorkItem::new_plan(user.clone(), daily.clone(), text.clone(), date);
                self.work_items.save(item).await?;
            }
        }

        Ok(())
    }

    async fn first_open(
        &self,
        user: &UserId,
        daily: &DailyName,
        text: &str,
    ) -> Result<Option<WorkItem>, RepositoryError> {
        let mut matching = self.work_items.find_open_by_text(user, daily, text).await?;
        Ok(if matching.is_empty() { None } else { Some(matching.remove(0)) })
    }
}
