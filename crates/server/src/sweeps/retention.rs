use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, Utc};
use tracing::{info, warn};

use huddle_db::repositories::{PromptRepository, SubmissionRepository};

use super::SweepSummary;

const PURGE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Daily purge of prompt and submission rows older than the retention
/// window. The analytics periods all fit inside it, so nothing a report
/// needs is ever deleted.
pub struct RetentionSweep {
    prompts: Arc<dyn PromptRepository>,
    submissions: Arc<dyn SubmissionRepository>,
    retention_days: i64,
}

impl RetentionSweep {
    pub fn new(
        prompts: Arc<dyn PromptRepository>,
        submissions: Arc<dyn SubmissionRepository>,
        retention_days: i64,
    ) -> Self {
        Self { prompts, submissions, retention_days }
    }

    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(PURGE_INTERVAL);
            loop {
                ticker.tick().await;
                let summary = self.run_once(Utc::now()).await;
                info!(
                    event_name = "retention_sweep_done",
                    purged = summary.processed,
                    errors = summary.errors,
                    "retention purge finished"
                );
            }
        })
    }

    pub async fn run_once(&self, now: DateTime<Utc>) -> SweepSummary {
        let mut summary = SweepSummary::default();
        let retention = u64::try_from(self.retention_days).unwrap_or(0);
        let cutoff = now.date_naive().checked_sub_days(Days::new(retention));
        let Some(cutoff) = cutoff else {
            return summary;
        };

        match self.prompts.purge_older_than(cutoff).await {
            Ok(purged) => summary.processed += purged,
            Err(error) => {
                warn!(event_name = "retention_prompts_failed", error = %error,
                    "prompt purge failed");
                summary.errors += 1;
            }
        }

        match self.submissions.purge_older_than(cutoff).await {
            Ok(purged) => summary.processed += purged,
            Err(error) => {
                warn!(event_name = "retention_submissions_failed", error = %error,
                    "submission purge failed");
                summary.errors += 1;
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, TimeZone, Utc};

    use huddle_core::domain::participant::{DailyName, UserId};
    use huddle_db::repositories::{
        InMemoryPromptRepository, InMemorySubmissionRepository, PromptRepository,
    };

    use super::RetentionSweep;

    #[tokio::test]
    async fn purges_rows_older_than_the_window_and_keeps_the_rest() {
        let prompts = Arc::new(InMemoryPromptRepository::default());
        let submissions = Arc::new(InMemorySubmissionRepository::default());
        let user = UserId("U1".to_string());
        let daily = DailyName("platform".to_string());

        // now is 2026-03-29; the 28-day cutoff lands on 2026-03-01.
        let now = Utc.with_ymd_and_hms(2026, 3, 29, 3, 0, 0).unwrap();
        let old = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        let boundary = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let recent = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();

        for date in [old, boundary, recent] {
            prompts.load_or_create(&user, &daily, date).await.unwrap();
        }

        let sweep = RetentionSweep::new(prompts.clone(), submissions, 28);
        let summary = sweep.run_once(now).await;

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.errors, 0);

        // Rows on or after the cutoff survive, so a second pass is a no-op.
        let summary = sweep.run_once(now).await;
        assert_eq!(summary.processed, 0);
    }
}
