use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use huddle_core::config::{SchedulerConfig, StandupConfig};
use huddle_core::domain::submission::Submission;
use huddle_core::localtime::LocalTimestamp;
use huddle_db::repositories::{OooRepository, SubmissionRepository};
use huddle_slack::{messages, MessageGateway};

use super::{SweepError, SweepSummary, TimezoneResolver};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PostOutcome {
    Posted,
    /// Not yet due, author out of office, or daily no longer configured.
    Held,
}

/// Drains unposted submissions into their daily's channel once the author's
/// local clock reaches the scheduled time. Submissions held back (author
/// OOO, stale daily) stay unposted until the retention purge ages them out.
pub struct PosterSweep {
    submissions: Arc<dyn SubmissionRepository>,
    ooo: Arc<dyn OooRepository>,
    timezones: TimezoneResolver,
    gateway: Arc<dyn MessageGateway>,
    standup: StandupConfig,
    scheduler: SchedulerConfig,
}

impl PosterSweep {
    pub fn new(
        submissions: Arc<dyn SubmissionRepository>,
        ooo: Arc<dyn OooRepository>,
        timezones: TimezoneResolver,
        gateway: Arc<dyn MessageGateway>,
        standup: StandupConfig,
        scheduler: SchedulerConfig,
    ) -> Self {
        Self { submissions, ooo, timezones, gateway, standup, scheduler }
    }

    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let interval = Duration::from_secs(self.scheduler.sweep_interval_minutes * 60);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let summary = self.run_once(Utc::now()).await;
                info!(
                    event_name = "poster_sweep_done",
                    posted = summary.processed,
                    held = summary.skipped,
                    errors = summary.errors,
                    "poster sweep finished"
                );
            }
        })
    }

    pub async fn run_once(&self, now: DateTime<Utc>) -> SweepSummary {
        let mut summary = SweepSummary::default();

        let pending = match self.submissions.list_unposted().await {
            Ok(pending) => pending,
            Err(error) => {
                warn!(event_name = "poster_sweep_list_failed", error = %error,
                    "could not list unposted submissions");
                summary.errors += 1;
                return summary;
            }
        };

        for submission in &pending {
            match self.process(submission, now).await {
                Ok(PostOutcome::Posted) => summary.processed += 1,
                Ok(PostOutcome::Held) => summary.skipped += 1,
                Err(error) => {
                    warn!(
                        event_name = "post_failed",
                        user = %submission.user_id.0,
                        daily = %submission.daily.0,
                        date = %submission.date,
                        error = %error,
                        "posting failed for submission"
                    );
                    summary.errors += 1;
                }
            }
        }

        summary
    }

    async fn process(
        &self,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<PostOutcome, SweepError> {
        let Some(daily) = self.standup.daily(&submission.daily.0) else {
            debug!(event_name = "post_held_stale_daily", daily = %submission.daily.0,
                "daily no longer configured");
            return Ok(PostOutcome::Held);
        };
        let Some(schedule) = self.standup.schedule(&daily.schedule) else {
            return Ok(PostOutcome::Held);
        };

        let offset_seconds = self.timezones.offset_seconds(&submission.user_id, now).await?;
        let local = LocalTimestamp::new(now, offset_seconds);

        let due = local.date() > submission.date
            || (local.date() == submission.date
                && local.minutes_of_day() >= schedule.time.minutes_of_day());
        if !due {
            return Ok(PostOutcome::Held);
        }

        let away = self
            .ooo
            .active_for(&submission.user_id, &submission.daily, submission.date)
            .await?
            .is_some();
        if away {
            debug!(event_name = "post_held_ooo", user = %submission.user_id.0,
                date = %submission.date, "author out of office, holding post");
            return Ok(PostOutcome::Held);
        }

        let text = messages::format_submission(submission);
        self.gateway.post_submission(&daily.channel, &text).await?;
        self.submissions
            .mark_posted(&submission.user_id, &submission.daily, submission.date)
            .await?;

        Ok(PostOutcome::Posted)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tokio::sync::Mutex;

    use huddle_core::config::{AppConfig, Daily, Schedule, StandupConfig};
    use huddle_core::domain::ooo::{OooId, OooRecord};
    use huddle_core::domain::participant::{DailyName, UserId};
    use huddle_core::domain::submission::Submission;
    use huddle_core::domain::timezone::TimezoneOffset;
    use huddle_core::localtime::{LocalTimeOfDay, WeekdayCode};
    use huddle_db::repositories::{
        InMemoryOooRepository, InMemorySubmissionRepository, InMemoryTimezoneRepository,
        OooRepository, SubmissionRepository, TimezoneCacheRepository,
    };
    use huddle_slack::{GatewayError, MessageGateway, NoopGateway};

    use super::super::TimezoneResolver;
    use super::PosterSweep;

    #[derive(Default)]
    struct RecordingGateway {
        posted: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl MessageGateway for RecordingGateway {
        async fn send_reminder(&self, _user: &UserId, _text: &str) -> Result<(), GatewayError> {
            Ok(())
        }

        async fn post_submission(&self, channel: &str, text: &str) -> Result<(), GatewayError> {
            self.posted.lock().await.push((channel.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn standup() -> StandupConfig {
        let mut standup = StandupConfig::default();
        standup.schedules.insert(
            "weekdays".to_string(),
            Schedule {
                days: vec![WeekdayCode::Mon, WeekdayCode::Tue, WeekdayCode::Wed],
                time: LocalTimeOfDay::parse("09:00").unwrap(),
            },
        );
        standup.dailies.insert(
            "platform".to_string(),
            Daily {
                channel: "C123".to_string(),
                schedule: "weekdays".to_string(),
                questions: Vec::new(),
            },
        );
        standup
    }

    struct Fixture {
        submissions: Arc<InMemorySubmissionRepository>,
        ooo: Arc<InMemoryOooRepository>,
        timezones: Arc<InMemoryTimezoneRepository>,
        gateway: Arc<RecordingGateway>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                submissions: Arc::new(InMemorySubmissionRepository::default()),
                ooo: Arc::new(InMemoryOooRepository::default()),
                timezones: Arc::new(InMemoryTimezoneRepository::default()),
                gateway: Arc::new(RecordingGateway::default()),
            }
        }

        fn sweep(&self) -> PosterSweep {
            let config = AppConfig::default();
            PosterSweep::new(
                self.submissions.clone(),
                self.ooo.clone(),
                TimezoneResolver::new(
                    self.timezones.clone(),
                    Arc::new(NoopGateway),
                    config.scheduler.timezone_ttl_hours,
                ),
                self.gateway.clone(),
                standup(),
                config.scheduler,
            )
        }

        async fn add_submission(&self, user: &str, day: u32, offset_seconds: i32) {
            self.submissions
                .upsert(Submission {
                    user_id: UserId(user.to_string()),
                    daily: DailyName("platform".to_string()),
                    date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
                    done_items: vec!["shipped".to_string()],
                    undone_items: Vec::new(),
                    unplanned_items: Vec::new(),
                    today_plans: vec!["next".to_string()],
                    blockers: String::new(),
                    answers: Vec::new(),
                    posted: false,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                })
                .await
                .unwrap();
            self.timezones
                .put(TimezoneOffset {
                    user_id: UserId(user.to_string()),
                    offset_seconds,
                    fetched_at: Utc.with_ymd_and_hms(2026, 3, 9, 0, 0, 0).unwrap(),
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn posts_once_the_local_scheduled_time_arrives() {
        let fixture = Fixture::new();
        // 2026-03-09 is a Monday. UTC+2: local 09:00 is 07:00 UTC.
        fixture.add_submission("U1", 9, 2 * 3600).await;
        let sweep = fixture.sweep();

        // Local 08:30, before the scheduled time.
        let summary = sweep.run_once(Utc.with_ymd_and_hms(2026, 3, 9, 6, 30, 0).unwrap()).await;
        assert_eq!((summary.processed, summary.skipped), (0, 1));
        assert!(fixture.gateway.posted.lock().await.is_empty());

        // Local 09:05.
        let summary = sweep.run_once(Utc.with_ymd_and_hms(2026, 3, 9, 7, 5, 0).unwrap()).await;
        assert_eq!(summary.processed, 1);

        let posted = fixture.gateway.posted.lock().await.clone();
        assert_eq!(posted[0].0, "C123");
        assert!(posted[0].1.contains("shipped"));

        // The flag flips, so the next pass has nothing to do.
        let summary = sweep.run_once(Utc.with_ymd_and_hms(2026, 3, 9, 7, 35, 0).unwrap()).await;
        assert_eq!((summary.processed, summary.skipped), (0, 0));
    }

    #[tokio::test]
    async fn day_old_submissions_are_posted_immediately() {
        let fixture = Fixture::new();
        fixture.add_submission("U1", 9, 0).await;
        let sweep = fixture.sweep();

        let summary = sweep.run_once(Utc.with_ymd_and_hms(2026, 3, 10, 5, 0, 0).unwrap()).await;
        assert_eq!(summary.processed, 1);
    }

    #[tokio::test]
    async fn ooo_covered_submissions_are_held() {
        let fixture = Fixture::new();
        fixture.add_submission("U1", 9, 0).await;
        fixture
            .ooo
            .save(OooRecord {
                id: OooId::generate(),
                user_id: UserId("U1".to_string()),
                daily: DailyName("platform".to_string()),
                start_date: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            })
            .await
            .unwrap();
        let sweep = fixture.sweep();

        let summary = sweep.run_once(Utc.with_ymd_and_hms(2026, 3, 9, 10, 0, 0).unwrap()).await;
        assert_eq!((summary.processed, summary.skipped), (0, 1));
        assert!(fixture.gateway.posted.lock().await.is_empty());
    }
}
