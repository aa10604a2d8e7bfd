use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use huddle_core::config::{SchedulerConfig, StandupConfig};
use huddle_core::domain::participant::Participant;
use huddle_core::localtime::LocalTimestamp;
use huddle_core::scheduler::{evaluate, PromptCheck, PromptDecision, SkipReason};
use huddle_db::repositories::{OooRepository, ParticipantRepository, PromptRepository};
use huddle_slack::{messages, MessageGateway};

use super::{SweepError, SweepSummary, TimezoneResolver};

/// One pass prompts every participant whose local clock sits inside their
/// schedule's window and who has neither submitted nor been nudged within
/// the throttle.
pub struct ReminderSweep {
    participants: Arc<dyn ParticipantRepository>,
    prompts: Arc<dyn PromptRepository>,
    ooo: Arc<dyn OooRepository>,
    timezones: TimezoneResolver,
    gateway: Arc<dyn MessageGateway>,
    standup: StandupConfig,
    scheduler: SchedulerConfig,
    /// Manual-testing override: prompt even off-schedule or out of office.
    force: bool,
}

impl ReminderSweep {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        participants: Arc<dyn ParticipantRepository>,
        prompts: Arc<dyn PromptRepository>,
        ooo: Arc<dyn OooRepository>,
        timezones: TimezoneResolver,
        gateway: Arc<dyn MessageGateway>,
        standup: StandupConfig,
        scheduler: SchedulerConfig,
    ) -> Self {
        Self { participants, prompts, ooo, timezones, gateway, standup, scheduler, force: false }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let interval = Duration::from_secs(self.scheduler.sweep_interval_minutes * 60);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let summary = self.run_once(Utc::now()).await;
                info!(
                    event_name = "reminder_sweep_done",
                    prompted = summary.processed,
                    skipped = summary.skipped,
                    errors = summary.errors,
                    "reminder sweep finished"
                );
            }
        })
    }

    pub async fn run_once(&self, now: DateTime<Utc>) -> SweepSummary {
        let mut summary = SweepSummary::default();

        let participants = match self.participants.list_all().await {
            Ok(participants) => participants,
            Err(error) => {
                warn!(event_name = "reminder_sweep_list_failed", error = %error,
                    "could not list participants");
                summary.errors += 1;
                return summary;
            }
        };

        for participant in &participants {
            match self.process(participant, now).await {
                Ok(PromptDecision::Prompt { minutes_late }) => {
                    debug!(
                        event_name = "reminder_sent",
                        user = %participant.user_id.0,
                        daily = %participant.daily.0,
                        minutes_late,
                        "reminder sent"
                    );
                    summary.processed += 1;
                }
                Ok(PromptDecision::Skip(reason)) => {
                    debug!(
                        event_name = "reminder_skipped",
                        user = %participant.user_id.0,
                        daily = %participant.daily.0,
                        reason = ?reason,
                        "reminder skipped"
                    );
                    summary.skipped += 1;
                }
                Err(error) => {
                    warn!(
                        event_name = "reminder_failed",
                        user = %participant.user_id.0,
                        daily = %participant.daily.0,
                        error = %error,
                        "reminder pass failed for participant"
                    );
                    summary.errors += 1;
                }
            }
        }

        summary
    }

    async fn process(
        &self,
        participant: &Participant,
        now: DateTime<Utc>,
    ) -> Result<PromptDecision, SweepError> {
        let Some(daily) = self.standup.daily(&participant.daily.0) else {
            return Ok(PromptDecision::Skip(SkipReason::UnknownDaily));
        };
        let Some(schedule) = self.standup.schedule(&daily.schedule) else {
            return Ok(PromptDecision::Skip(SkipReason::UnknownSchedule));
        };

        let offset_seconds = match self.timezones.offset_seconds(&participant.user_id, now).await {
            Ok(offset) => offset,
            // Forced runs should still go out when the directory is down.
            Err(_) if self.force => 0,
            Err(error) => return Err(error),
        };

        let local = LocalTimestamp::new(now, offset_seconds);
        let date = local.date();

        let out_of_office = self
            .ooo
            .active_for(&participant.user_id, &participant.daily, date)
            .await?
            .is_some();

        let prompt =
            self.prompts.load_or_create(&participant.user_id, &participant.daily, date).await?;

        let schedule_minutes = participant
            .time_override
            .map(|time| time.minutes_of_day())
            .unwrap_or_else(|| schedule.time.minutes_of_day());

        let decision = evaluate(&PromptCheck {
            schedule,
            schedule_minutes,
            local,
            out_of_office,
            prompt: &prompt,
            now,
            window_minutes: self.scheduler.prompt_window_minutes,
            throttle_minutes: self.scheduler.reprompt_throttle_minutes,
            force: self.force,
        });

        if let PromptDecision::Prompt { minutes_late } = decision {
            let pick = (minutes_late / 30) as usize;
            let text = messages::reminder_text(minutes_late, pick);
            self.gateway.send_reminder(&participant.user_id, &text).await?;
            self.prompts
                .mark_prompted(&participant.user_id, &participant.daily, date, now)
                .await?;
        }

        Ok(decision)
    }
}
