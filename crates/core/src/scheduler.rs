//! Per-participant prompt decision.
//!
//! The sweep driver resolves everything with side effects (config lookups,
//! timezone cache, the prompt row) and hands the result to [`evaluate`],
//! which applies the decision sequence in order: workday, out-of-office,
//! prompt window, already-submitted, reprompt throttle. Each check
//! short-circuits to a skip; only when all pass does the participant get a
//! reminder, with lateness measured against the scheduled time.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Schedule;
use crate::domain::prompt::Prompt;
use crate::localtime::LocalTimestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Participant references a daily no longer in configuration.
    UnknownDaily,
    /// Participant references a schedule no longer in configuration.
    UnknownSchedule,
    NotWorkday,
    OutOfOffice,
    OutsideWindow,
    AlreadySubmitted,
    Throttled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptDecision {
    Prompt { minutes_late: u32 },
    Skip(SkipReason),
}

/// Everything [`evaluate`] needs, resolved up front by the sweep.
#[derive(Clone, Debug)]
pub struct PromptCheck<'a> {
    pub schedule: &'a Schedule,
    /// Scheduled prompt time in local minutes-of-day, with any per-user
    /// override already applied.
    pub schedule_minutes: u32,
    pub local: LocalTimestamp,
    pub out_of_office: bool,
    pub prompt: &'a Prompt,
    pub now: DateTime<Utc>,
    pub window_minutes: u32,
    pub throttle_minutes: i64,
    /// Manual-testing override: skips the workday and out-of-office checks.
    pub force: bool,
}

pub fn evaluate(check: &PromptCheck<'_>) -> PromptDecision {
    if !check.force {
        if !check.schedule.is_workday(check.local.weekday()) {
            return PromptDecision::Skip(SkipReason::NotWorkday);
        }
        if check.out_of_office {
            return PromptDecision::Skip(SkipReason::OutOfOffice);
        }
    }

    let local_minutes = check.local.minutes_of_day();
    if !is_within_prompt_window(check.schedule_minutes, local_minutes, check.window_minutes) {
        return PromptDecision::Skip(SkipReason::OutsideWindow);
    }

    if check.prompt.submitted {
        return PromptDecision::Skip(SkipReason::AlreadySubmitted);
    }

    if check.prompt.throttled(check.now, check.throttle_minutes) {
        return PromptDecision::Skip(SkipReason::Throttled);
    }

    PromptDecision::Prompt { minutes_late: minutes_late(check.schedule_minutes, local_minutes) }
}

/// Window is `[scheduled, scheduled + window]`, inclusive at both ends, and
/// clamped to the scheduled day: minutes past local midnight belong to the
/// next date, so a window that would run over midnight ends at 23:59.
pub fn is_within_prompt_window(schedule_minutes: u32, local_minutes: u32, window_minutes: u32) -> bool {
    local_minutes >= schedule_minutes && local_minutes <= schedule_minutes + window_minutes
}

/// Minutes past the scheduled time, floored at zero.
pub fn minutes_late(schedule_minutes: u32, local_minutes: u32) -> u32 {
    local_minutes.saturating_sub(schedule_minutes)
}
