//! Period statistics and period-over-period trend classification.

use serde::Serialize;

use crate::domain::submission::Submission;
use crate::domain::work_item::{WorkItem, WorkItemStatus};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PeriodStats {
    pub submissions: u32,
    pub items_done: u32,
    pub items_dropped: u32,
    /// submissions / (workdays x participants), integer percent.
    pub participation_pct: u32,
    /// done / (done + dropped), 100 when no items exist.
    pub completion_pct: u32,
    /// submissions carrying blocker text / submissions.
    pub blocker_pct: u32,
}

pub fn period_stats(
    submissions: &[Submission],
    items: &[WorkItem],
    workdays: u32,
    participant_count: u32,
) -> PeriodStats {
    let submitted = submissions.len() as u32;
    let with_blockers = submissions.iter().filter(|s| s.has_blockers()).count() as u32;
    let done = items.iter().filter(|i| i.status == WorkItemStatus::Done).count() as u32;
    let dropped = items.iter().filter(|i| i.status == WorkItemStatus::Dropped).count() as u32;

    PeriodStats {
        submissions: submitted,
        items_done: done,
        items_dropped: dropped,
        participation_pct: percent(submitted, workdays * participant_count),
        completion_pct: if done + dropped == 0 {
            // No work recorded means nothing was left undone.
            100
        } else {
            percent(done, done + dropped)
        },
        blocker_pct: percent(with_blockers, submitted),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improved,
    Stable,
    Declined,
}

/// A move below 5% of the previous value reads as noise. Direction is
/// interpreted per metric: a falling blocker rate is an improvement.
pub fn trend(current: f64, previous: f64, higher_is_better: bool) -> TrendDirection {
    let delta = current - previous;
    if delta == 0.0 || delta.abs() < 0.05 * previous {
        return TrendDirection::Stable;
    }
    if (delta > 0.0) == higher_is_better {
        TrendDirection::Improved
    } else {
        TrendDirection::Declined
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PeriodComparison {
    pub participation: TrendDirection,
    pub completion: TrendDirection,
    pub blockers: TrendDirection,
}

/// Compare against the equal-length period immediately preceding.
pub fn compare(current: &PeriodStats, previous: &PeriodStats) -> PeriodComparison {
    PeriodComparison {
        participation: trend(
            current.participation_pct as f64,
            previous.participation_pct as f64,
            true,
        ),
        completion: trend(current.completion_pct as f64, previous.completion_pct as f64, true),
        blockers: trend(current.blocker_pct as f64, previous.blocker_pct as f64, false),
    }
}

pub(crate) fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use crate::domain::participant::{DailyName, UserId};
    use crate::domain::submission::Submission;
    use crate::domain::work_item::{WorkItem, WorkItemId, WorkItemStatus};

    use super::{compare, period_stats, trend, PeriodStats, TrendDirection};

    fn submission(user: &str, day: u32, blockers: &str) -> Submission {
        Submission {
            user_id: UserId(user.to_string()),
            daily: DailyName("platform".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            done_items: Vec::new(),
            undone_items: Vec::new(),
            unplanned_items: Vec::new(),
            today_plans: Vec::new(),
            blockers: blockers.to_string(),
            answers: Vec::new(),
            posted: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn item(status: WorkItemStatus) -> WorkItem {
        WorkItem {
            id: WorkItemId("w".to_string()),
            user_id: UserId("U1".to_string()),
            daily: DailyName("platform".to_string()),
            text: "t".to_string(),
            status,
            carry_count: 0,
            created_date: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            completed_date: None,
            snoozed_until: None,
        }
    }

    #[test]
    fn rates_follow_their_definitions() {
        let submissions = vec![
            submission("U1", 9, ""),
            submission("U1", 10, "waiting on review"),
            submission("U2", 9, ""),
        ];
        let items = vec![
            item(WorkItemStatus::Done),
            item(WorkItemStatus::Done),
            item(WorkItemStatus::Dropped),
            item(WorkItemStatus::Carried),
        ];

        let stats = period_stats(&submissions, &items, 5, 2);
        assert_eq!(stats.participation_pct, 30);
        assert_eq!(stats.completion_pct, 67);
        assert_eq!(stats.blocker_pct, 33);
        assert_eq!(stats.items_done, 2);
        assert_eq!(stats.items_dropped, 1);
    }

    #[test]
    fn completion_is_exactly_100_with_no_items() {
        let stats = period_stats(&[], &[item(WorkItemStatus::Carried)], 5, 1);
        assert_eq!(stats.completion_pct, 100);
    }

    #[test]
    fn zero_denominator_participation_is_zero() {
        let stats = period_stats(&[], &[], 0, 0);
        assert_eq!(stats.participation_pct, 0);
    }

    #[test]
    fn small_moves_are_stable() {
        assert_eq!(trend(82.0, 80.0, true), TrendDirection::Stable);
        assert_eq!(trend(78.5, 80.0, true), TrendDirection::Stable);
        assert_eq!(trend(0.0, 0.0, true), TrendDirection::Stable);
    }

    #[test]
    fn direction_tracks_higher_is_better() {
        assert_eq!(trend(90.0, 80.0, true), TrendDirection::Improved);
        assert_eq!(trend(70.0, 80.0, true), TrendDirection::Declined);
    }

    #[test]
    fn falling_blocker_rate_reports_improved() {
        // 18% -> 12% blocker rate is an improvement.
        assert_eq!(trend(12.0, 18.0, false), TrendDirection::Improved);
        assert_eq!(trend(18.0, 12.0, false), TrendDirection::Declined);
    }

    #[test]
    fn comparison_applies_the_blocker_inversion() {
        let previous = PeriodStats {
            participation_pct: 80,
            completion_pct: 70,
            blocker_pct: 18,
            ..PeriodStats::default()
        };
        let current = PeriodStats {
            participation_pct: 90,
            completion_pct: 70,
            blocker_pct: 12,
            ..PeriodStats::default()
        };

        let comparison = compare(&current, &previous);
        assert_eq!(comparison.participation, TrendDirection::Improved);
        assert_eq!(comparison.completion, TrendDirection::Stable);
        assert_eq!(comparison.blockers, TrendDirection::Improved);
    }
}
