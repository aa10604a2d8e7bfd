//! Composite performance score and team ranking for digest periods.

use serde::Serialize;

use crate::analytics::trend::percent;
use crate::domain::participant::UserId;
use crate::domain::submission::Submission;
use crate::domain::work_item::{WorkItem, WorkItemStatus};

/// Per-user inputs to the ranking score, aggregated over one digest period.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserPeriodStats {
    pub user_id: UserId,
    pub participation_pct: f64,
    /// done / (done + dropped + carried), 100 when the user has no items.
    pub completion_pct: f64,
    pub items_done: u32,
    pub avg_carry_days: f64,
    pub drop_rate_pct: f64,
    pub blocker_days: u32,
}

impl UserPeriodStats {
    /// Aggregate one user's submissions and work items for a period.
    pub fn collect(
        user_id: UserId,
        submissions: &[Submission],
        items: &[WorkItem],
        workdays: u32,
    ) -> Self {
        let mine_subs: Vec<_> =
            submissions.iter().filter(|s| s.user_id == user_id).collect();
        let mine_items: Vec<_> = items.iter().filter(|i| i.user_id == user_id).collect();

        let done = mine_items.iter().filter(|i| i.status == WorkItemStatus::Done).count() as u32;
        let dropped =
            mine_items.iter().filter(|i| i.status == WorkItemStatus::Dropped).count() as u32;
        let carried =
            mine_items.iter().filter(|i| i.status == WorkItemStatus::Carried).count() as u32;
        let judged = done + dropped + carried;
        let total = mine_items.len() as u32;

        let avg_carry_days = if mine_items.is_empty() {
            0.0
        } else {
            mine_items.iter().map(|i| i.carry_count as f64).sum::<f64>() / mine_items.len() as f64
        };

        Self {
            user_id,
            participation_pct: percent(mine_subs.len() as u32, workdays) as f64,
            completion_pct: if judged == 0 { 100.0 } else { percent(done, judged) as f64 },
            items_done: done,
            avg_carry_days,
            drop_rate_pct: percent(dropped, total) as f64,
            blocker_days: mine_subs.iter().filter(|s| s.has_blockers()).count() as u32,
        }
    }

    /// Weighted composite, rounded to one decimal. Carrying and chronic
    /// dropping penalize; throughput and showing up reward.
    pub fn score(&self) -> f64 {
        let drop_penalty = if self.drop_rate_pct > 30.0 { 10.0 } else { 0.0 };
        let raw = 0.30 * self.participation_pct
            + 0.25 * self.completion_pct
            + 0.5 * self.items_done as f64
            - 5.0 * self.avg_carry_days
            - drop_penalty
            - 2.0 * self.blocker_days as f64;
        (raw * 10.0).round() / 10.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedUser {
    pub rank: u32,
    pub score: f64,
    pub stats: UserPeriodStats,
}

/// Descending by score; ties keep original row order (stable sort).
pub fn rank(users: Vec<UserPeriodStats>) -> Vec<RankedUser> {
    let mut scored: Vec<(f64, UserPeriodStats)> =
        users.into_iter().map(|stats| (stats.score(), stats)).collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .enumerate()
        .map(|(index, (score, stats))| RankedUser { rank: index as u32 + 1, score, stats })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use crate::domain::participant::{DailyName, UserId};
    use crate::domain::submission::Submission;
    use crate::domain::work_item::{WorkItem, WorkItemId, WorkItemStatus};

    use super::{rank, UserPeriodStats};

    fn stats(user: &str) -> UserPeriodStats {
        UserPeriodStats {
            user_id: UserId(user.to_string()),
            participation_pct: 100.0,
            completion_pct: 85.0,
            items_done: 12,
            avg_carry_days: 0.5,
            drop_rate_pct: 5.0,
            blocker_days: 0,
        }
    }

    #[test]
    fn score_matches_the_worked_example() {
        // 0.30*100 + 0.25*85 + 0.5*12 - 5*0.5 = 54.75, rounded to 54.8.
        assert_eq!(stats("U1").score(), 54.8);
    }

    #[test]
    fn heavy_dropping_costs_a_flat_penalty() {
        let mut heavy = stats("U1");
        heavy.drop_rate_pct = 31.0;
        assert_eq!(heavy.score(), 44.8);
    }

    #[test]
    fn blocker_days_subtract_two_points_each() {
        let mut blocked = stats("U1");
        blocked.blocker_days = 3;
        assert_eq!(blocked.score(), 48.8);
    }

    #[test]
    fn ranking_sorts_descending_with_stable_ties() {
        let mut low = stats("U-low");
        low.items_done = 2;
        let tied_first = stats("U-first");
        let tied_second = stats("U-second");

        let ranked = rank(vec![low, tied_first, tied_second]);
        assert_eq!(ranked[0].stats.user_id, UserId("U-first".to_string()));
        assert_eq!(ranked[1].stats.user_id, UserId("U-second".to_string()));
        assert_eq!(ranked[2].stats.user_id, UserId("U-low".to_string()));
        assert_eq!(ranked.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

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

    fn item(user: &str, status: WorkItemStatus, carry: u32) -> WorkItem {
        WorkItem {
            id: WorkItemId::generate(),
            user_id: UserId(user.to_string()),
            daily: DailyName("platform".to_string()),
            text: "t".to_string(),
            status,
            carry_count: carry,
            created_date: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            completed_date: None,
            snoozed_until: None,
        }
    }

    #[test]
    fn collect_aggregates_one_users_rows() {
        let submissions = vec![
            submission("U1", 9, ""),
            submission("U1", 10, "stuck on infra"),
            submission("U2", 9, ""),
        ];
        let items = vec![
            item("U1", WorkItemStatus::Done, 0),
            item("U1", WorkItemStatus::Done, 1),
            item("U1", WorkItemStatus::Carried, 3),
            item("U1", WorkItemStatus::Dropped, 0),
            item("U2", WorkItemStatus::Done, 0),
        ];

        let stats =
            UserPeriodStats::collect(UserId("U1".to_string()), &submissions, &items, 5);
        assert_eq!(stats.participation_pct, 40.0);
        assert_eq!(stats.completion_pct, 50.0);
        assert_eq!(stats.items_done, 2);
        assert_eq!(stats.avg_carry_days, 1.0);
        assert_eq!(stats.drop_rate_pct, 25.0);
        assert_eq!(stats.blocker_days, 1);
    }

    #[test]
    fn collect_with_no_items_scores_full_completion() {
        let stats = UserPeriodStats::collect(UserId("U9".to_string()), &[], &[], 5);
        assert_eq!(stats.completion_pct, 100.0);
        assert_eq!(stats.participation_pct, 0.0);
    }
}
