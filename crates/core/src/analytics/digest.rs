//! Digest report assembly: the full analytics bundle for one daily over one
//! reporting period, computed from pre-fetched rows.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analytics::bottleneck::{bottlenecks, drop_stats, DropStat};
use crate::analytics::ranking::{rank, RankedUser, UserPeriodStats};
use crate::analytics::trend::{compare, period_stats, PeriodComparison, PeriodStats};
use crate::domain::submission::Submission;
use crate::domain::work_item::WorkItem;

/// Raw rows for one period, fetched by the caller.
#[derive(Clone, Debug, Default)]
pub struct PeriodRows {
    pub submissions: Vec<Submission>,
    pub items: Vec<WorkItem>,
}

#[derive(Clone, Debug)]
pub struct DigestInputs {
    pub current: PeriodRows,
    /// Equal-length period immediately preceding the current one.
    pub previous: PeriodRows,
    pub open_items: Vec<WorkItem>,
    pub workdays: u32,
    pub participant_count: u32,
    pub today: NaiveDate,
    pub bottleneck_threshold: u32,
    pub bottleneck_cap: usize,
    pub drop_threshold_pct: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct DigestReport {
    pub stats: PeriodStats,
    pub previous_stats: PeriodStats,
    pub trends: PeriodComparison,
    pub ranking: Vec<RankedUser>,
    pub bottlenecks: Vec<WorkItem>,
    pub drop_stats: Vec<DropStat>,
}

pub fn build_report(inputs: DigestInputs) -> DigestReport {
    let stats = period_stats(
        &inputs.current.submissions,
        &inputs.current.items,
        inputs.workdays,
        inputs.participant_count,
    );
    let previous_stats = period_stats(
        &inputs.previous.submissions,
        &inputs.previous.items,
        inputs.workdays,
        inputs.participant_count,
    );

    // Rank everyone who shows up in either submissions or items, in
    // first-seen order so score ties stay deterministic.
    let mut users = Vec::new();
    let mut seen = BTreeSet::new();
    for user in inputs
        .current
        .submissions
        .iter()
        .map(|s| &s.user_id)
        .chain(inputs.current.items.iter().map(|i| &i.user_id))
    {
        if seen.insert(user.0.clone()) {
            users.push(UserPeriodStats::collect(
                user.clone(),
                &inputs.current.submissions,
                &inputs.current.items,
                inputs.workdays,
            ));
        }
    }

    DigestReport {
        trends: compare(&stats, &previous_stats),
        ranking: rank(users),
        bottlenecks: bottlenecks(
            inputs.open_items,
            inputs.bottleneck_threshold,
            inputs.today,
            inputs.bottleneck_cap,
        ),
        drop_stats: drop_stats(&inputs.current.items, inputs.drop_threshold_pct),
        stats,
        previous_stats,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use crate::analytics::trend::TrendDirection;
    use crate::domain::participant::{DailyName, UserId};
    use crate::domain::submission::Submission;
    use crate::domain::work_item::{WorkItem, WorkItemId, WorkItemStatus};

    use super::{build_report, DigestInputs, PeriodRows};

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
            text: format!("task for {user}"),
            status,
            carry_count: carry,
            created_date: NaiveDate::from_ymd_opt(2026, 3, 9).unwrap(),
            completed_date: None,
            snoozed_until: None,
        }
    }

    #[test]
    fn report_bundles_stats_trends_ranking_and_bottlenecks() {
        let inputs = DigestInputs {
            current: PeriodRows {
                submissions: vec![
                    submission("U1", 16, ""),
                    submission("U1", 17, ""),
                    submission("U2", 16, "blocked on access"),
                ],
                items: vec![
                    item("U1", WorkItemStatus::Done, 0),
                    item("U2", WorkItemStatus::Dropped, 0),
                ],
            },
            previous: PeriodRows {
                submissions: vec![submission("U1", 9, "stuck"), submission("U2", 9, "stuck")],
                items: vec![item("U1", WorkItemStatus::Dropped, 0)],
            },
            open_items: vec![item("U2", WorkItemStatus::Carried, 4)],
            workdays: 5,
            participant_count: 2,
            today: NaiveDate::from_ymd_opt(2026, 3, 20).unwrap(),
            bottleneck_threshold: 3,
            bottleneck_cap: 5,
            drop_threshold_pct: 30,
        };

        let report = build_report(inputs);

        assert_eq!(report.stats.submissions, 3);
        assert_eq!(report.stats.participation_pct, 30);
        // Blocker rate fell from 100% to 33%: improvement.
        assert_eq!(report.trends.blockers, TrendDirection::Improved);
        // Completion rose from 0% to 50%.
        assert_eq!(report.trends.completion, TrendDirection::Improved);

        // U1 outscores U2 (a done item vs a dropped one plus a blocker day).
        assert_eq!(report.ranking.len(), 2);
        assert_eq!(report.ranking[0].stats.user_id, UserId("U1".to_string()));
        assert_eq!(report.ranking[0].rank, 1);

        assert_eq!(report.bottlenecks.len(), 1);
        assert_eq!(report.bottlenecks[0].carry_count, 4);

        // U2 dropped their only item: 100% drop rate surfaces.
        assert_eq!(report.drop_stats.len(), 1);
        assert_eq!(report.drop_stats[0].user_id, UserId("U2".to_string()));
    }
}
