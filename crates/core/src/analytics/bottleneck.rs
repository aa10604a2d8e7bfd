//! Bottleneck detection and drop-rate analysis over work items.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::participant::UserId;
use crate::domain::work_item::WorkItem;

/// Items that have carried at or past `threshold` days, still open, not
/// currently snoozed. Ordered worst-first (carry count desc, then oldest),
/// capped for digest brevity.
pub fn bottlenecks(
    mut items: Vec<WorkItem>,
    threshold: u32,
    today: NaiveDate,
    cap: usize,
) -> Vec<WorkItem> {
    items.retain(|item| {
        item.status.is_open() && item.carry_count >= threshold && !item.snoozed_on(today)
    });
    items.sort_by(|a, b| {
        b.carry_count.cmp(&a.carry_count).then(a.created_date.cmp(&b.created_date))
    });
    items.truncate(cap);
    items
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DropStat {
    pub user_id: UserId,
    pub dropped: u32,
    pub total: u32,
    pub drop_pct: u32,
}

/// Per-user ratio of dropped items to items created, surfaced only above
/// `threshold_pct` so ordinary attrition stays out of digests.
pub fn drop_stats(items: &[WorkItem], threshold_pct: u32) -> Vec<DropStat> {
    let mut per_user: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    for item in items {
        let entry = per_user.entry(item.user_id.0.clone()).or_default();
        entry.1 += 1;
        if item.status == crate::domain::work_item::WorkItemStatus::Dropped {
            entry.0 += 1;
        }
    }

    let mut stats: Vec<DropStat> = per_user
        .into_iter()
        .filter(|(_, (_, total))| *total > 0)
        .map(|(user, (dropped, total))| DropStat {
            user_id: UserId(user),
            dropped,
            total,
            drop_pct: percent(dropped, total),
        })
        .filter(|stat| stat.drop_pct > threshold_pct)
        .collect();

    stats.sort_by(|a, b| b.drop_pct.cmp(&a.drop_pct));
    stats
}

fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::domain::participant::{DailyName, UserId};
    use crate::domain::work_item::{WorkItem, WorkItemStatus};

    use super::{bottlenecks, drop_stats};

    fn item(user: &str, text: &str, status: WorkItemStatus, carry: u32, day: u32) -> WorkItem {
        WorkItem {
            id: crate::domain::work_item::WorkItemId(format!("{user}-{text}")),
            user_id: UserId(user.to_string()),
            daily: DailyName("platform".to_string()),
            text: text.to_string(),
            status,
            carry_count: carry,
            created_date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            completed_date: None,
            snoozed_until: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 20).unwrap()
    }

    #[test]
    fn orders_by_carry_count_then_age_and_caps() {
        let items = vec![
            item("U1", "a", WorkItemStatus::Carried, 3, 10),
            item("U1", "b", WorkItemStatus::Carried, 5, 12),
            item("U2", "c", WorkItemStatus::Pending, 3, 8),
            item("U2", "d", WorkItemStatus::Carried, 4, 9),
        ];

        let top = bottlenecks(items, 3, today(), 3);
        let texts: Vec<_> = top.iter().map(|item| item.text.as_str()).collect();
        // Highest carry first; equal carries resolve oldest-first.
        assert_eq!(texts, vec!["b", "d", "c"]);
    }

    #[test]
    fn excludes_resolved_and_below_threshold_items() {
        let items = vec![
            item("U1", "done", WorkItemStatus::Done, 9, 10),
            item("U1", "dropped", WorkItemStatus::Dropped, 9, 10),
            item("U1", "young", WorkItemStatus::Carried, 2, 10),
        ];

        assert!(bottlenecks(items, 3, today(), 5).is_empty());
    }

    #[test]
    fn snoozed_items_hide_until_the_snooze_passes() {
        let mut snoozed = item("U1", "stuck", WorkItemStatus::Carried, 6, 10);
        snoozed.snoozed_until = Some(NaiveDate::from_ymd_opt(2026, 3, 25).unwrap());

        assert!(bottlenecks(vec![snoozed.clone()], 3, today(), 5).is_empty());

        // Once today reaches the snooze date, the item reappears unchanged.
        let after = NaiveDate::from_ymd_opt(2026, 3, 25).unwrap();
        let reappeared = bottlenecks(vec![snoozed.clone()], 3, after, 5);
        assert_eq!(reappeared, vec![snoozed]);
    }

    #[test]
    fn drop_stats_surface_only_heavy_droppers() {
        let items = vec![
            item("U1", "a", WorkItemStatus::Dropped, 0, 10),
            item("U1", "b", WorkItemStatus::Dropped, 0, 11),
            item("U1", "c", WorkItemStatus::Done, 0, 12),
            item("U2", "d", WorkItemStatus::Dropped, 0, 10),
            item("U2", "e", WorkItemStatus::Done, 0, 11),
            item("U2", "f", WorkItemStatus::Done, 0, 12),
            item("U2", "g", WorkItemStatus::Done, 0, 13),
            item("U2", "h", WorkItemStatus::Carried, 1, 14),
        ];

        let stats = drop_stats(&items, 30);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].user_id, UserId("U1".to_string()));
        assert_eq!(stats[0].drop_pct, 67);
        assert_eq!(stats[0].dropped, 2);
        assert_eq!(stats[0].total, 3);
    }

    #[test]
    fn a_drop_rate_exactly_at_the_threshold_stays_hidden() {
        let items = vec![
            item("U1", "a", WorkItemStatus::Dropped, 0, 10),
            item("U1", "b", WorkItemStatus::Dropped, 0, 11),
            item("U1", "c", WorkItemStatus::Dropped, 0, 12),
            item("U1", "d", WorkItemStatus::Done, 0, 13),
            item("U1", "e", WorkItemStatus::Done, 0, 14),
            item("U1", "f", WorkItemStatus::Done, 0, 15),
            item("U1", "g", WorkItemStatus::Done, 0, 16),
            item("U1", "h", WorkItemStatus::Done, 0, 17),
            item("U1", "i", WorkItemStatus::Done, 0, 18),
            item("U1", "j", WorkItemStatus::Done, 0, 19),
        ];

        // 3 of 10 dropped is exactly 30%, which is not "above" the default.
        assert!(drop_stats(&items, 30).is_empty());
        assert_eq!(drop_stats(&items, 29).len(), 1);
    }
}
