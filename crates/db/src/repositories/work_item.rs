use sqlx::{sqlite::SqliteRow, Row};

use huddle_core::chrono::NaiveDate;
use huddle_core::domain::participant::{DailyName, UserId};
use huddle_core::domain::work_item::{WorkItem, WorkItemId, WorkItemStatus};

use super::{
    parse_date, parse_optional_date, parse_u32, RepositoryError, WorkItemRepository,
};
use crate::DbPool;

const WORK_ITEM_COLUMNS: &str =
    "id, user_id, daily, text, status, carry_count, created_date, completed_date, snoozed_until";

pub struct SqlWorkItemRepository {
    pool: DbPool,
}

impl SqlWorkItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl WorkItemRepository for SqlWorkItemRepository {
    async fn save(&self, item: WorkItem) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO work_item (
                id, user_id, daily, text, status, carry_count,
                created_date, completed_date, snoozed_until
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                text = excluded.text,
                status = excluded.status,
                carry_count = excluded.carry_count,
                completed_date = excluded.completed_date,
                snoozed_until = excluded.snoozed_until",
        )
        .bind(&item.id.0)
        .bind(&item.user_id.0)
        .bind(&item.daily.0)
        .bind(&item.text)
        .bind(item.status.as_str())
        .bind(i64::from(item.carry_count))
        .bind(item.created_date.to_string())
        .bind(item.completed_date.map(|date| date.to_string()))
        .bind(item.snoozed_until.map(|date| date.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_open_by_text(
        &self,
        user: &UserId,
        daily: &DailyName,
        text: &str,
    ) -> Result<Vec<WorkItem>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {WORK_ITEM_COLUMNS} FROM work_item
             WHERE user_id = ? AND daily = ? AND text = ?
               AND status IN ('pending', 'carried')
             ORDER BY created_date ASC"
        ))
        .bind(&user.0)
        .bind(&daily.0)
        .bind(text)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(work_item_from_row).collect()
    }

    async fn list_open_for_daily(
        &self,
        daily: &DailyName,
    ) -> Result<Vec<WorkItem>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {WORK_ITEM_COLUMNS} FROM work_item
             WHERE daily = ? AND status IN ('pending', 'carried')
             ORDER BY created_date ASC, id ASC"
        ))
        .bind(&daily.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(work_item_from_row).collect()
    }

    async fn list_for_daily_created_between(
        &self,
        daily: &DailyName,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WorkItem>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {WORK_ITEM_COLUMNS} FROM work_item
             WHERE daily = ? AND created_date >= ? AND created_date <= ?
             ORDER BY created_date ASC, id ASC"
        ))
        .bind(&daily.0)
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(work_item_from_row).collect()
    }

    async fn snooze(&self, id: &WorkItemId, until: NaiveDate) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE work_item SET snoozed_until = ? WHERE id = ?")
            .bind(until.to_string())
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn work_item_from_row(row: SqliteRow) -> Result<WorkItem, RepositoryError> {
    let status_raw: String = row.try_get("status")?;
    let status = WorkItemStatus::parse(&status_raw).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown work item status `{status_raw}`"))
    })?;

    Ok(WorkItem {
        id: WorkItemId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        daily: DailyName(row.try_get("daily")?),
        text: row.try_get("text")?,
        status,
        carry_count: parse_u32("carry_count", row.try_get("carry_count")?)?,
        created_date: parse_date("created_date", row.try_get("created_date")?)?,
        completed_date: parse_optional_date("completed_date", row.try_get("completed_date")?)?,
        snoozed_until: parse_optional_date("snoozed_until", row.try_get("snoozed_until")?)?,
    })
}
