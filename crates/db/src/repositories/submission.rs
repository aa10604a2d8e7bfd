use sqlx::{sqlite::SqliteRow, Row};

use huddle_core::chrono::NaiveDate;
use huddle_core::domain::participant::{DailyName, UserId};
use huddle_core::domain::submission::Submission;

use super::{parse_date, parse_timestamp, RepositoryError, SubmissionRepository};
use crate::json::{decode_string_list, encode_string_list};
use crate::DbPool;

const SUBMISSION_COLUMNS: &str = "user_id, daily, date, done_items, undone_items, \
     unplanned_items, today_plans, blockers, answers, posted, created_at, updated_at";

pub struct SqlSubmissionRepository {
    pool: DbPool,
}

impl SqlSubmissionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SubmissionRepository for SqlSubmissionRepository {
    async fn find(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<Option<Submission>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submission
             WHERE user_id = ? AND daily = ? AND date = ?"
        ))
        .bind(&user.0)
        .bind(&daily.0)
        .bind(date.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(submission_from_row).transpose()
    }

    async fn find_latest_before(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<Option<Submission>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submission
             WHERE user_id = ? AND daily = ? AND date < ?
             ORDER BY date DESC
             LIMIT 1"
        ))
        .bind(&user.0)
        .bind(&daily.0)
        .bind(date.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(submission_from_row).transpose()
    }

    async fn upsert(&self, submission: Submission) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO submission (
                user_id, daily, date, done_items, undone_items, unplanned_items,
                today_plans, blockers, answers, posted, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id, daily, date) DO UPDATE SET
                done_items = excluded.done_items,
                undone_items = excluded.undone_items,
                unplanned_items = excluded.unplanned_items,
                today_plans = excluded.today_plans,
                blockers = excluded.blockers,
                answers = excluded.answers,
                posted = excluded.posted,
                updated_at = excluded.updated_at",
        )
        .bind(&submission.user_id.0)
        .bind(&submission.daily.0)
        .bind(submission.date.to_string())
        .bind(encode_string_list(&submission.done_items))
        .bind(encode_string_list(&submission.undone_items))
        .bind(encode_string_list(&submission.unplanned_items))
        .bind(encode_string_list(&submission.today_plans))
        .bind(&submission.blockers)
        .bind(encode_string_list(&submission.answers))
        .bind(i64::from(submission.posted))
        .bind(submission.created_at.to_rfc3339())
        .bind(submission.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_posted(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE submission SET posted = 1
             WHERE user_id = ? AND daily = ? AND date = ?",
        )
        .bind(&user.0)
        .bind(&daily.0)
        .bind(date.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_unposted(&self) -> Result<Vec<Submission>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submission
             WHERE posted = 0
             ORDER BY date ASC, user_id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(submission_from_row).collect()
    }

    async fn list_for_daily_between(
        &self,
        daily: &DailyName,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Submission>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submission
             WHERE daily = ? AND date >= ? AND date <= ?
             ORDER BY date ASC, user_id ASC"
        ))
        .bind(&daily.0)
        .bind(from.to_string())
        .bind(to.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(submission_from_row).collect()
    }

    async fn purge_older_than(&self, cutoff: NaiveDate) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM submission WHERE date < ?")
            .bind(cutoff.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn submission_from_row(row: SqliteRow) -> Result<Submission, RepositoryError> {
    Ok(Submission {
        user_id: UserId(row.try_get("user_id")?),
        daily: DailyName(row.try_get("daily")?),
        date: parse_date("date", row.try_get("date")?)?,
        done_items: decode_string_list(&row.try_get::<String, _>("done_items")?),
        undone_items: decode_string_list(&row.try_get::<String, _>("undone_items")?),
        unplanned_items: decode_string_list(&row.try_get::<String, _>("unplanned_items")?),
        today_plans: decode_string_list(&row.try_get::<String, _>("today_plans")?),
        blockers: row.try_get("blockers")?,
        answers: decode_string_list(&row.try_get::<String, _>("answers")?),
        posted: row.try_get::<i64, _>("posted")? != 0,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}
