use sqlx::{sqlite::SqliteRow, Row};

use huddle_core::chrono::{DateTime, NaiveDate, Utc};
use huddle_core::domain::participant::{DailyName, UserId};
use huddle_core::domain::prompt::Prompt;

use super::{parse_date, parse_optional_timestamp, PromptRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPromptRepository {
    pool: DbPool,
}

impl SqlPromptRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PromptRepository for SqlPromptRepository {
    async fn load_or_create(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<Prompt, RepositoryError> {
        // Lazy creation: the no-op conflict arm makes concurrent sweeps safe.
        sqlx::query(
            "INSERT INTO prompt (user_id, daily, date, last_prompted_at, submitted)
             VALUES (?, ?, ?, NULL, 0)
             ON CONFLICT(user_id, daily, date) DO NOTHING",
        )
        .bind(&user.0)
        .bind(&daily.0)
        .bind(date.to_string())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT user_id, daily, date, last_prompted_at, submitted
             FROM prompt
             WHERE user_id = ? AND daily = ? AND date = ?",
        )
        .bind(&user.0)
        .bind(&daily.0)
        .bind(date.to_string())
        .fetch_one(&self.pool)
        .await?;

        prompt_from_row(row)
    }

    async fn mark_prompted(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE prompt SET last_prompted_at = ?
             WHERE user_id = ? AND daily = ? AND date = ?",
        )
        .bind(at.to_rfc3339())
        .bind(&user.0)
        .bind(&daily.0)
        .bind(date.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_submitted(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO prompt (user_id, daily, date, last_prompted_at, submitted)
             VALUES (?, ?, ?, NULL, 1)
             ON CONFLICT(user_id, daily, date) DO UPDATE SET submitted = 1",
        )
        .bind(&user.0)
        .bind(&daily.0)
        .bind(date.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn purge_older_than(&self, cutoff: NaiveDate) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM prompt WHERE date < ?")
            .bind(cutoff.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn prompt_from_row(row: SqliteRow) -> Result<Prompt, RepositoryError> {
    Ok(Prompt {
        user_id: UserId(row.try_get("user_id")?),
        daily: DailyName(row.try_get("daily")?),
        date: parse_date("date", row.try_get("date")?)?,
        last_prompted_at: parse_optional_timestamp(
            "last_prompted_at",
            row.try_get("last_prompted_at")?,
        )?,
        submitted: row.try_get::<i64, _>("submitted")? != 0,
    })
}
