use sqlx::{sqlite::SqliteRow, Row};

use huddle_core::chrono::NaiveDate;
use huddle_core::domain::ooo::{OooId, OooRecord};
use huddle_core::domain::participant::{DailyName, UserId};

use super::{parse_date, OooRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOooRepository {
    pool: DbPool,
}

impl SqlOooRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OooRepository for SqlOooRepository {
    async fn save(&self, record: OooRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO ooo_record (id, user_id, daily, start_date, end_date)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                start_date = excluded.start_date,
                end_date = excluded.end_date",
        )
        .bind(&record.id.0)
        .bind(&record.user_id.0)
        .bind(&record.daily.0)
        .bind(record.start_date.to_string())
        .bind(record.end_date.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear(&self, user: &UserId, daily: &DailyName) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM ooo_record WHERE user_id = ? AND daily = ?")
            .bind(&user.0)
            .bind(&daily.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn active_for(
        &self,
        user: &UserId,
        daily: &DailyName,
        date: NaiveDate,
    ) -> Result<Option<OooRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, daily, start_date, end_date FROM ooo_record
             WHERE user_id = ? AND daily = ? AND start_date <= ? AND end_date >= ?
             LIMIT 1",
        )
        .bind(&user.0)
        .bind(&daily.0)
        .bind(date.to_string())
        .bind(date.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ooo_from_row).transpose()
    }
}

fn ooo_from_row(row: SqliteRow) -> Result<OooRecord, RepositoryError> {
    Ok(OooRecord {
        id: OooId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        daily: DailyName(row.try_get("daily")?),
        start_date: parse_date("start_date", row.try_get("start_date")?)?,
        end_date: parse_date("end_date", row.try_get("end_date")?)?,
    })
}
