use sqlx::{sqlite::SqliteRow, Row};

use huddle_core::domain::participant::UserId;
use huddle_core::domain::timezone::TimezoneOffset;

use super::{parse_timestamp, RepositoryError, TimezoneCacheRepository};
use crate::DbPool;

pub struct SqlTimezoneRepository {
    pool: DbPool,
}

impl SqlTimezoneRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TimezoneCacheRepository for SqlTimezoneRepository {
    async fn find(&self, user: &UserId) -> Result<Option<TimezoneOffset>, RepositoryError> {
        let row = sqlx::query(
            "SELECT user_id, offset_seconds, fetched_at FROM user_timezone WHERE user_id = ?",
        )
        .bind(&user.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(timezone_from_row).transpose()
    }

    async fn put(&self, entry: TimezoneOffset) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user_timezone (user_id, offset_seconds, fetched_at)
             VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET
                offset_seconds = excluded.offset_seconds,
                fetched_at = excluded.fetched_at",
        )
        .bind(&entry.user_id.0)
        .bind(i64::from(entry.offset_seconds))
        .bind(entry.fetched_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn timezone_from_row(row: SqliteRow) -> Result<TimezoneOffset, RepositoryError> {
    let offset: i64 = row.try_get("offset_seconds")?;
    let offset_seconds = i32::try_from(offset).map_err(|_| {
        RepositoryError::Decode(format!("offset_seconds out of range: {offset}"))
    })?;

    Ok(TimezoneOffset {
        user_id: UserId(row.try_get("user_id")?),
        offset_seconds,
        fetched_at: parse_timestamp("fetched_at", row.try_get("fetched_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use huddle_core::chrono::{DateTime, Utc};
    use huddle_core::domain::participant::UserId;
    use huddle_core::domain::timezone::TimezoneOffset;

    use super::SqlTimezoneRepository;
    use crate::migrations;
    use crate::repositories::TimezoneCacheRepository;
    use crate::{connect_with_settings, DbPool};

    async fn setup_pool() -> DbPool {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn parse_ts(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).expect("valid rfc3339").with_timezone(&Utc)
    }

    #[tokio::test]
    async fn put_refreshes_an_existing_entry() {
        let pool = setup_pool().await;
        let repo = SqlTimezoneRepository::new(pool.clone());
        let user = UserId("U1".to_string());

        repo.put(TimezoneOffset {
            user_id: user.clone(),
            offset_seconds: 7200,
            fetched_at: parse_ts("2026-03-09T07:00:00Z"),
        })
        .await
        .expect("initial put");

        let refreshed = TimezoneOffset {
            user_id: user.clone(),
            offset_seconds: -18000,
            fetched_at: parse_ts("2026-03-10T07:00:00Z"),
        };
        repo.put(refreshed.clone()).await.expect("refresh");

        let found = repo.find(&user).await.expect("find");
        assert_eq!(found, Some(refreshed));

        pool.close().await;
    }

    #[tokio::test]
    async fn missing_user_returns_none() {
        let pool = setup_pool().await;
        let repo = SqlTimezoneRepository::new(pool.clone());

        let found = repo.find(&UserId("U404".to_string())).await.expect("find");
        assert_eq!(found, None);

        pool.close().await;
    }
}
