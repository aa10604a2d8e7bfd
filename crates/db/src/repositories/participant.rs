use sqlx::{sqlite::SqliteRow, Row};

use huddle_core::domain::participant::{DailyName, Participant, ScheduleName, UserId};
use huddle_core::localtime::LocalTimeOfDay;

use super::{parse_timestamp, ParticipantRepository, RepositoryError};
use crate::DbPool;

pub struct SqlParticipantRepository {
    pool: DbPool,
}

impl SqlParticipantRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ParticipantRepository for SqlParticipantRepository {
    async fn list_all(&self) -> Result<Vec<Participant>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT user_id, daily, schedule, time_override, created_at
             FROM participant
             ORDER BY daily ASC, user_id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(participant_from_row).collect()
    }

    async fn list_for_daily(&self, daily: &DailyName) -> Result<Vec<Participant>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT user_id, daily, schedule, time_override, created_at
             FROM participant
             WHERE daily = ?
             ORDER BY user_id ASC",
        )
        .bind(&daily.0)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(participant_from_row).collect()
    }

    async fn save(&self, participant: Participant) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO participant (user_id, daily, schedule, time_override, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(user_id, daily) DO UPDATE SET
                schedule = excluded.schedule,
                time_override = excluded.time_override",
        )
        .bind(&participant.user_id.0)
        .bind(&participant.daily.0)
        .bind(&participant.schedule.0)
        .bind(participant.time_override.map(|time| time.to_string()))
        .bind(participant.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, user: &UserId, daily: &DailyName) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM participant WHERE user_id = ? AND daily = ?")
            .bind(&user.0)
            .bind(&daily.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn participant_from_row(row: SqliteRow) -> Result<Participant, RepositoryError> {
    let time_override = row
        .try_get::<Option<String>, _>("time_override")?
        .map(|value| {
            LocalTimeOfDay::parse(&value).map_err(|error| {
                RepositoryError::Decode(format!("invalid time_override `{value}`: {error}"))
            })
        })
        .transpose()?;

    Ok(Participant {
        user_id: UserId(row.try_get("user_id")?),
        daily: DailyName(row.try_get("daily")?),
        schedule: ScheduleName(row.try_get("schedule")?),
        time_override,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use huddle_core::chrono::{TimeZone, Utc};
    use huddle_core::domain::participant::{DailyName, Participant, ScheduleName, UserId};
    use huddle_core::localtime::LocalTimeOfDay;

    use super::SqlParticipantRepository;
    use crate::migrations;
    use crate::repositories::ParticipantRepository;
    use crate::{connect_with_settings, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn participant(user: &str, daily: &str) -> Participant {
        Participant {
            user_id: UserId(user.to_string()),
            daily: DailyName(daily.to_string()),
            schedule: ScheduleName("default".to_string()),
            time_override: Some(LocalTimeOfDay::parse("10:30").unwrap()),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn save_list_and_remove_round_trip() {
        let pool = setup_pool().await;
        let repo = SqlParticipantRepository::new(pool.clone());

        let first = participant("U1", "platform");
        let second = participant("U2", "platform");
        repo.save(first.clone()).await.expect("save first");
        repo.save(second.clone()).await.expect("save second");

        let listed = repo.list_for_daily(&first.daily).await.expect("list");
        assert_eq!(listed, vec![first.clone(), second.clone()]);
        assert_eq!(repo.list_all().await.expect("list all").len(), 2);

        repo.remove(&first.user_id, &first.daily).await.expect("remove");
        let listed = repo.list_for_daily(&first.daily).await.expect("list after remove");
        assert_eq!(listed, vec![second]);

        pool.close().await;
    }

    #[tokio::test]
    async fn save_is_an_upsert_on_the_natural_key() {
        let pool = setup_pool().await;
        let repo = SqlParticipantRepository::new(pool.clone());

        let mut row = participant("U1", "platform");
        repo.save(row.clone()).await.expect("insert");
        row.time_override = None;
        repo.save(row.clone()).await.expect("update");

        let listed = repo.list_all().await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].time_override, None);

        pool.close().await;
    }
}
