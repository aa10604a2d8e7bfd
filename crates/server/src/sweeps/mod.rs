//! Periodic background passes: the reminder sweep, the scheduled-post
//! sweep, and the retention purge. Each pass is a sequential loop with
//! per-unit error isolation; a failing participant or submission is logged
//! and tallied without aborting the batch.

pub mod poster;
pub mod reminder;
pub mod retention;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::warn;

use huddle_core::domain::participant::UserId;
use huddle_core::domain::timezone::TimezoneOffset;
use huddle_db::repositories::{RepositoryError, TimezoneCacheRepository};
use huddle_slack::{GatewayError, TimezoneDirectory};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub processed: u64,
    pub skipped: u64,
    pub errors: u64,
}

#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("no timezone available for user {0}")]
    UnknownTimezone(String),
}

/// UTC-offset lookup with a persistent cache in front of the directory.
/// Cache entries older than the TTL are refreshed; when the refresh fails
/// a stale entry is still used rather than dropping the participant.
pub struct TimezoneResolver {
    cache: Arc<dyn TimezoneCacheRepository>,
    directory: Arc<dyn TimezoneDirectory>,
    ttl_hours: i64,
}

impl TimezoneResolver {
    pub fn new(
        cache: Arc<dyn TimezoneCacheRepository>,
        directory: Arc<dyn TimezoneDirectory>,
        ttl_hours: i64,
    ) -> Self {
        Self { cache, directory, ttl_hours }
    }

    pub async fn offset_seconds(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<i32, SweepError> {
        let cached = self.cache.find(user).await?;
        if let Some(entry) = &cached {
            if entry.is_fresh(now, self.ttl_hours) {
                return Ok(entry.offset_seconds);
            }
        }

        match self.directory.user_offset_seconds(user).await {
            Ok(Some(offset_seconds)) => {
                self.cache
                    .put(TimezoneOffset { user_id: user.clone(), offset_seconds, fetched_at: now })
                    .await?;
                Ok(offset_seconds)
            }
            Ok(None) => match cached {
                Some(stale) => Ok(stale.offset_seconds),
                None => Err(SweepError::UnknownTimezone(user.0.clone())),
            },
            Err(error) => match cached {
                Some(stale) => {
                    warn!(
                        event_name = "timezone_refresh_failed",
                        user = %user.0,
                        error = %error,
                        "timezone refresh failed, using stale cache entry"
                    );
                    Ok(stale.offset_seconds)
                }
                None => Err(SweepError::Gateway(error)),
            },
        }
    }
}
