use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use huddle_core::domain::participant::UserId;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("slack api error: {0}")]
    Api(String),
}

/// Outbound messaging surface. The reminder sweep and the poster are written
/// against this trait so tests can record sends instead of hitting Slack.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Direct-message a reminder to a participant.
    async fn send_reminder(&self, user: &UserId, text: &str) -> Result<(), GatewayError>;

    /// Post a rendered submission into a channel.
    async fn post_submission(&self, channel: &str, text: &str) -> Result<(), GatewayError>;
}

/// Lookup of a user's UTC offset, backed by `users.info` in production.
#[async_trait]
pub trait TimezoneDirectory: Send + Sync {
    async fn user_offset_seconds(&self, user: &UserId) -> Result<Option<i32>, GatewayError>;
}

/// Gateway that logs and discards everything. Selected when no bot token is
/// configured, which keeps local development working without Slack access.
#[derive(Clone, Default)]
pub struct NoopGateway;

#[async_trait]
impl MessageGateway for NoopGateway {
    async fn send_reminder(&self, user: &UserId, text: &str) -> Result<(), GatewayError> {
        debug!(event_name = "noop_send_reminder", user = %user.0, text, "dropping reminder");
        Ok(())
    }

    async fn post_submission(&self, channel: &str, text: &str) -> Result<(), GatewayError> {
        debug!(event_name = "noop_post_submission", channel, text, "dropping post");
        Ok(())
    }
}

#[async_trait]
impl TimezoneDirectory for NoopGateway {
    async fn user_offset_seconds(&self, user: &UserId) -> Result<Option<i32>, GatewayError> {
        debug!(event_name = "noop_timezone_lookup", user = %user.0, "no directory available");
        Ok(None)
    }
}
