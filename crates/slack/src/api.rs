use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use huddle_core::domain::participant::UserId;

use crate::gateway::{GatewayError, MessageGateway, TimezoneDirectory};

const DEFAULT_BASE_URL: &str = "https://slack.com/api";

/// Thin client over the Slack Web API endpoints huddle needs:
/// `chat.postMessage` for sends and `users.info` for timezone lookups.
#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    bot_token: SecretString,
    base_url: String,
}

impl SlackApiClient {
    pub fn new(bot_token: SecretString) -> Self {
        Self::with_base_url(bot_token, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(bot_token: SecretString, base_url: String) -> Self {
        Self { http: reqwest::Client::new(), bot_token, base_url }
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&serde_json::json!({ "channel": channel, "text": text }))
            .send()
            .await
            .map_err(|error| GatewayError::Transport(error.to_string()))?;

        let body: ApiAck = response
            .json()
            .await
            .map_err(|error| GatewayError::Transport(error.to_string()))?;
        body.into_result()
    }
}

#[async_trait]
impl MessageGateway for SlackApiClient {
    async fn send_reminder(&self, user: &UserId, text: &str) -> Result<(), GatewayError> {
        debug!(event_name = "slack_send_reminder", user = %user.0, "sending reminder");
        // Slack opens the DM conversation when the channel is a user id.
        self.post_message(&user.0, text).await
    }

    async fn post_submission(&self, channel: &str, text: &str) -> Result<(), GatewayError> {
        debug!(event_name = "slack_post_submission", channel, "posting submission");
        self.post_message(channel, text).await
    }
}

#[async_trait]
impl TimezoneDirectory for SlackApiClient {
    async fn user_offset_seconds(&self, user: &UserId) -> Result<Option<i32>, GatewayError> {
        let response = self
            .http
            .get(format!("{}/users.info", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .query(&[("user", user.0.as_str())])
            .send()
            .await
            .map_err(|error| GatewayError::Transport(error.to_string()))?;

        let body: UserInfoResponse = response
            .json()
            .await
            .map_err(|error| GatewayError::Transport(error.to_string()))?;

        if !body.ok {
            return Err(GatewayError::Api(body.error.unwrap_or_else(|| "unknown".to_string())));
        }
        Ok(body.user.and_then(|user| user.tz_offset))
    }
}

#[derive(Deserialize)]
struct ApiAck {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl ApiAck {
    fn into_result(self) -> Result<(), GatewayError> {
        if self.ok {
            Ok(())
        } else {
            Err(GatewayError::Api(self.error.unwrap_or_else(|| "unknown".to_string())))
        }
    }
}

#[derive(Deserialize)]
struct UserInfoResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    user: Option<UserInfo>,
}

#[derive(Deserialize)]
struct UserInfo {
    #[serde(default)]
    tz_offset: Option<i32>,
}
