use std::sync::Arc;

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::info;

use huddle_core::config::{AppConfig, ConfigError, LoadOptions};
use huddle_db::{connect, migrations, DbPool};
use huddle_slack::{MessageGateway, NoopGateway, SlackApiClient, TimezoneDirectory};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub gateway: Arc<dyn MessageGateway>,
    pub timezones: Arc<dyn TimezoneDirectory>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "bootstrap_start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "bootstrap_database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "bootstrap_migrations_applied", "database migrations applied");

    let (gateway, timezones): (Arc<dyn MessageGateway>, Arc<dyn TimezoneDirectory>) =
        if config.slack.bot_token.expose_secret().is_empty() {
            info!(event_name = "bootstrap_gateway_noop", "no bot token, using noop gateway");
            let noop = Arc::new(NoopGateway);
            (noop.clone(), noop)
        } else {
            let client = Arc::new(SlackApiClient::new(config.slack.bot_token.clone()));
            (client.clone(), client)
        };

    Ok(Application { config, db_pool, gateway, timezones })
}

#[cfg(test)]
mod tests {
    use huddle_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    fn memory_options(token: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                slack_bot_token: Some(token.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_runs_migrations_on_an_empty_database() {
        let app = bootstrap(memory_options("")).await.expect("bootstrap");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('participant', 'prompt', 'submission', 'work_item', 'ooo_record', 'user_timezone')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("count tables");
        assert_eq!(table_count, 6);

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_rejects_malformed_bot_tokens() {
        let result = bootstrap(memory_options("not-a-bot-token")).await;
        let message = result.err().expect("config error").to_string();
        assert!(message.contains("slack.bot_token"));
    }
}
