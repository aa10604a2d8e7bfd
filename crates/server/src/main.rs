use std::sync::Arc;

use anyhow::Result;

use huddle_core::config::{AppConfig, LoadOptions};
use huddle_db::repositories::{
    SqlOooRepository, SqlParticipantRepository, SqlPromptRepository, SqlSubmissionRepository,
    SqlTimezoneRepository,
};
use huddle_server::sweeps::poster::PosterSweep;
use huddle_server::sweeps::reminder::ReminderSweep;
use huddle_server::sweeps::retention::RetentionSweep;
use huddle_server::sweeps::TimezoneResolver;
use huddle_server::{bootstrap, health};

fn init_logging(config: &AppConfig) {
    use huddle_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.db_pool.clone(),
    )
    .await?;

    let participants = Arc::new(SqlParticipantRepository::new(app.db_pool.clone()));
    let prompts = Arc::new(SqlPromptRepository::new(app.db_pool.clone()));
    let submissions = Arc::new(SqlSubmissionRepository::new(app.db_pool.clone()));
    let ooo = Arc::new(SqlOooRepository::new(app.db_pool.clone()));
    let timezone_cache = Arc::new(SqlTimezoneRepository::new(app.db_pool.clone()));

    let reminder = Arc::new(ReminderSweep::new(
        participants,
        prompts.clone(),
        ooo.clone(),
        TimezoneResolver::new(
            timezone_cache.clone(),
            app.timezones.clone(),
            app.config.scheduler.timezone_ttl_hours,
        ),
        app.gateway.clone(),
        app.config.standup.clone(),
        app.config.scheduler.clone(),
    ));
    let poster = Arc::new(PosterSweep::new(
        submissions.clone(),
        ooo,
        TimezoneResolver::new(
            timezone_cache,
            app.timezones.clone(),
            app.config.scheduler.timezone_ttl_hours,
        ),
        app.gateway.clone(),
        app.config.standup.clone(),
        app.config.scheduler.clone(),
    ));
    let retention =
        Arc::new(RetentionSweep::new(prompts, submissions, app.config.scheduler.retention_days));

    let handles =
        [reminder.spawn(), poster.spawn(), retention.spawn()];

    tracing::info!(event_name = "server_started", "huddle-server started");
    tokio::signal::ctrl_c().await?;
    tracing::info!(event_name = "server_stopping", "huddle-server stopping");

    for handle in handles {
        handle.abort();
    }

    Ok(())
}
