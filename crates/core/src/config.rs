use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::localtime::{LocalTimeOfDay, WeekdayCode};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub slack: SlackConfig,
    pub server: ServerConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
    pub standup: StandupConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    /// Empty token means the noop gateway: nothing is sent, everything else
    /// still runs. Useful for local runs and CI.
    pub bot_token: SecretString,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
}

/// Lifecycle-engine tunables. Defaults encode the contract: a 2-hour prompt
/// window swept every 30 minutes, with a 30-minute reprompt throttle.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub sweep_interval_minutes: u64,
    pub prompt_window_minutes: u32,
    pub reprompt_throttle_minutes: i64,
    pub timezone_ttl_hours: i64,
    pub bottleneck_threshold: u32,
    pub bottleneck_cap: usize,
    pub drop_threshold_pct: u32,
    pub retention_days: i64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Static standup definitions: named schedules and the dailies bound to
/// them. Loaded once, validated, and immutable for the process lifetime.
#[derive(Clone, Debug, Default)]
pub struct StandupConfig {
    pub schedules: BTreeMap<String, Schedule>,
    pub dailies: BTreeMap<String, Daily>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub days: Vec<WeekdayCode>,
    pub time: LocalTimeOfDay,
}

impl Schedule {
    pub fn is_workday(&self, day: WeekdayCode) -> bool {
        self.days.contains(&day)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Daily {
    pub channel: String,
    pub schedule: String,
    pub questions: Vec<String>,
}

impl StandupConfig {
    pub fn daily(&self, name: &str) -> Option<&Daily> {
        self.dailies.get(name)
    }

    pub fn schedule(&self, name: &str) -> Option<&Schedule> {
        self.schedules.get(name)
    }

    /// Schedule for a daily, resolved through the daily's binding.
    pub fn schedule_for_daily(&self, daily: &str) -> Option<&Schedule> {
        self.daily(daily).and_then(|daily| self.schedule(&daily.schedule))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub slack_bot_token: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://huddle.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            slack: SlackConfig { bot_token: String::new().into() },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), health_check_port: 8080 },
            scheduler: SchedulerConfig {
                sweep_interval_minutes: 30,
                prompt_window_minutes: 120,
                reprompt_throttle_minutes: 30,
                timezone_ttl_hours: 24,
                bottleneck_threshold: 3,
                bottleneck_cap: 5,
                drop_threshold_pct: 30,
                retention_days: 28,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            standup: StandupConfig::default(),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("huddle.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(slack) = patch.slack {
            if let Some(bot_token_value) = slack.bot_token {
                self.slack.bot_token = bot_token_value.into();
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
        }

        if let Some(scheduler) = patch.scheduler {
            if let Some(value) = scheduler.sweep_interval_minutes {
                self.scheduler.sweep_interval_minutes = value;
            }
            if let Some(value) = scheduler.prompt_window_minutes {
                self.scheduler.prompt_window_minutes = value;
            }
            if let Some(value) = scheduler.reprompt_throttle_minutes {
                self.scheduler.reprompt_throttle_minutes = value;
            }
            if let Some(value) = scheduler.timezone_ttl_hours {
                self.scheduler.timezone_ttl_hours = value;
            }
            if let Some(value) = scheduler.bottleneck_threshold {
                self.scheduler.bottleneck_threshold = value;
            }
            if let Some(value) = scheduler.bottleneck_cap {
                self.scheduler.bottleneck_cap = value;
            }
            if let Some(value) = scheduler.drop_threshold_pct {
                self.scheduler.drop_threshold_pct = value;
            }
            if let Some(value) = scheduler.retention_days {
                self.scheduler.retention_days = value;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        for (name, schedule) in patch.schedules {
            let days = schedule
                .days
                .iter()
                .map(|day| WeekdayCode::parse(day))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|error| {
                    ConfigError::Validation(format!("schedule `{name}`: {error}"))
                })?;
            let time = LocalTimeOfDay::parse(&schedule.time).map_err(|error| {
                ConfigError::Validation(format!("schedule `{name}`: {error}"))
            })?;
            self.standup.schedules.insert(name, Schedule { days, time });
        }

        for (name, daily) in patch.dailies {
            self.standup.dailies.insert(
                name,
                Daily {
                    channel: daily.channel,
                    schedule: daily.schedule,
                    questions: daily.questions.unwrap_or_default(),
                },
            );
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("HUDDLE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("HUDDLE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("HUDDLE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("HUDDLE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("HUDDLE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("HUDDLE_SLACK_BOT_TOKEN") {
            self.slack.bot_token = value.into();
        }

        if let Some(value) = read_env("HUDDLE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("HUDDLE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port = parse_u16("HUDDLE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        if let Some(value) = read_env("HUDDLE_SCHEDULER_SWEEP_INTERVAL_MINUTES") {
            self.scheduler.sweep_interval_minutes =
                parse_u64("HUDDLE_SCHEDULER_SWEEP_INTERVAL_MINUTES", &value)?;
        }

        let log_level = read_env("HUDDLE_LOGGING_LEVEL").or_else(|| read_env("HUDDLE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("HUDDLE_LOGGING_FORMAT").or_else(|| read_env("HUDDLE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(slack_bot_token) = overrides.slack_bot_token {
            self.slack.bot_token = slack_bot_token.into();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_slack(&self.slack)?;
        validate_server(&self.server)?;
        validate_scheduler(&self.scheduler)?;
        validate_logging(&self.logging)?;
        validate_standup(&self.standup)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("huddle.toml"), PathBuf::from("config/huddle.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    slack: Option<SlackPatch>,
    server: Option<ServerPatch>,
    scheduler: Option<SchedulerPatch>,
    logging: Option<LoggingPatch>,
    #[serde(default)]
    schedules: BTreeMap<String, SchedulePatch>,
    #[serde(default)]
    dailies: BTreeMap<String, DailyPatch>,
}

#[derive(Debug, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SlackPatch {
    bot_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct SchedulerPatch {
    sweep_interval_minutes: Option<u64>,
    prompt_window_minutes: Option<u32>,
    reprompt_throttle_minutes: Option<i64>,
    timezone_ttl_hours: Option<i64>,
    bottleneck_threshold: Option<u32>,
    bottleneck_cap: Option<usize>,
    drop_threshold_pct: Option<u32>,
    retention_days: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Deserialize)]
struct SchedulePatch {
    days: Vec<String>,
    time: String,
}

#[derive(Debug, Deserialize)]
struct DailyPatch {
    channel: String,
    schedule: String,
    questions: Option<Vec<String>>,
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    let bot_token = slack.bot_token.expose_secret();
    if !bot_token.is_empty() && !bot_token.starts_with("xoxb-") {
        return Err(ConfigError::Validation(
            "slack.bot_token must start with `xoxb-` when set. Get it from https://api.slack.com/apps > Your App > OAuth & Permissions > Bot User OAuth Token".to_string()
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_scheduler(scheduler: &SchedulerConfig) -> Result<(), ConfigError> {
    if scheduler.sweep_interval_minutes == 0 {
        return Err(ConfigError::Validation(
            "scheduler.sweep_interval_minutes must be greater than zero".to_string(),
        ));
    }

    if scheduler.prompt_window_minutes == 0 || scheduler.prompt_window_minutes > 24 * 60 {
        return Err(ConfigError::Validation(
            "scheduler.prompt_window_minutes must be in range 1..=1440".to_string(),
        ));
    }

    if scheduler.reprompt_throttle_minutes <= 0 {
        return Err(ConfigError::Validation(
            "scheduler.reprompt_throttle_minutes must be greater than zero".to_string(),
        ));
    }

    if scheduler.timezone_ttl_hours <= 0 {
        return Err(ConfigError::Validation(
            "scheduler.timezone_ttl_hours must be greater than zero".to_string(),
        ));
    }

    if scheduler.drop_threshold_pct > 100 {
        return Err(ConfigError::Validation(
            "scheduler.drop_threshold_pct must be in range 0..=100".to_string(),
        ));
    }

    if scheduler.retention_days <= 0 {
        return Err(ConfigError::Validation(
            "scheduler.retention_days must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_standup(standup: &StandupConfig) -> Result<(), ConfigError> {
    for (name, schedule) in &standup.schedules {
        if schedule.days.is_empty() {
            return Err(ConfigError::Validation(format!(
                "schedule `{name}` must list at least one workday"
            )));
        }
    }

    for (name, daily) in &standup.dailies {
        if daily.channel.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "daily `{name}` must name a channel"
            )));
        }
        if !standup.schedules.contains_key(&daily.schedule) {
            return Err(ConfigError::Validation(format!(
                "daily `{name}` references unknown schedule `{}`",
                daily.schedule
            )));
        }
    }

    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use crate::localtime::WeekdayCode;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};

    fn load_from(contents: &str) -> Result<AppConfig, ConfigError> {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");

        AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            ..LoadOptions::default()
        })
    }

    #[test]
    fn loads_schedules_and_dailies_from_file() {
        let config = load_from(
            r#"
            [schedules.default]
            days = ["sun", "mon", "tue", "wed", "thu"]
            time = "09:00"

            [dailies.platform]
            channel = "C0PLATFORM"
            schedule = "default"
            questions = ["Anything blocking you?"]
            "#,
        )
        .expect("config should load");

        let schedule = config.standup.schedule_for_daily("platform").expect("bound schedule");
        assert_eq!(schedule.time.minutes_of_day(), 9 * 60);
        assert!(schedule.is_workday(WeekdayCode::Sun));
        assert!(!schedule.is_workday(WeekdayCode::Fri));
        assert_eq!(config.standup.daily("platform").expect("daily").channel, "C0PLATFORM");
    }

    #[test]
    fn rejects_daily_bound_to_missing_schedule() {
        let error = load_from(
            r#"
            [dailies.platform]
            channel = "C0PLATFORM"
            schedule = "nope"
            "#,
        )
        .expect_err("must reject dangling schedule reference");

        assert!(matches!(error, ConfigError::Validation(message) if message.contains("nope")));
    }

    #[test]
    fn rejects_malformed_schedule_time() {
        let error = load_from(
            r#"
            [schedules.default]
            days = ["mon"]
            time = "9 o'clock"
            "#,
        )
        .expect_err("must reject bad time");

        assert!(matches!(error, ConfigError::Validation(_)));
    }

    #[test]
    fn rejects_schedule_without_workdays() {
        let error = load_from(
            r#"
            [schedules.default]
            days = []
            time = "09:00"
            "#,
        )
        .expect_err("must reject empty workday set");

        assert!(matches!(error, ConfigError::Validation(message) if message.contains("workday")));
    }

    #[test]
    fn rejects_non_bot_slack_token() {
        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                slack_bot_token: Some("xapp-wrong-kind".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        assert!(matches!(result, Err(ConfigError::Validation(message)) if message.contains("xoxb-")));
    }

    #[test]
    fn defaults_encode_the_operational_cadence() {
        let config = AppConfig::default();
        assert_eq!(config.scheduler.sweep_interval_minutes, 30);
        assert_eq!(config.scheduler.prompt_window_minutes, 120);
        assert_eq!(config.scheduler.reprompt_throttle_minutes, 30);
        assert_eq!(config.scheduler.retention_days, 28);
        config.validate().expect("defaults must validate");
    }
}
