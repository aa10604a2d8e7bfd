use chrono::{Days, NaiveDate, Utc};

use crate::commands::CommandResult;
use huddle_core::config::{AppConfig, LoadOptions};
use huddle_core::domain::work_item::WorkItemId;
use huddle_db::connect;
use huddle_db::repositories::{SqlWorkItemRepository, WorkItemRepository};

/// Hide-until date for a snooze of `days` starting today. An item stays out
/// of bottleneck reports while the date is in the future, so `days = 0`
/// leaves it visible.
pub fn snooze_until(today: NaiveDate, days: u32) -> NaiveDate {
    today.checked_add_days(Days::new(u64::from(days))).unwrap_or(today)
}

pub fn run(item: &str, days: u32) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "snooze",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "snooze",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let until = snooze_until(Utc::now().date_naive(), days);

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        let repo = SqlWorkItemRepository::new(pool.clone());
        let matched = repo
            .snooze(&WorkItemId(item.to_string()), until)
            .await
            .map_err(|error| ("snooze_update", error.to_string(), 4u8))?;
        pool.close().await;

        if matched {
            Ok(())
        } else {
            Err(("unknown_item", format!("no work item with id `{item}`"), 2u8))
        }
    });

    match result {
        Ok(()) => CommandResult::success(
            "snooze",
            format!("item hidden from bottleneck reports until {until}"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("snooze", error_class, message, exit_code)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::snooze_until;

    #[test]
    fn snooze_until_adds_days_to_today() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert_eq!(snooze_until(today, 3), NaiveDate::from_ymd_opt(2026, 3, 13).unwrap());
        assert_eq!(snooze_until(today, 0), today);
        // Rolls across a month boundary.
        assert_eq!(snooze_until(today, 25), NaiveDate::from_ymd_opt(2026, 4, 4).unwrap());
    }
}
