use chrono::{Datelike, NaiveDate, Utc};

use huddle_core::analytics::digest::{build_report, DigestInputs, DigestReport, PeriodRows};
use huddle_core::analytics::trend::TrendDirection;
use huddle_core::config::{AppConfig, LoadOptions, Schedule};
use huddle_core::domain::participant::DailyName;
use huddle_core::localtime::WeekdayCode;
use huddle_db::connect;
use huddle_db::repositories::{
    ParticipantRepository, SqlParticipantRepository, SqlSubmissionRepository,
    SqlWorkItemRepository, SubmissionRepository, WorkItemRepository,
};

use crate::commands::CommandResult;

pub fn run(
    daily_name: &str,
    from: NaiveDate,
    to: NaiveDate,
    workdays_override: Option<u32>,
) -> CommandResult {
    if from > to {
        return CommandResult::failure(
            "report",
            "invalid_range",
            format!("--from {from} is after --to {to}"),
            2,
        );
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "report",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let Some(schedule) = config.standup.schedule_for_daily(daily_name) else {
        return CommandResult::failure(
            "report",
            "unknown_daily",
            format!("daily `{daily_name}` is not configured"),
            2,
        );
    };

    let workdays =
        workdays_override.unwrap_or_else(|| workdays_in_range(schedule, from, to));

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "report",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let report = runtime.block_on(assemble(&config, daily_name, from, to, workdays));

    match report {
        Ok(report) => {
            CommandResult::success("report", render_report(daily_name, from, to, workdays, &report))
        }
        Err(message) => CommandResult::failure("report", "report_assembly", message, 4),
    }
}

async fn assemble(
    config: &AppConfig,
    daily_name: &str,
    from: NaiveDate,
    to: NaiveDate,
    workdays: u32,
) -> Result<DigestReport, String> {
    let pool = connect(&config.database)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let submissions = SqlSubmissionRepository::new(pool.clone());
    let work_items = SqlWorkItemRepository::new(pool.clone());
    let participants = SqlParticipantRepository::new(pool.clone());
    let daily = DailyName(daily_name.to_string());

    let period_days = (to - from).num_days() + 1;
    let prev_to = from.pred_opt().ok_or_else(|| "period start out of range".to_string())?;
    let prev_from = from - chrono::Duration::days(period_days);

    let fetch = async {
        let current = PeriodRows {
            submissions: submissions.list_for_daily_between(&daily, from, to).await?,
            items: work_items.list_for_daily_created_between(&daily, from, to).await?,
        };
        let previous = PeriodRows {
            submissions: submissions.list_for_daily_between(&daily, prev_from, prev_to).await?,
            items: work_items
                .list_for_daily_created_between(&daily, prev_from, prev_to)
                .await?,
        };
        let open_items = work_items.list_open_for_daily(&daily).await?;
        let participant_count = participants.list_for_daily(&daily).await?.len() as u32;
        Ok::<_, huddle_db::repositories::RepositoryError>((
            current,
            previous,
            open_items,
            participant_count,
        ))
    };

    let (current, previous, open_items, participant_count) =
        fetch.await.map_err(|error| format!("failed to read report data: {error}"))?;
    pool.close().await;

    Ok(build_report(DigestInputs {
        current,
        previous,
        open_items,
        workdays,
        participant_count,
        today: Utc::now().date_naive(),
        bottleneck_threshold: config.scheduler.bottleneck_threshold,
        bottleneck_cap: config.scheduler.bottleneck_cap,
        drop_threshold_pct: config.scheduler.drop_threshold_pct,
    }))
}

fn workdays_in_range(schedule: &Schedule, from: NaiveDate, to: NaiveDate) -> u32 {
    from.iter_days()
        .take_while(|date| *date <= to)
        .filter(|date| schedule.days.contains(&WeekdayCode::from(date.weekday())))
        .count() as u32
}

fn direction_label(direction: TrendDirection) -> &'static str {
    match direction {
        TrendDirection::Improved => "improved",
        TrendDirection::Stable => "stable",
        TrendDirection::Declined => "declined",
    }
}

fn render_report(
    daily: &str,
    from: NaiveDate,
    to: NaiveDate,
    workdays: u32,
    report: &DigestReport,
) -> String {
    let mut lines = vec![format!("digest for `{daily}` {from}..{to} ({workdays} workdays)")];

    lines.push(format!(
        "- submissions: {} | participation {}% (was {}%, {})",
        report.stats.submissions,
        report.stats.participation_pct,
        report.previous_stats.participation_pct,
        direction_label(report.trends.participation),
    ));
    lines.push(format!(
        "- items: {} done, {} dropped | completion {}% (was {}%, {})",
        report.stats.items_done,
        report.stats.items_dropped,
        report.stats.completion_pct,
        report.previous_stats.completion_pct,
        direction_label(report.trends.completion),
    ));
    lines.push(format!(
        "- blocker rate: {}% (was {}%, {})",
        report.stats.blocker_pct,
        report.previous_stats.blocker_pct,
        direction_label(report.trends.blockers),
    ));

    if !report.ranking.is_empty() {
        lines.push("ranking:".to_string());
        for ranked in &report.ranking {
            lines.push(format!(
                "  {}. {} score {:.1} ({} done, {} blocker days)",
                ranked.rank,
                ranked.stats.user_id.0,
                ranked.score,
                ranked.stats.items_done,
                ranked.stats.blocker_days,
            ));
        }
    }

    if !report.bottlenecks.is_empty() {
        lines.push("bottlenecks:".to_string());
        for item in &report.bottlenecks {
            lines.push(format!(
                "  - {} ({}): carried {} day(s) since {}",
                item.text, item.user_id.0, item.carry_count, item.created_date,
            ));
        }
    }

    if !report.drop_stats.is_empty() {
        lines.push("high drop rates:".to_string());
        for stat in &report.drop_stats {
            lines.push(format!(
                "  - {}: dropped {}/{} ({}%)",
                stat.user_id.0, stat.dropped, stat.total, stat.drop_pct,
            ));
        }
    }

    lines.join("\n")
}
