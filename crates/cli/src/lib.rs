pub mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "huddle",
    about = "Huddle operator CLI",
    long_about = "Operate huddle migrations, config inspection, readiness checks, and digest reports.",
    after_help = "Examples:\n  huddle doctor --json\n  huddle config\n  huddle report --daily platform --from 2026-03-02 --to 2026-03-06"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config,
    #[command(about = "Validate config and database connectivity checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Hide a work item from bottleneck reports for a number of days")]
    Snooze {
        #[arg(long, help = "Work item id")]
        item: String,
        #[arg(long, help = "Days from today to keep the item hidden")]
        days: u32,
    },
    #[command(about = "Print the digest report for a daily over a date range")]
    Report {
        #[arg(long, help = "Daily name as configured under [dailies]")]
        daily: String,
        #[arg(long, help = "First day of the period (YYYY-MM-DD)")]
        from: NaiveDate,
        #[arg(long, help = "Last day of the period, inclusive (YYYY-MM-DD)")]
        to: NaiveDate,
        #[arg(long, help = "Override the workday count derived from the schedule")]
        workdays: Option<u32>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Snooze { item, days } => commands::snooze::run(&item, days),
        Command::Report { daily, from, to, workdays } => {
            commands::report::run(&daily, from, to, workdays)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
