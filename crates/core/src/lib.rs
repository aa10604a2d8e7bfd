pub mod analytics;
pub mod carry;
pub mod config;
pub mod domain;
pub mod errors;
pub mod localtime;
pub mod scheduler;

pub use carry::{build_carry_chain, resolve, CarryResolution, Disposition};
pub use domain::ooo::{OooId, OooRecord};
pub use domain::participant::{DailyName, Participant, ScheduleName, UserId};
pub use domain::prompt::Prompt;
pub use domain::submission::Submission;
pub use domain::timezone::TimezoneOffset;
pub use domain::work_item::{WorkItem, WorkItemId, WorkItemStatus};
pub use errors::DomainError;
pub use localtime::{LocalTimeOfDay, LocalTimestamp, WeekdayCode};
pub use scheduler::{PromptCheck, PromptDecision, SkipReason};

// Re-export so downstream crates agree on the chrono version.
pub use chrono;
