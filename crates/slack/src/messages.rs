//! Message rendering. All formatting is pure so it can be unit tested and
//! reused by the CLI report output.

use huddle_core::domain::submission::Submission;

const REMINDER_VARIANTS: &[&str] = &[
    "Time for your standup update!",
    "Your daily update is waiting.",
    "Quick check-in: how is the day going?",
];

/// Reminder text for a prompt `minutes_late` past the scheduled time. The
/// `pick` index rotates wording between sends so repeated nudges read less
/// robotic.
pub fn reminder_text(minutes_late: u32, pick: usize) -> String {
    let variant = REMINDER_VARIANTS[pick % REMINDER_VARIANTS.len()];
    if minutes_late >= 60 {
        format!("{variant} The standup window is closing soon.")
    } else {
        variant.to_string()
    }
}

/// Plain-text rendering of a submission for the channel post.
pub fn format_submission(submission: &Submission) -> String {
    let mut out = format!("*<@{}>* — {}\n", submission.user_id.0, submission.date);

    push_section(&mut out, "Done", &submission.done_items);
    push_section(&mut out, "Not done", &submission.undone_items);
    push_section(&mut out, "Unplanned", &submission.unplanned_items);
    push_section(&mut out, "Today", &submission.today_plans);

    if !submission.blockers.trim().is_empty() {
        out.push_str(&format!(":warning: *Blockers:* {}\n", submission.blockers.trim()));
    }

    out.trim_end().to_string()
}

fn push_section(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("*{title}:*\n"));
    for item in items {
        out.push_str(&format!("• {item}\n"));
    }
}
