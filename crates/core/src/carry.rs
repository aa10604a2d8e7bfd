//! Work-item carry chain.
//!
//! A day's `today_plans` is carried-items-first followed by new plans, so
//! the next day's pre-fill is just the previous submission's plan list.
//! Dispositions resolve each pre-filled item into done, continue, or drop;
//! anything the user leaves unmentioned continues by default.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::submission::Submission;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Done,
    /// Deliberate default: an item with no stated disposition keeps rolling
    /// forward rather than silently disappearing.
    #[default]
    Continue,
    Drop,
}

/// Pre-fill list for the next day's form: the previous day's still-open
/// items followed by its newly stated plans, de-duplicated in order.
pub fn build_carry_chain(previous: &Submission) -> Vec<String> {
    dedup_in_order(previous.today_plans.iter().cloned())
}

/// Per-item outcome of one day's dispositions over the pre-filled chain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CarryResolution {
    pub done: Vec<String>,
    pub dropped: Vec<String>,
    pub continued: Vec<String>,
    pub new_plans: Vec<String>,
}

impl CarryResolution {
    /// Plan list to store on the submission: continued items keep their
    /// chain order, new plans append after.
    pub fn today_plans(&self) -> Vec<String> {
        let mut plans = self.continued.clone();
        plans.extend(self.new_plans.iter().cloned());
        plans
    }
}

pub fn resolve(
    prefilled: &[String],
    dispositions: &HashMap<String, Disposition>,
    new_plans: &[String],
) -> CarryResolution {
    let mut resolution = CarryResolution::default();

    for item in dedup_in_order(prefilled.iter().cloned()) {
        match dispositions.get(&item).copied().unwrap_or_default() {
            Disposition::Done => resolution.done.push(item),
            Disposition::Drop => resolution.dropped.push(item),
            Disposition::Continue => resolution.continued.push(item),
        }
    }

    // A "new" plan whose text matches a continued item is the same logical
    // item, not a second one.
    for plan in dedup_in_order(new_plans.iter().cloned()) {
        let text = plan.trim();
        if text.is_empty() || resolution.continued.iter().any(|item| item == text) {
            continue;
        }
        resolution.new_plans.push(text.to_string());
    }

    resolution
}

fn dedup_in_order(items: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    seen
}
