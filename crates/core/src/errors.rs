use thiserror::Error;

use crate::domain::work_item::WorkItemStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid work item transition from {from:?} to {to:?}")]
    InvalidItemTransition { from: WorkItemStatus, to: WorkItemStatus },
}
