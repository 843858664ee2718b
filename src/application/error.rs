use thiserror::Error;
use uuid::Uuid;

use crate::domain::{BudgetMonth, OwnerRef};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid owner reference: {0}")]
    InvalidOwner(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Budget not found: {0}")]
    BudgetNotFound(Uuid),

    #[error("Goal not found: {0}")]
    GoalNotFound(Uuid),

    #[error("Line item not found: {0}")]
    LineItemNotFound(Uuid),

    #[error("One-off budget not found: {0}")]
    OneOffBudgetNotFound(Uuid),

    #[error("One-off item not found: {0}")]
    OneOffItemNotFound(Uuid),

    #[error("One-off option not found: {0}")]
    OneOffOptionNotFound(Uuid),

    #[error("Budget already exists for {owner} in {month}")]
    DuplicateBudget { owner: OwnerRef, month: BudgetMonth },

    #[error("Recomputation of goal {goal_id} failed: {source}")]
    RecomputationFailed {
        goal_id: Uuid,
        #[source]
        source: Box<AppError>,
    },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
