use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Cents, OwnerRef};

pub type GoalId = Uuid;

/// A savings target funded by one or more linked accounts.
/// The current amount is derived: it is the sum of the linked accounts'
/// balances at the time of the last recomputation, never stored on the goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: GoalId,
    pub name: String,
    pub owner: OwnerRef,
    pub target_cents: Cents,
    pub start_date: DateTime<Utc>,
    pub target_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SavingsGoal {
    pub fn new(
        name: String,
        owner: OwnerRef,
        target_cents: Cents,
        start_date: DateTime<Utc>,
        target_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            owner,
            target_cents,
            start_date,
            target_date,
            created_at: Utc::now(),
        }
    }
}

/// An immutable progress snapshot, appended once per recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalProgressRecord {
    pub id: Uuid,
    pub goal_id: GoalId,
    pub amount_cents: Cents,
    pub recorded_at: DateTime<Utc>,
}

impl GoalProgressRecord {
    pub fn new(goal_id: GoalId, amount_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal_id,
            amount_cents,
            recorded_at: Utc::now(),
        }
    }
}

/// Links an account to a goal it funds. Many-to-many: an account can fund
/// several goals, a goal can draw on several accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalAccountLink {
    pub goal_id: GoalId,
    pub account_id: AccountId,
    pub linked_at: DateTime<Utc>,
}

impl GoalAccountLink {
    pub fn new(goal_id: GoalId, account_id: AccountId) -> Self {
        Self {
            goal_id,
            account_id,
            linked_at: Utc::now(),
        }
    }
}

/// Sum linked account balances into the goal's current amount.
/// A goal with no linked accounts is simply at 0, not an error.
pub fn sum_linked_balances(balances: &[Cents]) -> Cents {
    balances.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_linked_balances() {
        assert_eq!(sum_linked_balances(&[10_000, 25_050]), 35_050);
    }

    #[test]
    fn test_sum_of_no_links_is_zero() {
        assert_eq!(sum_linked_balances(&[]), 0);
    }

    #[test]
    fn test_sum_tolerates_negative_balances() {
        assert_eq!(sum_linked_balances(&[10_000, -2_500]), 7_500);
    }
}
