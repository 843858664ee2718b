use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, GoalId, OwnerRef};

pub type OneOffBudgetId = Uuid;
pub type OneOffItemId = Uuid;
pub type OneOffOptionId = Uuid;

/// A bounded-duration budget (a trip, a renovation) with its own items,
/// optionally funded by a savings goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneOffBudget {
    pub id: OneOffBudgetId,
    pub name: String,
    pub owner: OwnerRef,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub goal_id: Option<GoalId>,
    pub created_at: DateTime<Utc>,
}

impl OneOffBudget {
    pub fn new(
        name: String,
        owner: OwnerRef,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            owner,
            start_date,
            end_date,
            goal_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_goal(mut self, goal_id: GoalId) -> Self {
        self.goal_id = Some(goal_id);
        self
    }
}

/// One thing to buy or book within a one-off budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneOffItem {
    pub id: OneOffItemId,
    pub budget_id: OneOffBudgetId,
    pub name: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl OneOffItem {
    pub fn new(budget_id: OneOffBudgetId, name: String, category: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            budget_id,
            name,
            category,
            created_at: Utc::now(),
        }
    }
}

/// A priced alternative for an item (e.g. two hotel offers).
/// At most one option per item is selected at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneOffOption {
    pub id: OneOffOptionId,
    pub item_id: OneOffItemId,
    pub label: String,
    pub price_cents: Cents,
    pub selected: bool,
    pub created_at: DateTime<Utc>,
}

impl OneOffOption {
    pub fn new(item_id: OneOffItemId, label: String, price_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            label,
            price_cents,
            selected: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_starts_unselected() {
        let option = OneOffOption::new(Uuid::new_v4(), "Hotel A".into(), 45_000);
        assert!(!option.selected);
    }

    #[test]
    fn test_budget_goal_link() {
        let owner = OwnerRef::User(Uuid::new_v4());
        let goal = Uuid::new_v4();
        let budget = OneOffBudget::new("Trip".into(), owner, Utc::now(), Utc::now())
            .with_goal(goal);
        assert_eq!(budget.goal_id, Some(goal));
    }
}
