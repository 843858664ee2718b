use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Cents, OwnerRef};

pub type BudgetId = Uuid;
pub type LineItemId = Uuid;

/// A calendar month, the period a monthly budget covers.
/// Rendered as "YYYY-MM"; each owner has at most one budget per month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BudgetMonth {
    pub year: i32,
    pub month: u32,
}

impl BudgetMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let (year, month) = s.split_once('-')?;
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }
}

impl std::fmt::Display for BudgetMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
    Income,
    Expense,
    SavingsAllocation,
}

impl LineItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineItemKind::Income => "income",
            LineItemKind::Expense => "expense",
            LineItemKind::SavingsAllocation => "savings_allocation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "income" => Some(LineItemKind::Income),
            "expense" => Some(LineItemKind::Expense),
            "savings_allocation" => Some(LineItemKind::SavingsAllocation),
            _ => None,
        }
    }
}

impl std::fmt::Display for LineItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How often a line item repeats. Custom carries the interval in months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "interval")]
pub enum Recurrence {
    Monthly,
    Quarterly,
    Biannual,
    Annual,
    Custom { interval_months: u32 },
}

impl Recurrence {
    pub fn kind(&self) -> &'static str {
        match self {
            Recurrence::Monthly => "monthly",
            Recurrence::Quarterly => "quarterly",
            Recurrence::Biannual => "biannual",
            Recurrence::Annual => "annual",
            Recurrence::Custom { .. } => "custom",
        }
    }

    /// The custom interval, when there is one. None for the fixed kinds.
    pub fn interval_months(&self) -> Option<u32> {
        match self {
            Recurrence::Custom { interval_months } => Some(*interval_months),
            _ => None,
        }
    }

    /// Reassemble from persisted (kind, interval) parts.
    /// A custom recurrence requires a positive interval.
    pub fn from_parts(kind: &str, interval: Option<u32>) -> Option<Self> {
        match kind {
            "monthly" => Some(Recurrence::Monthly),
            "quarterly" => Some(Recurrence::Quarterly),
            "biannual" => Some(Recurrence::Biannual),
            "annual" => Some(Recurrence::Annual),
            "custom" => match interval {
                Some(interval_months) if interval_months > 0 => {
                    Some(Recurrence::Custom { interval_months })
                }
                _ => None,
            },
            _ => None,
        }
    }
}

/// A recurring monthly budget for one owner. Totals are never stored:
/// they are always computed on demand from the line items, so there is
/// no staleness window to invalidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyBudget {
    pub id: BudgetId,
    pub owner: OwnerRef,
    pub month: BudgetMonth,
    pub created_at: DateTime<Utc>,
}

impl MonthlyBudget {
    pub fn new(owner: OwnerRef, month: BudgetMonth) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            month,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetLineItem {
    pub id: LineItemId,
    pub budget_id: BudgetId,
    pub kind: LineItemKind,
    pub category: String,
    /// The account this item draws from or pays into, when known.
    pub account_id: Option<AccountId>,
    pub amount_cents: Cents,
    pub recurrence: Option<Recurrence>,
    pub created_at: DateTime<Utc>,
}

impl BudgetLineItem {
    pub fn new(budget_id: BudgetId, kind: LineItemKind, category: String, amount_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            budget_id,
            kind,
            category,
            account_id: None,
            amount_cents,
            recurrence: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }
}

/// Derived totals for one budget period. `personal_remainder` is what is
/// left after expenses and savings; it may be negative (overspend) and is
/// reported as such, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub total_income: Cents,
    pub total_expenses: Cents,
    pub total_savings: Cents,
    pub personal_remainder: Cents,
}

/// Compute a budget summary from its line items.
/// Each total is 0 when no items of that kind exist; absence never
/// propagates as a missing value through the arithmetic.
pub fn summarize_items(items: &[BudgetLineItem]) -> BudgetSummary {
    let mut total_income = 0;
    let mut total_expenses = 0;
    let mut total_savings = 0;

    for item in items {
        match item.kind {
            LineItemKind::Income => total_income += item.amount_cents,
            LineItemKind::Expense => total_expenses += item.amount_cents,
            LineItemKind::SavingsAllocation => total_savings += item.amount_cents,
        }
    }

    BudgetSummary {
        total_income,
        total_expenses,
        total_savings,
        personal_remainder: total_income - total_expenses - total_savings,
    }
}
