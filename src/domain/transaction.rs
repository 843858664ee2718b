use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Cents};

pub type TransactionId = Uuid;

/// The business event that caused a transaction, when one exists.
/// A typed variant instead of a free-form (type, id) column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "id")]
pub enum RelatedTo {
    Expense(Uuid),
    Income(Uuid),
    SavingsAllocation(Uuid),
    OneOffItem(Uuid),
}

impl RelatedTo {
    pub fn kind(&self) -> &'static str {
        match self {
            RelatedTo::Expense(_) => "expense",
            RelatedTo::Income(_) => "income",
            RelatedTo::SavingsAllocation(_) => "savings_allocation",
            RelatedTo::OneOffItem(_) => "oneoff_item",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            RelatedTo::Expense(id)
            | RelatedTo::Income(id)
            | RelatedTo::SavingsAllocation(id)
            | RelatedTo::OneOffItem(id) => *id,
        }
    }

    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "expense" => Some(RelatedTo::Expense(id)),
            "income" => Some(RelatedTo::Income(id)),
            "savings_allocation" => Some(RelatedTo::SavingsAllocation(id)),
            "oneoff_item" => Some(RelatedTo::OneOffItem(id)),
            _ => None,
        }
    }
}

/// A ledger entry against a single account. Amounts are signed:
/// positive is a credit, negative a debit. Transactions are immutable;
/// every committed transaction has been reflected in its account's
/// balance exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub amount_cents: Cents,
    pub category: String,
    /// When the transaction occurred in the real world
    pub date: DateTime<Utc>,
    /// When we recorded it in the ledger
    pub recorded_at: DateTime<Utc>,
    pub related_to: Option<RelatedTo>,
}

impl Transaction {
    pub fn new(
        account_id: AccountId,
        amount_cents: Cents,
        category: String,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            amount_cents,
            category,
            date,
            recorded_at: Utc::now(),
            related_to: None,
        }
    }

    pub fn with_related_to(mut self, related_to: RelatedTo) -> Self {
        self.related_to = Some(related_to);
        self
    }

    pub fn is_credit(&self) -> bool {
        self.amount_cents > 0
    }
}

/// Replay a transaction log over an initial balance.
/// The ledger invariant: current balance = initial + sum of amounts.
pub fn replay_balance(initial_balance: Cents, transactions: &[Transaction]) -> Cents {
    transactions
        .iter()
        .fold(initial_balance, |balance, tx| balance + tx.amount_cents)
}
