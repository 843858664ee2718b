use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, OwnerRef};

pub type AccountId = Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub owner: OwnerRef,
    /// Current balance, maintained by the ledger: every committed transaction
    /// and explicit balance edit is reflected here exactly once.
    pub balance_cents: Cents,
    /// Whether the account is visible to all members of the owning group.
    pub shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: String, owner: OwnerRef, initial_balance: Cents) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            owner,
            balance_cents: initial_balance,
            shared: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }
}

/// An immutable snapshot of an account balance at a point in time.
/// One is appended at account creation and one per balance-changing event;
/// records are never updated and only removed by a full account cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceHistoryRecord {
    pub id: Uuid,
    pub account_id: AccountId,
    pub balance_cents: Cents,
    pub recorded_at: DateTime<Utc>,
}

impl BalanceHistoryRecord {
    pub fn new(account_id: AccountId, balance_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            balance_cents,
            recorded_at: Utc::now(),
        }
    }
}

/// Change-detection guard for balance history: a new snapshot is appended
/// only when the balance actually moved, so no-op updates leave no trace.
pub fn balance_changed(previous: Option<Cents>, new_balance: Cents) -> bool {
    previous != Some(new_balance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_balances() {
        let owner = OwnerRef::User(Uuid::new_v4());
        let account = Account::new("Checking".into(), owner, 10_000);
        assert_eq!(account.balance_cents, 10_000);
        assert!(!account.shared);
    }

    #[test]
    fn test_balance_changed_detects_movement() {
        assert!(balance_changed(Some(5000), 5001));
        assert!(balance_changed(None, 0));
        assert!(!balance_changed(Some(5000), 5000));
    }
}
