use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::{
    Account, AccountId, BalanceHistoryRecord, BudgetId, BudgetLineItem, BudgetMonth,
    BudgetSummary, Cents, GoalAccountLink, GoalId, GoalProgressRecord, Group, GroupId,
    GroupMember, LineItemId, LineItemKind, MonthlyBudget, OneOffBudget, OneOffBudgetId,
    OneOffItem, OneOffItemId, OneOffOption, OneOffOptionId, OwnerRef, Recurrence, RelatedTo,
    SavingsGoal, Transaction, User, UserId, sum_linked_balances,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing high-level operations for the household
/// ledger. This is the primary interface for any client (CLI, API, TUI).
pub struct LedgerService {
    repo: Repository,
}

/// One goal's failure inside a batch recomputation.
#[derive(Debug)]
pub struct RecomputeFailure {
    pub goal_id: GoalId,
    pub error: AppError,
}

/// Outcome of `recompute_all_goals`: per-goal failures are isolated and
/// collected here instead of aborting the batch.
#[derive(Debug, Default)]
pub struct RecomputeReport {
    pub recomputed: Vec<GoalProgressRecord>,
    pub failures: Vec<RecomputeFailure>,
}

impl RecomputeReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Owner operations
    // ========================

    /// Create a new user.
    pub async fn create_user(&self, name: String) -> Result<User, AppError> {
        let user = User::new(name);
        self.repo.save_user(&user).await?;
        Ok(user)
    }

    /// Create a new group.
    pub async fn create_group(&self, name: String) -> Result<Group, AppError> {
        let group = Group::new(name);
        self.repo.save_group(&group).await?;
        Ok(group)
    }

    /// Add a user to a group.
    pub async fn add_group_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<GroupMember, AppError> {
        if !self.repo.group_exists(group_id).await? {
            return Err(AppError::GroupNotFound(group_id.to_string()));
        }
        if !self.repo.user_exists(user_id).await? {
            return Err(AppError::UserNotFound(user_id.to_string()));
        }

        let member = GroupMember::new(group_id, user_id);
        self.repo.save_group_member(&member).await?;
        Ok(member)
    }

    /// Get a user by name.
    pub async fn get_user(&self, name: &str) -> Result<User, AppError> {
        self.repo
            .get_user_by_name(name)
            .await?
            .ok_or_else(|| AppError::UserNotFound(name.to_string()))
    }

    /// Get a group by name.
    pub async fn get_group(&self, name: &str) -> Result<Group, AppError> {
        self.repo
            .get_group_by_name(name)
            .await?
            .ok_or_else(|| AppError::GroupNotFound(name.to_string()))
    }

    /// Reject owner references that don't resolve to an existing user or
    /// group. The XOR half of the invariant is already carried by the
    /// `OwnerRef` variant itself.
    async fn require_owner(&self, owner: OwnerRef) -> Result<(), AppError> {
        if self.repo.owner_exists(owner).await? {
            Ok(())
        } else {
            Err(AppError::InvalidOwner(owner.to_string()))
        }
    }

    // ========================
    // Account operations
    // ========================

    /// Create a new account with an initial balance. The initial balance is
    /// itself the account's first balance history record.
    pub async fn create_account(
        &self,
        owner: OwnerRef,
        name: String,
        initial_balance: Cents,
        shared: bool,
    ) -> Result<Account, AppError> {
        self.require_owner(owner).await?;

        let account = Account::new(name, owner, initial_balance).with_shared(shared);
        self.repo.save_account(&account).await?;
        Ok(account)
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))
    }

    /// Get an account by name.
    pub async fn get_account_by_name(&self, name: &str) -> Result<Account, AppError> {
        self.repo
            .get_account_by_name(name)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(name.to_string()))
    }

    /// List accounts, optionally restricted to one owner.
    pub async fn list_accounts(&self, owner: Option<OwnerRef>) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts(owner).await?)
    }

    /// Get an account's current balance.
    pub async fn get_balance(&self, account_id: AccountId) -> Result<Cents, AppError> {
        Ok(self.get_account(account_id).await?.balance_cents)
    }

    /// Record a transaction against an account. Atomically appends the
    /// transaction, applies the signed amount to the account's balance, and
    /// appends the dependent history snapshot; partial application is never
    /// observable. Returns the committed transaction.
    pub async fn record_transaction(
        &self,
        account_id: AccountId,
        amount_cents: Cents,
        category: String,
        date: DateTime<Utc>,
        related_to: Option<RelatedTo>,
    ) -> Result<Transaction, AppError> {
        // Existence check up front so a missing account surfaces as a
        // specific error, not a database failure mid-commit.
        self.get_account(account_id).await?;

        let mut transaction = Transaction::new(account_id, amount_cents, category, date);
        if let Some(related) = related_to {
            transaction = transaction.with_related_to(related);
        }

        self.repo.record_transaction(&transaction).await?;
        Ok(transaction)
    }

    /// Explicitly edit an account's balance. A history snapshot is appended
    /// only when the balance actually changes. Returns true if it did.
    pub async fn set_balance(
        &self,
        account_id: AccountId,
        new_balance: Cents,
    ) -> Result<bool, AppError> {
        self.get_account(account_id).await?;
        Ok(self.repo.set_balance(account_id, new_balance).await?)
    }

    /// Delete an account, cascading to its history, transactions, and goal
    /// links. Budget line items that referenced it are detached.
    pub async fn delete_account(&self, account_id: AccountId) -> Result<(), AppError> {
        self.get_account(account_id).await?;
        self.repo.delete_account(account_id).await?;
        Ok(())
    }

    /// List an account's transactions, oldest first.
    pub async fn list_transactions(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<Transaction>, AppError> {
        Ok(self.repo.list_transactions(account_id).await?)
    }

    /// List an account's balance history, oldest first.
    pub async fn list_balance_history(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<BalanceHistoryRecord>, AppError> {
        Ok(self.repo.list_balance_history(account_id).await?)
    }

    // ========================
    // Savings goal operations
    // ========================

    /// Create a new savings goal.
    pub async fn create_goal(
        &self,
        owner: OwnerRef,
        name: String,
        target_cents: Cents,
        start_date: DateTime<Utc>,
        target_date: DateTime<Utc>,
    ) -> Result<SavingsGoal, AppError> {
        self.require_owner(owner).await?;

        let goal = SavingsGoal::new(name, owner, target_cents, start_date, target_date);
        self.repo.save_goal(&goal).await?;
        Ok(goal)
    }

    /// Get a goal by ID.
    pub async fn get_goal(&self, id: GoalId) -> Result<SavingsGoal, AppError> {
        self.repo.get_goal(id).await?.ok_or(AppError::GoalNotFound(id))
    }

    /// List all goals.
    pub async fn list_goals(&self) -> Result<Vec<SavingsGoal>, AppError> {
        Ok(self.repo.list_goals().await?)
    }

    /// Link an account to a goal it funds.
    pub async fn link_account_to_goal(
        &self,
        goal_id: GoalId,
        account_id: AccountId,
    ) -> Result<GoalAccountLink, AppError> {
        self.get_goal(goal_id).await?;
        self.get_account(account_id).await?;

        let link = GoalAccountLink::new(goal_id, account_id);
        self.repo.save_goal_link(&link).await?;
        Ok(link)
    }

    /// Unlink an account from a goal.
    pub async fn unlink_account_from_goal(
        &self,
        goal_id: GoalId,
        account_id: AccountId,
    ) -> Result<(), AppError> {
        self.get_goal(goal_id).await?;
        self.repo.delete_goal_link(goal_id, account_id).await?;
        Ok(())
    }

    /// Recompute one goal's progress: sum the current balances of its
    /// linked accounts, append exactly one progress snapshot, and return the
    /// sum. A goal with no linked accounts records 0, not an error; a link
    /// to an account that no longer exists is an error.
    pub async fn recompute_goal(&self, goal_id: GoalId) -> Result<Cents, AppError> {
        Ok(self.append_goal_progress(goal_id).await?.amount_cents)
    }

    async fn append_goal_progress(
        &self,
        goal_id: GoalId,
    ) -> Result<GoalProgressRecord, AppError> {
        self.get_goal(goal_id).await?;

        let account_ids = self.repo.list_goal_account_ids(goal_id).await?;
        let mut balances = Vec::with_capacity(account_ids.len());
        for account_id in account_ids {
            let account = self
                .repo
                .get_account(account_id)
                .await?
                .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))?;
            balances.push(account.balance_cents);
        }

        let amount = sum_linked_balances(&balances);
        let record = GoalProgressRecord::new(goal_id, amount);
        self.repo.save_goal_progress(&record).await?;
        Ok(record)
    }

    /// Recompute every goal's progress. Each call always appends fresh
    /// snapshots, so it is safe to run on a schedule or on demand. One
    /// goal's failure is collected and the batch continues; a completed
    /// goal's record stands even if a later goal fails.
    pub async fn recompute_all_goals(&self) -> Result<RecomputeReport, AppError> {
        let goals = self.repo.list_goals().await?;
        info!(goals = goals.len(), "recomputing savings goal progress");

        let mut report = RecomputeReport::default();
        for goal in goals {
            match self.append_goal_progress(goal.id).await {
                Ok(record) => {
                    info!(goal = %goal.id, amount = record.amount_cents, "goal progress recorded");
                    report.recomputed.push(record);
                }
                Err(error) => {
                    warn!(goal = %goal.id, %error, "goal recomputation failed");
                    report.failures.push(RecomputeFailure {
                        goal_id: goal.id,
                        error: AppError::RecomputationFailed {
                            goal_id: goal.id,
                            source: Box::new(error),
                        },
                    });
                }
            }
        }

        Ok(report)
    }

    /// List a goal's progress history, oldest first.
    pub async fn list_goal_progress(
        &self,
        goal_id: GoalId,
    ) -> Result<Vec<GoalProgressRecord>, AppError> {
        self.get_goal(goal_id).await?;
        Ok(self.repo.list_goal_progress(goal_id).await?)
    }

    // ========================
    // Monthly budget operations
    // ========================

    /// Create a monthly budget for an owner. Each owner has at most one
    /// budget per month.
    pub async fn create_budget(
        &self,
        owner: OwnerRef,
        month: BudgetMonth,
    ) -> Result<MonthlyBudget, AppError> {
        self.require_owner(owner).await?;

        if self
            .repo
            .get_budget_by_owner_month(owner, month)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateBudget { owner, month });
        }

        let budget = MonthlyBudget::new(owner, month);
        self.repo.save_budget(&budget).await?;
        Ok(budget)
    }

    /// Get a budget by ID.
    pub async fn get_budget(&self, id: BudgetId) -> Result<MonthlyBudget, AppError> {
        self.repo
            .get_budget(id)
            .await?
            .ok_or(AppError::BudgetNotFound(id))
    }

    /// Add a line item to a budget.
    pub async fn add_line_item(
        &self,
        budget_id: BudgetId,
        kind: LineItemKind,
        category: String,
        account_id: Option<AccountId>,
        amount_cents: Cents,
        recurrence: Option<Recurrence>,
    ) -> Result<BudgetLineItem, AppError> {
        self.get_budget(budget_id).await?;
        if let Some(account_id) = account_id {
            self.get_account(account_id).await?;
        }

        let mut item = BudgetLineItem::new(budget_id, kind, category, amount_cents);
        if let Some(account_id) = account_id {
            item = item.with_account(account_id);
        }
        if let Some(recurrence) = recurrence {
            item = item.with_recurrence(recurrence);
        }

        self.repo.save_line_item(&item).await?;
        Ok(item)
    }

    /// Remove a line item from its budget.
    pub async fn remove_line_item(&self, id: LineItemId) -> Result<(), AppError> {
        if !self.repo.delete_line_item(id).await? {
            return Err(AppError::LineItemNotFound(id));
        }
        Ok(())
    }

    /// List a budget's line items, oldest first.
    pub async fn list_line_items(
        &self,
        budget_id: BudgetId,
    ) -> Result<Vec<BudgetLineItem>, AppError> {
        self.get_budget(budget_id).await?;
        Ok(self.repo.list_line_items(budget_id).await?)
    }

    /// Compute a budget's summary on demand from its line items. Totals
    /// are 0 when no items exist; the personal remainder may be negative.
    pub async fn summarize_budget(&self, budget_id: BudgetId) -> Result<BudgetSummary, AppError> {
        self.get_budget(budget_id).await?;
        Ok(self.repo.summarize_budget(budget_id).await?)
    }

    // ========================
    // One-off budget operations
    // ========================

    /// Create a one-off budget, optionally funded by a savings goal.
    pub async fn create_oneoff_budget(
        &self,
        owner: OwnerRef,
        name: String,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        goal_id: Option<GoalId>,
    ) -> Result<OneOffBudget, AppError> {
        self.require_owner(owner).await?;
        if let Some(goal_id) = goal_id {
            self.get_goal(goal_id).await?;
        }

        let mut budget = OneOffBudget::new(name, owner, start_date, end_date);
        if let Some(goal_id) = goal_id {
            budget = budget.with_goal(goal_id);
        }

        self.repo.save_oneoff_budget(&budget).await?;
        Ok(budget)
    }

    /// Get a one-off budget by ID.
    pub async fn get_oneoff_budget(&self, id: OneOffBudgetId) -> Result<OneOffBudget, AppError> {
        self.repo
            .get_oneoff_budget(id)
            .await?
            .ok_or(AppError::OneOffBudgetNotFound(id))
    }

    /// Add an item to a one-off budget.
    pub async fn add_oneoff_item(
        &self,
        budget_id: OneOffBudgetId,
        name: String,
        category: String,
    ) -> Result<OneOffItem, AppError> {
        self.get_oneoff_budget(budget_id).await?;

        let item = OneOffItem::new(budget_id, name, category);
        self.repo.save_oneoff_item(&item).await?;
        Ok(item)
    }

    /// Add a priced option to a one-off item.
    pub async fn add_oneoff_option(
        &self,
        item_id: OneOffItemId,
        label: String,
        price_cents: Cents,
    ) -> Result<OneOffOption, AppError> {
        self.repo
            .get_oneoff_item(item_id)
            .await?
            .ok_or(AppError::OneOffItemNotFound(item_id))?;

        let option = OneOffOption::new(item_id, label, price_cents);
        self.repo.save_oneoff_option(&option).await?;
        Ok(option)
    }

    /// Select one option for an item, deselecting any other. At most one
    /// option per item is selected at any time.
    pub async fn select_oneoff_option(&self, option_id: OneOffOptionId) -> Result<(), AppError> {
        let option = self
            .repo
            .get_oneoff_option(option_id)
            .await?
            .ok_or(AppError::OneOffOptionNotFound(option_id))?;

        self.repo.select_option(option.item_id, option_id).await?;
        Ok(())
    }

    /// List a one-off budget's items.
    pub async fn list_oneoff_items(
        &self,
        budget_id: OneOffBudgetId,
    ) -> Result<Vec<OneOffItem>, AppError> {
        self.get_oneoff_budget(budget_id).await?;
        Ok(self.repo.list_oneoff_items(budget_id).await?)
    }

    /// List an item's options.
    pub async fn list_item_options(
        &self,
        item_id: OneOffItemId,
    ) -> Result<Vec<OneOffOption>, AppError> {
        self.repo
            .get_oneoff_item(item_id)
            .await?
            .ok_or(AppError::OneOffItemNotFound(item_id))?;
        Ok(self.repo.list_item_options(item_id).await?)
    }
}
