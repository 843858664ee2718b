use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, BalanceHistoryRecord, BudgetId, BudgetLineItem, BudgetMonth,
    BudgetSummary, Cents, GoalAccountLink, GoalId, GoalProgressRecord, Group, GroupId,
    GroupMember, LineItemId, LineItemKind, MonthlyBudget, OneOffBudget, OneOffBudgetId,
    OneOffItem, OneOffItemId, OneOffOption, OneOffOptionId, OwnerRef, Recurrence, RelatedTo,
    SavingsGoal, Transaction, User, UserId,
};

use super::{MIGRATION_001_INITIAL, MIGRATION_002_BUDGETS, MIGRATION_003_GOALS, MIGRATION_004_ONEOFF};

/// Repository for persisting and querying the household ledger.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        for (name, sql) in [
            ("001", MIGRATION_001_INITIAL),
            ("002", MIGRATION_002_BUDGETS),
            ("003", MIGRATION_003_GOALS),
            ("004", MIGRATION_004_ONEOFF),
        ] {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to run migration {}", name))?;
        }
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Owner operations
    // ========================

    /// Save a new user.
    pub async fn save_user(&self, user: &User) -> Result<()> {
        sqlx::query("INSERT INTO users (id, name, created_at) VALUES (?, ?, ?)")
            .bind(user.id.to_string())
            .bind(&user.name)
            .bind(user.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to save user")?;
        Ok(())
    }

    /// Save a new group.
    pub async fn save_group(&self, group: &Group) -> Result<()> {
        sqlx::query("INSERT INTO groups (id, name, created_at) VALUES (?, ?, ?)")
            .bind(group.id.to_string())
            .bind(&group.name)
            .bind(group.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to save group")?;
        Ok(())
    }

    /// Save a group membership.
    pub async fn save_group_member(&self, member: &GroupMember) -> Result<()> {
        sqlx::query(
            "INSERT INTO group_members (group_id, user_id, joined_at) VALUES (?, ?, ?)",
        )
        .bind(member.group_id.to_string())
        .bind(member.user_id.to_string())
        .bind(member.joined_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save group member")?;
        Ok(())
    }

    /// Get a user by name.
    pub async fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, name, created_at FROM users WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a group by name.
    pub async fn get_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        let row = sqlx::query("SELECT id, name, created_at FROM groups WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch group by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_group(&row)?)),
            None => Ok(None),
        }
    }

    /// Check that an owner reference resolves to an existing row of its kind.
    pub async fn owner_exists(&self, owner: OwnerRef) -> Result<bool> {
        let (table, id) = match owner {
            OwnerRef::User(id) => ("users", id),
            OwnerRef::Group(id) => ("groups", id),
        };

        let query = format!("SELECT COUNT(*) as count FROM {} WHERE id = ?", table);
        let count: i64 = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to resolve owner reference")?
            .get("count");

        Ok(count > 0)
    }

    /// Check that a user exists by id.
    pub async fn user_exists(&self, id: UserId) -> Result<bool> {
        self.owner_exists(OwnerRef::User(id)).await
    }

    /// Check that a group exists by id.
    pub async fn group_exists(&self, id: GroupId) -> Result<bool> {
        self.owner_exists(OwnerRef::Group(id)).await
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id_str: String = row.get("id");
        Ok(User {
            id: Uuid::parse_str(&id_str).context("Invalid user ID")?,
            name: row.get("name"),
            created_at: Self::parse_timestamp(row.get("created_at"))?,
        })
    }

    fn row_to_group(row: &sqlx::sqlite::SqliteRow) -> Result<Group> {
        let id_str: String = row.get("id");
        Ok(Group {
            id: Uuid::parse_str(&id_str).context("Invalid group ID")?,
            name: row.get("name"),
            created_at: Self::parse_timestamp(row.get("created_at"))?,
        })
    }

    // ========================
    // Account operations
    // ========================

    /// Save a new account together with its first balance history record.
    /// Both rows land in one transaction: an account is never observable
    /// without its initial snapshot.
    pub async fn save_account(&self, account: &Account) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO accounts (id, name, owner_type, owner_id, balance_cents, shared, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.name)
        .bind(account.owner.kind())
        .bind(account.owner.id().to_string())
        .bind(account.balance_cents)
        .bind(account.shared)
        .bind(account.created_at.to_rfc3339())
        .bind(account.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to save account")?;

        let record = BalanceHistoryRecord::new(account.id, account.balance_cents);
        Self::insert_history(&mut tx, &record).await?;

        tx.commit().await.context("Failed to commit account creation")?;
        Ok(())
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, owner_type, owner_id, balance_cents, shared, created_at, updated_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// Get an account by name.
    pub async fn get_account_by_name(&self, name: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, owner_type, owner_id, balance_cents, shared, created_at, updated_at
            FROM accounts
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by name")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// List accounts, optionally restricted to one owner.
    pub async fn list_accounts(&self, owner: Option<OwnerRef>) -> Result<Vec<Account>> {
        let rows = match owner {
            Some(owner) => {
                sqlx::query(
                    r#"
                    SELECT id, name, owner_type, owner_id, balance_cents, shared, created_at, updated_at
                    FROM accounts
                    WHERE owner_type = ? AND owner_id = ?
                    ORDER BY name
                    "#,
                )
                .bind(owner.kind())
                .bind(owner.id().to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, name, owner_type, owner_id, balance_cents, shared, created_at, updated_at
                    FROM accounts
                    ORDER BY name
                    "#,
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// Record a transaction and apply it to its account as one indivisible
    /// unit: the transaction row, the balance update, and the dependent
    /// history snapshot commit together or not at all.
    /// Returns the account's new balance.
    pub async fn record_transaction(&self, transaction: &Transaction) -> Result<Cents> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let row = sqlx::query("SELECT balance_cents FROM accounts WHERE id = ?")
            .bind(transaction.account_id.to_string())
            .fetch_one(&mut *tx)
            .await
            .context("Failed to read account balance")?;
        let old_balance: Cents = row.get("balance_cents");
        let new_balance = old_balance + transaction.amount_cents;

        sqlx::query(
            r#"
            INSERT INTO transactions (id, account_id, amount_cents, category, date, recorded_at, related_type, related_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transaction.id.to_string())
        .bind(transaction.account_id.to_string())
        .bind(transaction.amount_cents)
        .bind(&transaction.category)
        .bind(transaction.date.to_rfc3339())
        .bind(transaction.recorded_at.to_rfc3339())
        .bind(transaction.related_to.map(|r| r.kind()))
        .bind(transaction.related_to.map(|r| r.id().to_string()))
        .execute(&mut *tx)
        .await
        .context("Failed to save transaction")?;

        sqlx::query("UPDATE accounts SET balance_cents = ?, updated_at = ? WHERE id = ?")
            .bind(new_balance)
            .bind(Utc::now().to_rfc3339())
            .bind(transaction.account_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to update account balance")?;

        // Change-detection guard: a zero-amount transaction leaves the
        // balance untouched and gets no duplicate snapshot.
        if crate::domain::balance_changed(Some(old_balance), new_balance) {
            let record = BalanceHistoryRecord::new(transaction.account_id, new_balance);
            Self::insert_history(&mut tx, &record).await?;
        }

        tx.commit().await.context("Failed to commit transaction")?;
        Ok(new_balance)
    }

    /// Explicitly set an account's balance (a balance edit outside the
    /// transaction log). Appends a history snapshot only when the balance
    /// actually changes. Returns true if it did.
    pub async fn set_balance(&self, account_id: AccountId, new_balance: Cents) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let row = sqlx::query("SELECT balance_cents FROM accounts WHERE id = ?")
            .bind(account_id.to_string())
            .fetch_one(&mut *tx)
            .await
            .context("Failed to read account balance")?;
        let old_balance: Cents = row.get("balance_cents");

        if !crate::domain::balance_changed(Some(old_balance), new_balance) {
            tx.commit().await.context("Failed to commit balance edit")?;
            return Ok(false);
        }

        sqlx::query("UPDATE accounts SET balance_cents = ?, updated_at = ? WHERE id = ?")
            .bind(new_balance)
            .bind(Utc::now().to_rfc3339())
            .bind(account_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to update account balance")?;

        let record = BalanceHistoryRecord::new(account_id, new_balance);
        Self::insert_history(&mut tx, &record).await?;

        tx.commit().await.context("Failed to commit balance edit")?;
        Ok(true)
    }

    /// Delete an account and everything hanging off it: balance history,
    /// transactions, goal links. Budget line items that referenced the
    /// account are detached, not deleted. Single transaction.
    pub async fn delete_account(&self, account_id: AccountId) -> Result<()> {
        let id_str = account_id.to_string();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM balance_history WHERE account_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete balance history")?;

        sqlx::query("DELETE FROM transactions WHERE account_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete transactions")?;

        sqlx::query("DELETE FROM goal_accounts WHERE account_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete goal links")?;

        sqlx::query("UPDATE budget_items SET account_id = NULL WHERE account_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to detach budget items")?;

        sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete account")?;

        tx.commit().await.context("Failed to commit account deletion")?;
        Ok(())
    }

    /// List transactions for an account, oldest first.
    pub async fn list_transactions(&self, account_id: AccountId) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, amount_cents, category, date, recorded_at, related_type, related_id
            FROM transactions
            WHERE account_id = ?
            ORDER BY recorded_at
            "#,
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// List the balance history for an account, oldest first.
    pub async fn list_balance_history(
        &self,
        account_id: AccountId,
    ) -> Result<Vec<BalanceHistoryRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, account_id, balance_cents, recorded_at
            FROM balance_history
            WHERE account_id = ?
            ORDER BY recorded_at
            "#,
        )
        .bind(account_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list balance history")?;

        rows.iter().map(Self::row_to_history).collect()
    }

    async fn insert_history(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        record: &BalanceHistoryRecord,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO balance_history (id, account_id, balance_cents, recorded_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.account_id.to_string())
        .bind(record.balance_cents)
        .bind(record.recorded_at.to_rfc3339())
        .execute(&mut **tx)
        .await
        .context("Failed to append balance history")?;
        Ok(())
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let id_str: String = row.get("id");
        Ok(Account {
            id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
            name: row.get("name"),
            owner: Self::row_to_owner(row)?,
            balance_cents: row.get("balance_cents"),
            shared: row.get::<i32, _>("shared") != 0,
            created_at: Self::parse_timestamp(row.get("created_at"))?,
            updated_at: Self::parse_timestamp(row.get("updated_at"))?,
        })
    }

    fn row_to_history(row: &sqlx::sqlite::SqliteRow) -> Result<BalanceHistoryRecord> {
        let id_str: String = row.get("id");
        let account_str: String = row.get("account_id");
        Ok(BalanceHistoryRecord {
            id: Uuid::parse_str(&id_str).context("Invalid history ID")?,
            account_id: Uuid::parse_str(&account_str).context("Invalid account ID")?,
            balance_cents: row.get("balance_cents"),
            recorded_at: Self::parse_timestamp(row.get("recorded_at"))?,
        })
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let id_str: String = row.get("id");
        let account_str: String = row.get("account_id");
        let related_type: Option<String> = row.get("related_type");
        let related_id: Option<String> = row.get("related_id");

        let related_to = match (related_type, related_id) {
            (Some(kind), Some(id)) => {
                let id = Uuid::parse_str(&id).context("Invalid related ID")?;
                Some(
                    RelatedTo::from_parts(&kind, id)
                        .ok_or_else(|| anyhow::anyhow!("Invalid related type: {}", kind))?,
                )
            }
            _ => None,
        };

        Ok(Transaction {
            id: Uuid::parse_str(&id_str).context("Invalid transaction ID")?,
            account_id: Uuid::parse_str(&account_str).context("Invalid account ID")?,
            amount_cents: row.get("amount_cents"),
            category: row.get("category"),
            date: Self::parse_timestamp(row.get("date"))?,
            recorded_at: Self::parse_timestamp(row.get("recorded_at"))?,
            related_to,
        })
    }

    // ========================
    // Budget operations
    // ========================

    /// Save a new monthly budget.
    pub async fn save_budget(&self, budget: &MonthlyBudget) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO monthly_budgets (id, owner_type, owner_id, month, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(budget.id.to_string())
        .bind(budget.owner.kind())
        .bind(budget.owner.id().to_string())
        .bind(budget.month.to_string())
        .bind(budget.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save budget")?;
        Ok(())
    }

    /// Get a budget by ID.
    pub async fn get_budget(&self, id: BudgetId) -> Result<Option<MonthlyBudget>> {
        let row = sqlx::query(
            "SELECT id, owner_type, owner_id, month, created_at FROM monthly_budgets WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch budget")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_budget(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a budget by its (owner, month) identity.
    pub async fn get_budget_by_owner_month(
        &self,
        owner: OwnerRef,
        month: BudgetMonth,
    ) -> Result<Option<MonthlyBudget>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_type, owner_id, month, created_at
            FROM monthly_budgets
            WHERE owner_type = ? AND owner_id = ? AND month = ?
            "#,
        )
        .bind(owner.kind())
        .bind(owner.id().to_string())
        .bind(month.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch budget by owner and month")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_budget(&row)?)),
            None => Ok(None),
        }
    }

    /// Save a new budget line item.
    pub async fn save_line_item(&self, item: &BudgetLineItem) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO budget_items (id, budget_id, kind, category, account_id, amount_cents, recurrence_type, recurrence_interval, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id.to_string())
        .bind(item.budget_id.to_string())
        .bind(item.kind.as_str())
        .bind(&item.category)
        .bind(item.account_id.map(|id| id.to_string()))
        .bind(item.amount_cents)
        .bind(item.recurrence.map(|r| r.kind()))
        .bind(item.recurrence.and_then(|r| r.interval_months()))
        .bind(item.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save line item")?;
        Ok(())
    }

    /// Delete a line item. Returns true if a row was removed.
    pub async fn delete_line_item(&self, id: LineItemId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM budget_items WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete line item")?;
        Ok(result.rows_affected() > 0)
    }

    /// List line items under a budget, oldest first.
    pub async fn list_line_items(&self, budget_id: BudgetId) -> Result<Vec<BudgetLineItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, budget_id, kind, category, account_id, amount_cents, recurrence_type, recurrence_interval, created_at
            FROM budget_items
            WHERE budget_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(budget_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list line items")?;

        rows.iter().map(Self::row_to_line_item).collect()
    }

    /// Compute a budget's summary with SQL aggregation. Each total
    /// COALESCEs to 0 when no items of that kind exist.
    pub async fn summarize_budget(&self, budget_id: BudgetId) -> Result<BudgetSummary> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount_cents ELSE 0 END), 0) as total_income,
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount_cents ELSE 0 END), 0) as total_expenses,
                COALESCE(SUM(CASE WHEN kind = 'savings_allocation' THEN amount_cents ELSE 0 END), 0) as total_savings
            FROM budget_items
            WHERE budget_id = ?
            "#,
        )
        .bind(budget_id.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to summarize budget")?;

        let total_income: Cents = row.get("total_income");
        let total_expenses: Cents = row.get("total_expenses");
        let total_savings: Cents = row.get("total_savings");

        Ok(BudgetSummary {
            total_income,
            total_expenses,
            total_savings,
            personal_remainder: total_income - total_expenses - total_savings,
        })
    }

    fn row_to_budget(row: &sqlx::sqlite::SqliteRow) -> Result<MonthlyBudget> {
        let id_str: String = row.get("id");
        let month_str: String = row.get("month");
        Ok(MonthlyBudget {
            id: Uuid::parse_str(&id_str).context("Invalid budget ID")?,
            owner: Self::row_to_owner(row)?,
            month: BudgetMonth::from_str(&month_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid budget month: {}", month_str))?,
            created_at: Self::parse_timestamp(row.get("created_at"))?,
        })
    }

    fn row_to_line_item(row: &sqlx::sqlite::SqliteRow) -> Result<BudgetLineItem> {
        let id_str: String = row.get("id");
        let budget_str: String = row.get("budget_id");
        let kind_str: String = row.get("kind");
        let account_str: Option<String> = row.get("account_id");
        let recurrence_type: Option<String> = row.get("recurrence_type");
        let recurrence_interval: Option<u32> = row.get("recurrence_interval");

        let recurrence = match recurrence_type {
            Some(kind) => Some(
                Recurrence::from_parts(&kind, recurrence_interval)
                    .ok_or_else(|| anyhow::anyhow!("Invalid recurrence: {}", kind))?,
            ),
            None => None,
        };

        Ok(BudgetLineItem {
            id: Uuid::parse_str(&id_str).context("Invalid line item ID")?,
            budget_id: Uuid::parse_str(&budget_str).context("Invalid budget ID")?,
            kind: LineItemKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid line item kind: {}", kind_str))?,
            category: row.get("category"),
            account_id: account_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid account ID")?,
            amount_cents: row.get("amount_cents"),
            recurrence,
            created_at: Self::parse_timestamp(row.get("created_at"))?,
        })
    }

    // ========================
    // Savings goal operations
    // ========================

    /// Save a new savings goal.
    pub async fn save_goal(&self, goal: &SavingsGoal) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO savings_goals (id, name, owner_type, owner_id, target_cents, start_date, target_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(goal.id.to_string())
        .bind(&goal.name)
        .bind(goal.owner.kind())
        .bind(goal.owner.id().to_string())
        .bind(goal.target_cents)
        .bind(goal.start_date.to_rfc3339())
        .bind(goal.target_date.to_rfc3339())
        .bind(goal.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save goal")?;
        Ok(())
    }

    /// Get a goal by ID.
    pub async fn get_goal(&self, id: GoalId) -> Result<Option<SavingsGoal>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, owner_type, owner_id, target_cents, start_date, target_date, created_at
            FROM savings_goals
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch goal")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_goal(&row)?)),
            None => Ok(None),
        }
    }

    /// List all goals, oldest first.
    pub async fn list_goals(&self) -> Result<Vec<SavingsGoal>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, owner_type, owner_id, target_cents, start_date, target_date, created_at
            FROM savings_goals
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list goals")?;

        rows.iter().map(Self::row_to_goal).collect()
    }

    /// Link an account to a goal. No validation here; callers check that
    /// both sides exist before linking.
    pub async fn save_goal_link(&self, link: &GoalAccountLink) -> Result<()> {
        sqlx::query(
            "INSERT INTO goal_accounts (goal_id, account_id, linked_at) VALUES (?, ?, ?)",
        )
        .bind(link.goal_id.to_string())
        .bind(link.account_id.to_string())
        .bind(link.linked_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to link account to goal")?;
        Ok(())
    }

    /// Unlink an account from a goal. Returns true if a link was removed.
    pub async fn delete_goal_link(&self, goal_id: GoalId, account_id: AccountId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM goal_accounts WHERE goal_id = ? AND account_id = ?")
            .bind(goal_id.to_string())
            .bind(account_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to unlink account from goal")?;
        Ok(result.rows_affected() > 0)
    }

    /// List the account IDs linked to a goal.
    pub async fn list_goal_account_ids(&self, goal_id: GoalId) -> Result<Vec<AccountId>> {
        let rows = sqlx::query(
            "SELECT account_id FROM goal_accounts WHERE goal_id = ? ORDER BY linked_at",
        )
        .bind(goal_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list goal accounts")?;

        rows.iter()
            .map(|row| {
                let id_str: String = row.get("account_id");
                Uuid::parse_str(&id_str).context("Invalid account ID")
            })
            .collect()
    }

    /// Append a goal progress snapshot.
    pub async fn save_goal_progress(&self, record: &GoalProgressRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO goal_progress (id, goal_id, amount_cents, recorded_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.goal_id.to_string())
        .bind(record.amount_cents)
        .bind(record.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save goal progress")?;
        Ok(())
    }

    /// List a goal's progress history, oldest first.
    pub async fn list_goal_progress(&self, goal_id: GoalId) -> Result<Vec<GoalProgressRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, goal_id, amount_cents, recorded_at
            FROM goal_progress
            WHERE goal_id = ?
            ORDER BY recorded_at
            "#,
        )
        .bind(goal_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list goal progress")?;

        rows.iter().map(Self::row_to_progress).collect()
    }

    fn row_to_goal(row: &sqlx::sqlite::SqliteRow) -> Result<SavingsGoal> {
        let id_str: String = row.get("id");
        Ok(SavingsGoal {
            id: Uuid::parse_str(&id_str).context("Invalid goal ID")?,
            name: row.get("name"),
            owner: Self::row_to_owner(row)?,
            target_cents: row.get("target_cents"),
            start_date: Self::parse_timestamp(row.get("start_date"))?,
            target_date: Self::parse_timestamp(row.get("target_date"))?,
            created_at: Self::parse_timestamp(row.get("created_at"))?,
        })
    }

    fn row_to_progress(row: &sqlx::sqlite::SqliteRow) -> Result<GoalProgressRecord> {
        let id_str: String = row.get("id");
        let goal_str: String = row.get("goal_id");
        Ok(GoalProgressRecord {
            id: Uuid::parse_str(&id_str).context("Invalid progress ID")?,
            goal_id: Uuid::parse_str(&goal_str).context("Invalid goal ID")?,
            amount_cents: row.get("amount_cents"),
            recorded_at: Self::parse_timestamp(row.get("recorded_at"))?,
        })
    }

    // ========================
    // One-off budget operations
    // ========================

    /// Save a new one-off budget.
    pub async fn save_oneoff_budget(&self, budget: &OneOffBudget) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO oneoff_budgets (id, name, owner_type, owner_id, start_date, end_date, goal_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(budget.id.to_string())
        .bind(&budget.name)
        .bind(budget.owner.kind())
        .bind(budget.owner.id().to_string())
        .bind(budget.start_date.to_rfc3339())
        .bind(budget.end_date.to_rfc3339())
        .bind(budget.goal_id.map(|id| id.to_string()))
        .bind(budget.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save one-off budget")?;
        Ok(())
    }

    /// Get a one-off budget by ID.
    pub async fn get_oneoff_budget(&self, id: OneOffBudgetId) -> Result<Option<OneOffBudget>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, owner_type, owner_id, start_date, end_date, goal_id, created_at
            FROM oneoff_budgets
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch one-off budget")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_oneoff_budget(&row)?)),
            None => Ok(None),
        }
    }

    /// Save a new one-off item.
    pub async fn save_oneoff_item(&self, item: &OneOffItem) -> Result<()> {
        sqlx::query(
            "INSERT INTO oneoff_items (id, budget_id, name, category, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(item.id.to_string())
        .bind(item.budget_id.to_string())
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save one-off item")?;
        Ok(())
    }

    /// Get a one-off item by ID.
    pub async fn get_oneoff_item(&self, id: OneOffItemId) -> Result<Option<OneOffItem>> {
        let row = sqlx::query(
            "SELECT id, budget_id, name, category, created_at FROM oneoff_items WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch one-off item")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_oneoff_item(&row)?)),
            None => Ok(None),
        }
    }

    /// List a one-off budget's items, oldest first.
    pub async fn list_oneoff_items(&self, budget_id: OneOffBudgetId) -> Result<Vec<OneOffItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, budget_id, name, category, created_at
            FROM oneoff_items
            WHERE budget_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(budget_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list one-off items")?;

        rows.iter().map(Self::row_to_oneoff_item).collect()
    }

    /// Save a new option for a one-off item.
    pub async fn save_oneoff_option(&self, option: &OneOffOption) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO oneoff_options (id, item_id, label, price_cents, selected, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(option.id.to_string())
        .bind(option.item_id.to_string())
        .bind(&option.label)
        .bind(option.price_cents)
        .bind(option.selected)
        .bind(option.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save one-off option")?;
        Ok(())
    }

    /// Get a one-off option by ID.
    pub async fn get_oneoff_option(&self, id: OneOffOptionId) -> Result<Option<OneOffOption>> {
        let row = sqlx::query(
            r#"
            SELECT id, item_id, label, price_cents, selected, created_at
            FROM oneoff_options
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch one-off option")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_oneoff_option(&row)?)),
            None => Ok(None),
        }
    }

    /// List an item's options, oldest first.
    pub async fn list_item_options(&self, item_id: OneOffItemId) -> Result<Vec<OneOffOption>> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_id, label, price_cents, selected, created_at
            FROM oneoff_options
            WHERE item_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(item_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list item options")?;

        rows.iter().map(Self::row_to_oneoff_option).collect()
    }

    /// Mark one option selected and deselect its siblings, atomically.
    /// At most one option per item is ever selected.
    pub async fn select_option(&self, item_id: OneOffItemId, option_id: OneOffOptionId) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("UPDATE oneoff_options SET selected = 0 WHERE item_id = ?")
            .bind(item_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to clear option selection")?;

        sqlx::query("UPDATE oneoff_options SET selected = 1 WHERE id = ?")
            .bind(option_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to select option")?;

        tx.commit().await.context("Failed to commit option selection")?;
        Ok(())
    }

    fn row_to_oneoff_budget(row: &sqlx::sqlite::SqliteRow) -> Result<OneOffBudget> {
        let id_str: String = row.get("id");
        let goal_str: Option<String> = row.get("goal_id");
        Ok(OneOffBudget {
            id: Uuid::parse_str(&id_str).context("Invalid one-off budget ID")?,
            name: row.get("name"),
            owner: Self::row_to_owner(row)?,
            start_date: Self::parse_timestamp(row.get("start_date"))?,
            end_date: Self::parse_timestamp(row.get("end_date"))?,
            goal_id: goal_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid goal ID")?,
            created_at: Self::parse_timestamp(row.get("created_at"))?,
        })
    }

    fn row_to_oneoff_item(row: &sqlx::sqlite::SqliteRow) -> Result<OneOffItem> {
        let id_str: String = row.get("id");
        let budget_str: String = row.get("budget_id");
        Ok(OneOffItem {
            id: Uuid::parse_str(&id_str).context("Invalid item ID")?,
            budget_id: Uuid::parse_str(&budget_str).context("Invalid budget ID")?,
            name: row.get("name"),
            category: row.get("category"),
            created_at: Self::parse_timestamp(row.get("created_at"))?,
        })
    }

    fn row_to_oneoff_option(row: &sqlx::sqlite::SqliteRow) -> Result<OneOffOption> {
        let id_str: String = row.get("id");
        let item_str: String = row.get("item_id");
        Ok(OneOffOption {
            id: Uuid::parse_str(&id_str).context("Invalid option ID")?,
            item_id: Uuid::parse_str(&item_str).context("Invalid item ID")?,
            label: row.get("label"),
            price_cents: row.get("price_cents"),
            selected: row.get::<i32, _>("selected") != 0,
            created_at: Self::parse_timestamp(row.get("created_at"))?,
        })
    }

    // ========================
    // Shared helpers
    // ========================

    fn row_to_owner(row: &sqlx::sqlite::SqliteRow) -> Result<OwnerRef> {
        let owner_type: String = row.get("owner_type");
        let owner_id_str: String = row.get("owner_id");
        let owner_id = Uuid::parse_str(&owner_id_str).context("Invalid owner ID")?;
        OwnerRef::from_parts(&owner_type, owner_id)
            .ok_or_else(|| anyhow::anyhow!("Invalid owner type: {}", owner_type))
    }

    fn parse_timestamp(value: String) -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(&value)
            .context("Invalid timestamp")?
            .with_timezone(&Utc))
    }
}
