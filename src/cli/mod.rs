use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::LedgerService;
use crate::domain::{
    BudgetMonth, LineItemKind, OwnerRef, Recurrence, format_cents, parse_cents,
};

/// Aerario - Household Budget Ledger
#[derive(Parser)]
#[command(name = "aerario")]
#[command(about = "A local-first household budget and savings ledger")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "aerario.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// User management commands
    #[command(subcommand)]
    User(UserCommands),

    /// Group management commands
    #[command(subcommand)]
    Group(GroupCommands),

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Record a transaction against an account
    Tx {
        /// Account ID or name
        account: String,

        /// Signed amount: positive credit, negative debit (e.g., "-12.50")
        amount: String,

        /// Category (e.g., "groceries", "salary")
        #[arg(short, long)]
        category: String,

        /// Date of the transaction (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List transactions for an account
    Txs {
        /// Account ID or name
        account: String,
    },

    /// Savings goal commands
    #[command(subcommand)]
    Goal(GoalCommands),

    /// Monthly budget commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// One-off budget commands
    #[command(subcommand)]
    Oneoff(OneoffCommands),
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a new user
    Create {
        /// User name (must be unique)
        name: String,
    },
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// Create a new group
    Create {
        /// Group name (must be unique)
        name: String,
    },

    /// Add a user to a group
    AddMember {
        /// Group name
        group: String,

        /// User name
        user: String,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account name
        name: String,

        /// Initial balance (e.g., "100.00")
        #[arg(long, default_value = "0")]
        balance: String,

        /// Owning user name
        #[arg(long)]
        user: Option<String>,

        /// Owning group name
        #[arg(long, conflicts_with = "user")]
        group: Option<String>,

        /// Mark the account as shared within the owning group
        #[arg(long)]
        shared: bool,
    },

    /// List accounts
    List,

    /// Show an account's current balance
    Balance {
        /// Account ID or name
        account: String,
    },

    /// Show an account's balance history
    History {
        /// Account ID or name
        account: String,
    },

    /// Set an account's balance directly (explicit balance edit)
    SetBalance {
        /// Account ID or name
        account: String,

        /// New balance (e.g., "250.00")
        balance: String,
    },

    /// Delete an account and everything attached to it
    Delete {
        /// Account ID or name
        account: String,
    },
}

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a new savings goal
    Create {
        /// Goal name
        name: String,

        /// Target amount (e.g., "5000.00")
        #[arg(short, long)]
        target: String,

        /// Start date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start: Option<String>,

        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        by: String,

        /// Owning user name
        #[arg(long)]
        user: Option<String>,

        /// Owning group name
        #[arg(long, conflicts_with = "user")]
        group: Option<String>,
    },

    /// Link an account to a goal
    Link {
        /// Goal ID
        goal: String,

        /// Account ID or name
        account: String,
    },

    /// Unlink an account from a goal
    Unlink {
        /// Goal ID
        goal: String,

        /// Account ID or name
        account: String,
    },

    /// Recompute one goal's progress and append a snapshot
    Recompute {
        /// Goal ID
        goal: String,
    },

    /// Recompute every goal's progress (the scheduled batch job)
    RecomputeAll,

    /// Show a goal's progress history
    Progress {
        /// Goal ID
        goal: String,
    },

    /// List all goals
    List,
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Create a monthly budget (one per owner per month)
    Create {
        /// Budget month (YYYY-MM)
        month: String,

        /// Owning user name
        #[arg(long)]
        user: Option<String>,

        /// Owning group name
        #[arg(long, conflicts_with = "user")]
        group: Option<String>,
    },

    /// Add a line item to a budget
    AddItem {
        /// Budget ID
        budget: String,

        /// Item kind: income, expense, savings
        #[arg(short, long)]
        kind: String,

        /// Category (e.g., "rent", "salary")
        #[arg(short, long)]
        category: String,

        /// Amount (e.g., "1200.00")
        #[arg(short, long)]
        amount: String,

        /// Account the item draws from or pays into
        #[arg(long)]
        account: Option<String>,

        /// Recurrence: monthly, quarterly, biannual, annual
        #[arg(long)]
        recurrence: Option<String>,

        /// Custom recurrence interval in months (implies custom recurrence)
        #[arg(long, conflicts_with = "recurrence")]
        every_months: Option<u32>,
    },

    /// Show a budget's summary (income, expenses, savings, remainder)
    Summary {
        /// Budget ID
        budget: String,

        /// Output format: table, json
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum OneoffCommands {
    /// Create a one-off budget (e.g., a trip)
    Create {
        /// Budget name
        name: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Savings goal funding this budget
        #[arg(long)]
        goal: Option<String>,

        /// Owning user name
        #[arg(long)]
        user: Option<String>,

        /// Owning group name
        #[arg(long, conflicts_with = "user")]
        group: Option<String>,
    },

    /// Add an item to a one-off budget
    AddItem {
        /// One-off budget ID
        budget: String,

        /// Item name
        name: String,

        /// Category
        #[arg(short, long)]
        category: String,
    },

    /// Add a priced option to an item
    AddOption {
        /// Item ID
        item: String,

        /// Option label
        label: String,

        /// Price (e.g., "450.00")
        #[arg(short, long)]
        price: String,
    },

    /// Select one option for an item (deselects the others)
    Select {
        /// Option ID
        option: String,
    },

    /// List a one-off budget's items and their options
    Items {
        /// One-off budget ID
        budget: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::User(user_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_user_command(&service, user_cmd).await?;
            }

            Commands::Group(group_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_group_command(&service, group_cmd).await?;
            }

            Commands::Account(account_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_account_command(&service, account_cmd).await?;
            }

            Commands::Tx {
                account,
                amount,
                category,
                date,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let account_id = resolve_account(&service, &account).await?;
                let amount_cents = parse_cents(&amount)
                    .context("Invalid amount format. Use '50.00' or '-12.50'")?;
                let date = parse_date_or_now(date.as_deref())?;

                let tx = service
                    .record_transaction(account_id, amount_cents, category, date, None)
                    .await?;
                let balance = service.get_balance(account_id).await?;

                println!(
                    "Recorded {} transaction {} (new balance: {})",
                    tx.category,
                    tx.id,
                    format_cents(balance)
                );
            }

            Commands::Txs { account } => {
                let service = LedgerService::connect(&self.database).await?;
                let account_id = resolve_account(&service, &account).await?;

                for tx in service.list_transactions(account_id).await? {
                    println!(
                        "{}  {:>12}  {}  {}",
                        tx.date.format("%Y-%m-%d"),
                        format_cents(tx.amount_cents),
                        tx.category,
                        tx.id
                    );
                }
            }

            Commands::Goal(goal_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_goal_command(&service, goal_cmd).await?;
            }

            Commands::Budget(budget_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_budget_command(&service, budget_cmd).await?;
            }

            Commands::Oneoff(oneoff_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_oneoff_command(&service, oneoff_cmd).await?;
            }
        }

        Ok(())
    }
}

async fn run_user_command(service: &LedgerService, cmd: UserCommands) -> Result<()> {
    match cmd {
        UserCommands::Create { name } => {
            let user = service.create_user(name).await?;
            println!("Created user '{}' ({})", user.name, user.id);
        }
    }
    Ok(())
}

async fn run_group_command(service: &LedgerService, cmd: GroupCommands) -> Result<()> {
    match cmd {
        GroupCommands::Create { name } => {
            let group = service.create_group(name).await?;
            println!("Created group '{}' ({})", group.name, group.id);
        }

        GroupCommands::AddMember { group, user } => {
            let group = service.get_group(&group).await?;
            let user = service.get_user(&user).await?;
            service.add_group_member(group.id, user.id).await?;
            println!("Added '{}' to '{}'", user.name, group.name);
        }
    }
    Ok(())
}

async fn run_account_command(service: &LedgerService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Create {
            name,
            balance,
            user,
            group,
            shared,
        } => {
            let owner = resolve_owner(service, user.as_deref(), group.as_deref()).await?;
            let initial = parse_cents(&balance).context("Invalid balance format")?;

            let account = service.create_account(owner, name, initial, shared).await?;
            println!(
                "Created account '{}' with balance {} ({})",
                account.name,
                format_cents(account.balance_cents),
                account.id
            );
        }

        AccountCommands::List => {
            for account in service.list_accounts(None).await? {
                println!(
                    "{:>12}  {}  [{}]  {}",
                    format_cents(account.balance_cents),
                    account.name,
                    account.owner,
                    account.id
                );
            }
        }

        AccountCommands::Balance { account } => {
            let account_id = resolve_account(service, &account).await?;
            let balance = service.get_balance(account_id).await?;
            println!("{}", format_cents(balance));
        }

        AccountCommands::History { account } => {
            let account_id = resolve_account(service, &account).await?;
            for record in service.list_balance_history(account_id).await? {
                println!(
                    "{}  {:>12}",
                    record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                    format_cents(record.balance_cents)
                );
            }
        }

        AccountCommands::SetBalance { account, balance } => {
            let account_id = resolve_account(service, &account).await?;
            let new_balance = parse_cents(&balance).context("Invalid balance format")?;

            if service.set_balance(account_id, new_balance).await? {
                println!("Balance set to {}", format_cents(new_balance));
            } else {
                println!("Balance unchanged ({})", format_cents(new_balance));
            }
        }

        AccountCommands::Delete { account } => {
            let account_id = resolve_account(service, &account).await?;
            service.delete_account(account_id).await?;
            println!("Deleted account {}", account_id);
        }
    }
    Ok(())
}

async fn run_goal_command(service: &LedgerService, cmd: GoalCommands) -> Result<()> {
    match cmd {
        GoalCommands::Create {
            name,
            target,
            start,
            by,
            user,
            group,
        } => {
            let owner = resolve_owner(service, user.as_deref(), group.as_deref()).await?;
            let target_cents = parse_cents(&target).context("Invalid target format")?;
            let start_date = parse_date_or_now(start.as_deref())?;
            let target_date = parse_date(&by)?;

            let goal = service
                .create_goal(owner, name, target_cents, start_date, target_date)
                .await?;
            println!(
                "Created goal '{}' targeting {} by {} ({})",
                goal.name,
                format_cents(goal.target_cents),
                goal.target_date.format("%Y-%m-%d"),
                goal.id
            );
        }

        GoalCommands::Link { goal, account } => {
            let goal_id = parse_id(&goal)?;
            let account_id = resolve_account(service, &account).await?;
            service.link_account_to_goal(goal_id, account_id).await?;
            println!("Linked account {} to goal {}", account_id, goal_id);
        }

        GoalCommands::Unlink { goal, account } => {
            let goal_id = parse_id(&goal)?;
            let account_id = resolve_account(service, &account).await?;
            service.unlink_account_from_goal(goal_id, account_id).await?;
            println!("Unlinked account {} from goal {}", account_id, goal_id);
        }

        GoalCommands::Recompute { goal } => {
            let goal_id = parse_id(&goal)?;
            let amount = service.recompute_goal(goal_id).await?;
            println!("Goal progress: {}", format_cents(amount));
        }

        GoalCommands::RecomputeAll => {
            let report = service.recompute_all_goals().await?;
            for record in &report.recomputed {
                println!(
                    "{}  {:>12}",
                    record.goal_id,
                    format_cents(record.amount_cents)
                );
            }
            for failure in &report.failures {
                eprintln!("FAILED {}: {}", failure.goal_id, failure.error);
            }
            if !report.is_clean() {
                bail!("{} goal(s) failed to recompute", report.failures.len());
            }
        }

        GoalCommands::Progress { goal } => {
            let goal_id = parse_id(&goal)?;
            for record in service.list_goal_progress(goal_id).await? {
                println!(
                    "{}  {:>12}",
                    record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                    format_cents(record.amount_cents)
                );
            }
        }

        GoalCommands::List => {
            for goal in service.list_goals().await? {
                println!(
                    "{}  target {} by {}  [{}]  {}",
                    goal.name,
                    format_cents(goal.target_cents),
                    goal.target_date.format("%Y-%m-%d"),
                    goal.owner,
                    goal.id
                );
            }
        }
    }
    Ok(())
}

async fn run_budget_command(service: &LedgerService, cmd: BudgetCommands) -> Result<()> {
    match cmd {
        BudgetCommands::Create { month, user, group } => {
            let owner = resolve_owner(service, user.as_deref(), group.as_deref()).await?;
            let month = BudgetMonth::from_str(&month)
                .with_context(|| format!("Invalid month '{}'. Use YYYY-MM", month))?;

            let budget = service.create_budget(owner, month).await?;
            println!("Created budget for {} ({})", budget.month, budget.id);
        }

        BudgetCommands::AddItem {
            budget,
            kind,
            category,
            amount,
            account,
            recurrence,
            every_months,
        } => {
            let budget_id = parse_id(&budget)?;
            let kind = parse_item_kind(&kind)?;
            let amount_cents = parse_cents(&amount).context("Invalid amount format")?;
            let account_id = match account.as_deref() {
                Some(account) => Some(resolve_account(service, account).await?),
                None => None,
            };
            let recurrence = parse_recurrence(recurrence.as_deref(), every_months)?;

            let item = service
                .add_line_item(budget_id, kind, category, account_id, amount_cents, recurrence)
                .await?;
            println!(
                "Added {} item '{}' for {} ({})",
                item.kind,
                item.category,
                format_cents(item.amount_cents),
                item.id
            );
        }

        BudgetCommands::Summary { budget, format } => {
            let budget_id = parse_id(&budget)?;
            let summary = service.summarize_budget(budget_id).await?;

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
                _ => {
                    println!("Income:    {:>12}", format_cents(summary.total_income));
                    println!("Expenses:  {:>12}", format_cents(summary.total_expenses));
                    println!("Savings:   {:>12}", format_cents(summary.total_savings));
                    println!("Personal:  {:>12}", format_cents(summary.personal_remainder));
                }
            }
        }
    }
    Ok(())
}

async fn run_oneoff_command(service: &LedgerService, cmd: OneoffCommands) -> Result<()> {
    match cmd {
        OneoffCommands::Create {
            name,
            from,
            to,
            goal,
            user,
            group,
        } => {
            let owner = resolve_owner(service, user.as_deref(), group.as_deref()).await?;
            let start_date = parse_date(&from)?;
            let end_date = parse_date(&to)?;
            let goal_id = goal.as_deref().map(parse_id).transpose()?;

            let budget = service
                .create_oneoff_budget(owner, name, start_date, end_date, goal_id)
                .await?;
            println!("Created one-off budget '{}' ({})", budget.name, budget.id);
        }

        OneoffCommands::AddItem {
            budget,
            name,
            category,
        } => {
            let budget_id = parse_id(&budget)?;
            let item = service.add_oneoff_item(budget_id, name, category).await?;
            println!("Added item '{}' ({})", item.name, item.id);
        }

        OneoffCommands::AddOption { item, label, price } => {
            let item_id = parse_id(&item)?;
            let price_cents = parse_cents(&price).context("Invalid price format")?;

            let option = service.add_oneoff_option(item_id, label, price_cents).await?;
            println!(
                "Added option '{}' at {} ({})",
                option.label,
                format_cents(option.price_cents),
                option.id
            );
        }

        OneoffCommands::Select { option } => {
            let option_id = parse_id(&option)?;
            service.select_oneoff_option(option_id).await?;
            println!("Selected option {}", option_id);
        }

        OneoffCommands::Items { budget } => {
            let budget_id = parse_id(&budget)?;
            for item in service.list_oneoff_items(budget_id).await? {
                println!("{} [{}] {}", item.name, item.category, item.id);
                for option in service.list_item_options(item.id).await? {
                    let marker = if option.selected { "*" } else { " " };
                    println!(
                        "  {} {:>12}  {}  {}",
                        marker,
                        format_cents(option.price_cents),
                        option.label,
                        option.id
                    );
                }
            }
        }
    }
    Ok(())
}

/// Resolve `--user NAME` or `--group NAME` into an owner reference.
/// Exactly one must be given.
async fn resolve_owner(
    service: &LedgerService,
    user: Option<&str>,
    group: Option<&str>,
) -> Result<OwnerRef> {
    match (user, group) {
        (Some(name), None) => Ok(OwnerRef::User(service.get_user(name).await?.id)),
        (None, Some(name)) => Ok(OwnerRef::Group(service.get_group(name).await?.id)),
        _ => bail!("Specify an owner with --user NAME or --group NAME"),
    }
}

fn parse_id(input: &str) -> Result<Uuid> {
    Uuid::parse_str(input).context("Invalid ID format (expected UUID)")
}

fn parse_date(input: &str) -> Result<DateTime<Utc>> {
    let date = chrono::NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", input))?;
    Ok(date.and_hms_opt(0, 0, 0).unwrap().and_utc())
}

fn parse_date_or_now(input: Option<&str>) -> Result<DateTime<Utc>> {
    match input {
        Some(s) => parse_date(s),
        None => Ok(Utc::now()),
    }
}

fn parse_item_kind(input: &str) -> Result<LineItemKind> {
    match input {
        "income" => Ok(LineItemKind::Income),
        "expense" => Ok(LineItemKind::Expense),
        "savings" | "savings_allocation" => Ok(LineItemKind::SavingsAllocation),
        other => bail!("Unknown item kind '{}'. Use income, expense, or savings", other),
    }
}

fn parse_recurrence(kind: Option<&str>, every_months: Option<u32>) -> Result<Option<Recurrence>> {
    if let Some(interval_months) = every_months {
        if interval_months == 0 {
            bail!("Custom recurrence interval must be positive");
        }
        return Ok(Some(Recurrence::Custom { interval_months }));
    }

    match kind {
        None => Ok(None),
        Some(kind) => {
            let recurrence = Recurrence::from_parts(kind, None)
                .with_context(|| format!("Unknown recurrence '{}'", kind))?;
            Ok(Some(recurrence))
        }
    }
}

/// Resolve an account argument: a UUID, or an account name.
async fn resolve_account(service: &LedgerService, input: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }
    Ok(service.get_account_by_name(input).await?.id)
}
