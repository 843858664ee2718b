mod repository;

pub use repository::*;

/// SQL migration for owners and the ledger core
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// SQL migration for monthly budgets and line items
pub const MIGRATION_002_BUDGETS: &str = include_str!("migrations/002_budgets.sql");

/// SQL migration for savings goals and progress history
pub const MIGRATION_003_GOALS: &str = include_str!("migrations/003_goals.sql");

/// SQL migration for one-off budgets
pub const MIGRATION_004_ONEOFF: &str = include_str!("migrations/004_oneoff.sql");
