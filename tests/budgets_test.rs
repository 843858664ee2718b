mod common;

use anyhow::Result;
use common::{Household, test_service};
use uuid::Uuid;

use aerario::application::AppError;
use aerario::domain::{BudgetMonth, LineItemKind, Recurrence};

#[tokio::test]
async fn test_budget_summary() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let month = BudgetMonth::new(2025, 6).unwrap();
    let budget = service.create_budget(household.user, month).await?;

    service
        .add_line_item(budget.id, LineItemKind::Income, "salary".into(), None, 100_000, None)
        .await?;
    service
        .add_line_item(budget.id, LineItemKind::Income, "freelance".into(), None, 50_000, None)
        .await?;
    service
        .add_line_item(budget.id, LineItemKind::Expense, "rent".into(), None, 30_000, None)
        .await?;
    service
        .add_line_item(
            budget.id,
            LineItemKind::SavingsAllocation,
            "emergency fund".into(),
            None,
            20_000,
            None,
        )
        .await?;

    let summary = service.summarize_budget(budget.id).await?;
    assert_eq!(summary.total_income, 150_000);
    assert_eq!(summary.total_expenses, 30_000);
    assert_eq!(summary.total_savings, 20_000);
    assert_eq!(summary.personal_remainder, 100_000);

    Ok(())
}

#[tokio::test]
async fn test_empty_budget_summary_is_zero() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let month = BudgetMonth::new(2025, 6).unwrap();
    let budget = service.create_budget(household.user, month).await?;

    let summary = service.summarize_budget(budget.id).await?;
    assert_eq!(summary.total_income, 0);
    assert_eq!(summary.total_expenses, 0);
    assert_eq!(summary.total_savings, 0);
    assert_eq!(summary.personal_remainder, 0);

    Ok(())
}

#[tokio::test]
async fn test_overspent_budget_goes_negative() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let month = BudgetMonth::new(2025, 6).unwrap();
    let budget = service.create_budget(household.user, month).await?;

    service
        .add_line_item(budget.id, LineItemKind::Income, "salary".into(), None, 10_000, None)
        .await?;
    service
        .add_line_item(budget.id, LineItemKind::Expense, "car repair".into(), None, 45_000, None)
        .await?;

    let summary = service.summarize_budget(budget.id).await?;
    assert_eq!(summary.personal_remainder, -35_000);

    Ok(())
}

#[tokio::test]
async fn test_summarize_unknown_budget() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.summarize_budget(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::BudgetNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_one_budget_per_owner_per_month() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let month = BudgetMonth::new(2025, 6).unwrap();
    service.create_budget(household.user, month).await?;

    let result = service.create_budget(household.user, month).await;
    assert!(matches!(result, Err(AppError::DuplicateBudget { .. })));

    // A different owner can budget the same month
    service.create_budget(household.group, month).await?;

    // And the same owner can budget a different month
    let july = BudgetMonth::new(2025, 7).unwrap();
    service.create_budget(household.user, july).await?;

    Ok(())
}

#[tokio::test]
async fn test_line_item_recurrence_roundtrip() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let month = BudgetMonth::new(2025, 6).unwrap();
    let budget = service.create_budget(household.user, month).await?;

    let account = service
        .create_account(household.user, "Checking".into(), 0, false)
        .await?;

    service
        .add_line_item(
            budget.id,
            LineItemKind::Expense,
            "insurance".into(),
            Some(account.id),
            12_000,
            Some(Recurrence::Quarterly),
        )
        .await?;
    service
        .add_line_item(
            budget.id,
            LineItemKind::Expense,
            "club fee".into(),
            None,
            3_000,
            Some(Recurrence::Custom { interval_months: 5 }),
        )
        .await?;

    let items = service.list_line_items(budget.id).await?;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].recurrence, Some(Recurrence::Quarterly));
    assert_eq!(items[0].account_id, Some(account.id));
    assert_eq!(
        items[1].recurrence,
        Some(Recurrence::Custom { interval_months: 5 })
    );

    Ok(())
}

#[tokio::test]
async fn test_remove_line_item_updates_summary() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let month = BudgetMonth::new(2025, 6).unwrap();
    let budget = service.create_budget(household.user, month).await?;

    let item = service
        .add_line_item(budget.id, LineItemKind::Expense, "rent".into(), None, 30_000, None)
        .await?;

    service.remove_line_item(item.id).await?;

    let summary = service.summarize_budget(budget.id).await?;
    assert_eq!(summary.total_expenses, 0);

    let result = service.remove_line_item(item.id).await;
    assert!(matches!(result, Err(AppError::LineItemNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_deleting_account_detaches_line_items() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let month = BudgetMonth::new(2025, 6).unwrap();
    let budget = service.create_budget(household.user, month).await?;
    let account = service
        .create_account(household.user, "Checking".into(), 0, false)
        .await?;

    service
        .add_line_item(
            budget.id,
            LineItemKind::Expense,
            "rent".into(),
            Some(account.id),
            30_000,
            None,
        )
        .await?;

    service.delete_account(account.id).await?;

    // The item survives with its account reference cleared
    let items = service.list_line_items(budget.id).await?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].account_id, None);
    assert_eq!(items[0].amount_cents, 30_000);

    Ok(())
}
