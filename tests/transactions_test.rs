mod common;

use anyhow::Result;
use chrono::Utc;
use common::{Household, parse_date, test_service};
use uuid::Uuid;

use aerario::application::AppError;
use aerario::domain::RelatedTo;

#[tokio::test]
async fn test_balance_is_initial_plus_transaction_sum() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let account = service
        .create_account(household.user, "Checking".into(), 50_000, false)
        .await?;

    service
        .record_transaction(account.id, 120_000, "salary".into(), Utc::now(), None)
        .await?;
    service
        .record_transaction(account.id, -35_000, "rent".into(), Utc::now(), None)
        .await?;
    service
        .record_transaction(account.id, -4_550, "groceries".into(), Utc::now(), None)
        .await?;

    assert_eq!(
        service.get_balance(account.id).await?,
        50_000 + 120_000 - 35_000 - 4_550
    );

    let transactions = service.list_transactions(account.id).await?;
    assert_eq!(transactions.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_each_transaction_appends_one_snapshot() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let account = service
        .create_account(household.user, "Checking".into(), 10_000, false)
        .await?;

    service
        .record_transaction(account.id, 5_000, "salary".into(), Utc::now(), None)
        .await?;
    service
        .record_transaction(account.id, -3_000, "rent".into(), Utc::now(), None)
        .await?;

    let history = service.list_balance_history(account.id).await?;
    let balances: Vec<i64> = history.iter().map(|r| r.balance_cents).collect();
    assert_eq!(balances, vec![10_000, 15_000, 12_000]);

    // No duplicate consecutive snapshots
    for pair in balances.windows(2) {
        assert_ne!(pair[0], pair[1]);
    }

    Ok(())
}

#[tokio::test]
async fn test_zero_amount_transaction_leaves_no_snapshot() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let account = service
        .create_account(household.user, "Checking".into(), 10_000, false)
        .await?;

    service
        .record_transaction(account.id, 0, "noop".into(), Utc::now(), None)
        .await?;

    // The transaction is in the ledger but the balance never moved,
    // so there is no duplicate snapshot.
    assert_eq!(service.list_transactions(account.id).await?.len(), 1);
    assert_eq!(service.list_balance_history(account.id).await?.len(), 1);
    assert_eq!(service.get_balance(account.id).await?, 10_000);

    Ok(())
}

#[tokio::test]
async fn test_record_transaction_unknown_account() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .record_transaction(Uuid::new_v4(), 1_000, "misc".into(), Utc::now(), None)
        .await;

    assert!(matches!(result, Err(AppError::AccountNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_related_to_roundtrips_through_storage() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let account = service
        .create_account(household.user, "Checking".into(), 0, false)
        .await?;

    let expense_id = Uuid::new_v4();
    service
        .record_transaction(
            account.id,
            -9_900,
            "utilities".into(),
            parse_date("2025-03-05"),
            Some(RelatedTo::Expense(expense_id)),
        )
        .await?;

    let transactions = service.list_transactions(account.id).await?;
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].related_to, Some(RelatedTo::Expense(expense_id)));
    assert_eq!(transactions[0].date, parse_date("2025-03-05"));

    Ok(())
}
