mod common;

use anyhow::Result;
use chrono::Utc;
use common::{Household, test_service};
use uuid::Uuid;

use aerario::application::AppError;
use aerario::domain::OwnerRef;

#[tokio::test]
async fn test_create_account_records_initial_balance() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let account = service
        .create_account(household.user, "Checking".into(), 10_000, false)
        .await?;

    assert_eq!(account.balance_cents, 10_000);
    assert_eq!(service.get_balance(account.id).await?, 10_000);

    // Creation itself is the first history record
    let history = service.list_balance_history(account.id).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].balance_cents, 10_000);

    Ok(())
}

#[tokio::test]
async fn test_group_owned_account() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let account = service
        .create_account(household.group, "Joint".into(), 0, true)
        .await?;

    assert_eq!(account.owner, household.group);
    assert!(account.shared);

    let accounts = service.list_accounts(Some(household.group)).await?;
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].name, "Joint");

    Ok(())
}

#[tokio::test]
async fn test_create_account_rejects_unknown_owner() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let ghost = OwnerRef::User(Uuid::new_v4());
    let result = service
        .create_account(ghost, "Orphan".into(), 0, false)
        .await;

    assert!(matches!(result, Err(AppError::InvalidOwner(_))));

    // A group id is not a valid user reference either
    let household = Household::create(&service).await?;
    let crossed = OwnerRef::User(household.group.id());
    let result = service
        .create_account(crossed, "Crossed".into(), 0, false)
        .await;

    assert!(matches!(result, Err(AppError::InvalidOwner(_))));

    Ok(())
}

#[tokio::test]
async fn test_set_balance_appends_history_only_on_change() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let account = service
        .create_account(household.user, "Checking".into(), 5_000, false)
        .await?;

    // No-op edit: same balance, no new snapshot
    let changed = service.set_balance(account.id, 5_000).await?;
    assert!(!changed);
    assert_eq!(service.list_balance_history(account.id).await?.len(), 1);

    // Real edit: snapshot appended
    let changed = service.set_balance(account.id, 7_500).await?;
    assert!(changed);

    let history = service.list_balance_history(account.id).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].balance_cents, 7_500);
    assert_eq!(service.get_balance(account.id).await?, 7_500);

    Ok(())
}

#[tokio::test]
async fn test_delete_account_cascades() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let account = service
        .create_account(household.user, "Doomed".into(), 10_000, false)
        .await?;
    service
        .record_transaction(account.id, -2_000, "groceries".into(), Utc::now(), None)
        .await?;

    service.delete_account(account.id).await?;

    // Lookups return empty, not errors
    assert!(service.list_balance_history(account.id).await?.is_empty());
    assert!(service.list_transactions(account.id).await?.is_empty());

    let result = service.get_account(account.id).await;
    assert!(matches!(result, Err(AppError::AccountNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_delete_unknown_account_fails() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.delete_account(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::AccountNotFound(_))));

    Ok(())
}
