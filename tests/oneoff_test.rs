mod common;

use anyhow::Result;
use common::{Household, parse_date, test_service};
use uuid::Uuid;

use aerario::application::AppError;

#[tokio::test]
async fn test_oneoff_budget_with_items_and_options() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let trip = service
        .create_oneoff_budget(
            household.group,
            "Summer trip".into(),
            parse_date("2025-07-01"),
            parse_date("2025-07-14"),
            None,
        )
        .await?;

    let hotel = service
        .add_oneoff_item(trip.id, "Hotel".into(), "lodging".into())
        .await?;
    service
        .add_oneoff_option(hotel.id, "Seaside Inn".into(), 85_000)
        .await?;
    service
        .add_oneoff_option(hotel.id, "City Hostel".into(), 32_000)
        .await?;

    let items = service.list_oneoff_items(trip.id).await?;
    assert_eq!(items.len(), 1);

    let options = service.list_item_options(hotel.id).await?;
    assert_eq!(options.len(), 2);
    assert!(options.iter().all(|o| !o.selected));

    Ok(())
}

#[tokio::test]
async fn test_selecting_an_option_deselects_the_rest() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let trip = service
        .create_oneoff_budget(
            household.user,
            "Weekend away".into(),
            parse_date("2025-09-05"),
            parse_date("2025-09-07"),
            None,
        )
        .await?;
    let item = service
        .add_oneoff_item(trip.id, "Transport".into(), "travel".into())
        .await?;

    let train = service
        .add_oneoff_option(item.id, "Train".into(), 9_500)
        .await?;
    let car = service
        .add_oneoff_option(item.id, "Rental car".into(), 14_000)
        .await?;

    service.select_oneoff_option(train.id).await?;
    service.select_oneoff_option(car.id).await?;

    let options = service.list_item_options(item.id).await?;
    let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].id, car.id);

    Ok(())
}

#[tokio::test]
async fn test_oneoff_budget_linked_to_goal() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let household = Household::create(&service).await?;

    let goal = service
        .create_goal(
            household.user,
            "Trip fund".into(),
            200_000,
            parse_date("2025-01-01"),
            parse_date("2025-07-01"),
        )
        .await?;

    let trip = service
        .create_oneoff_budget(
            household.user,
            "Summer trip".into(),
            parse_date("2025-07-01"),
            parse_date("2025-07-14"),
            Some(goal.id),
        )
        .await?;

    assert_eq!(trip.goal_id, Some(goal.id));

    // An unknown goal is rejected
    let result = service
        .create_oneoff_budget(
            household.user,
            "Bad trip".into(),
            parse_date("2025-08-01"),
            parse_date("2025-08-05"),
            Some(Uuid::new_v4()),
        )
        .await;
    assert!(matches!(result, Err(AppError::GoalNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_option_on_unknown_item_fails() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .add_oneoff_option(Uuid::new_v4(), "Ghost".into(), 1_000)
        .await;
    assert!(matches!(result, Err(AppError::OneOffItemNotFound(_))));

    let result = service.select_oneoff_option(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::OneOffOptionNotFound(_))));

    Ok(())
}
