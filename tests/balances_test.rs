mod common;

use anyhow::Result;
use common::{TripGroup, identity, test_service};
use splitledger::application::AppError;
use splitledger::domain::{Cents, UserBalance};

fn balance_of(balances: &[UserBalance], user_id: uuid::Uuid) -> &UserBalance {
    balances
        .iter()
        .find(|b| b.user_id == user_id)
        .expect("balance for user")
}

#[tokio::test]
async fn test_fresh_group_has_zero_balances() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;

    let balances = service
        .get_balances(trip.creator.user_id, trip.group_id, None)
        .await?;
    assert_eq!(balances.len(), 2);
    for balance in &balances {
        assert_eq!(balance.net_balance, 0);
        assert_eq!(balance.you_owe, 0);
        assert_eq!(balance.you_are_owed, 0);
    }
    Ok(())
}

#[tokio::test]
async fn test_dinner_scenario_end_to_end() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;
    let (a, b) = (trip.creator.user_id, trip.member.user_id);

    // A fronts 300.00 for dinner, split equally with B.
    trip.equal_expense(&service, a, &[a, b], 30000).await?;

    let balances = service.get_balances(a, trip.group_id, None).await?;
    assert_eq!(balance_of(&balances, a).you_are_owed, 15000);
    assert_eq!(balance_of(&balances, a).you_owe, 0);
    assert_eq!(balance_of(&balances, b).you_owe, 15000);
    assert_eq!(balance_of(&balances, b).net_balance, -15000);

    // B pays A back in full; everyone nets to zero.
    trip.settle(&service, b, a, 15000).await?;
    let balances = service.get_balances(a, trip.group_id, None).await?;
    for balance in &balances {
        assert_eq!(balance.net_balance, 0);
    }
    Ok(())
}

#[tokio::test]
async fn test_non_member_gets_forbidden() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;
    let outsider = identity("Zoya");

    let err = service
        .get_balances(outsider.user_id, trip.group_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotAMember));
    Ok(())
}

#[tokio::test]
async fn test_single_user_balance_query() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;
    let (a, b) = (trip.creator.user_id, trip.member.user_id);
    trip.equal_expense(&service, a, &[a, b], 30000).await?;

    let balances = service.get_balances(a, trip.group_id, Some(b)).await?;
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].user_id, b);
    assert_eq!(balances[0].you_owe, 15000);

    // Asking for someone outside the group yields no record.
    let outsider = identity("Zoya");
    let balances = service
        .get_balances(a, trip.group_id, Some(outsider.user_id))
        .await?;
    assert!(balances.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_balances_sum_to_zero_across_many_expenses() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;
    let (a, b) = (trip.creator.user_id, trip.member.user_id);

    // Uneven totals in both directions plus a partial repayment.
    trip.equal_expense(&service, a, &[a, b], 10001).await?;
    trip.equal_expense(&service, b, &[a, b], 7333).await?;
    trip.settle(&service, b, a, 1000).await?;

    let balances = service.get_balances(a, trip.group_id, None).await?;
    let total: Cents = balances.iter().map(|b| b.net_balance).sum();
    assert_eq!(total, 0, "group ledger must be closed");
    Ok(())
}
