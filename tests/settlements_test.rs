mod common;

use anyhow::Result;
use common::{TripGroup, identity, test_service};
use splitledger::application::{AppError, NewSettlement};
use splitledger::domain::SettlementStatus;

#[tokio::test]
async fn test_settlement_reduces_debt_by_exact_amount() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;
    let (a, b) = (trip.creator.user_id, trip.member.user_id);
    trip.equal_expense(&service, a, &[a, b], 30000).await?;

    // Partial repayment of 50.00 out of the 150.00 owed.
    trip.settle(&service, b, a, 5000).await?;

    let balances = service.get_balances(a, trip.group_id, Some(b)).await?;
    assert_eq!(balances[0].you_owe, 10000);
    Ok(())
}

#[tokio::test]
async fn test_settlement_cannot_exceed_outstanding_debt() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;
    let (a, b) = (trip.creator.user_id, trip.member.user_id);
    trip.equal_expense(&service, a, &[a, b], 30000).await?;

    // Repaying in full works once.
    trip.settle(&service, b, a, 15000).await?;

    // Replaying the identical settlement overdraws and is rejected.
    let err = trip.settle(&service, b, a, 15000).await.unwrap_err();
    let err = err.downcast::<AppError>()?;
    assert!(matches!(err, AppError::SettlementExceedsDebt { .. }));
    Ok(())
}

#[tokio::test]
async fn test_settlement_recipient_must_be_member() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;
    let (a, b) = (trip.creator.user_id, trip.member.user_id);
    trip.equal_expense(&service, a, &[a, b], 30000).await?;

    let outsider = identity("Zoya");
    let err = trip
        .settle(&service, b, outsider.user_id, 5000)
        .await
        .unwrap_err();
    let err = err.downcast::<AppError>()?;
    assert!(matches!(err, AppError::RecipientNotAMember));
    Ok(())
}

#[tokio::test]
async fn test_pending_settlement_leaves_balances_untouched() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;
    let (a, b) = (trip.creator.user_id, trip.member.user_id);
    trip.equal_expense(&service, a, &[a, b], 30000).await?;

    let settlement = service
        .create_settlement(
            b,
            NewSettlement {
                group_id: trip.group_id,
                to_user_id: a,
                amount_cents: 15000,
                notes: Some("will pay after the weekend".into()),
                status: Some(SettlementStatus::Pending),
            },
        )
        .await?;
    assert_eq!(settlement.status, SettlementStatus::Pending);
    assert!(settlement.settled_at.is_none());

    let balances = service.get_balances(a, trip.group_id, Some(b)).await?;
    assert_eq!(balances[0].you_owe, 15000);
    Ok(())
}

#[tokio::test]
async fn test_settlement_listing_requires_membership() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;
    let (a, b) = (trip.creator.user_id, trip.member.user_id);
    trip.equal_expense(&service, a, &[a, b], 30000).await?;
    trip.settle(&service, b, a, 5000).await?;

    let settlements = service.get_group_settlements(a, trip.group_id).await?;
    assert_eq!(settlements.len(), 1);
    assert_eq!(settlements[0].amount_cents, 5000);

    let outsider = identity("Zoya");
    let err = service
        .get_group_settlements(outsider.user_id, trip.group_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotAMember));
    Ok(())
}

#[tokio::test]
async fn test_only_payer_deletes_settlement() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;
    let (a, b) = (trip.creator.user_id, trip.member.user_id);
    trip.equal_expense(&service, a, &[a, b], 30000).await?;
    let settlement_id = trip.settle(&service, b, a, 15000).await?;

    let err = service
        .delete_settlement(a, settlement_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotThePayer));

    service.delete_settlement(b, settlement_id).await?;

    // Deleting the settlement restores the original debt.
    let balances = service.get_balances(a, trip.group_id, Some(b)).await?;
    assert_eq!(balances[0].you_owe, 15000);
    Ok(())
}

#[tokio::test]
async fn test_negative_settlement_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;
    let (a, b) = (trip.creator.user_id, trip.member.user_id);
    trip.equal_expense(&service, a, &[a, b], 30000).await?;

    let err = service
        .create_settlement(
            b,
            NewSettlement {
                group_id: trip.group_id,
                to_user_id: a,
                amount_cents: 0,
                notes: None,
                status: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidAmount(_)));
    Ok(())
}
