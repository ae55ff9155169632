mod common;

use anyhow::Result;
use common::{TripGroup, identity, register_student, test_service};
use splitledger::application::{AppError, NewGroup};
use splitledger::domain::GroupPatch;

#[tokio::test]
async fn test_create_group_makes_creator_admin() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let creator = identity("Asha");

    let group = service
        .create_group(
            &creator,
            NewGroup {
                name: "Trip".into(),
                description: None,
                is_public: true,
                department: Some("CSE".into()),
                target_years: vec![2, 3],
            },
        )
        .await?;

    assert_eq!(group.created_by, creator.user_id);
    assert!(group.is_public);
    assert_eq!(group.target_years, vec![2, 3]);

    let detail = service.get_group(creator.user_id, group.id).await?;
    assert_eq!(detail.members.len(), 1);
    let member = &detail.members[0];
    assert_eq!(member.user_id, creator.user_id);
    assert!(member.is_admin);
    assert_eq!(member.user_name, "Asha");
    Ok(())
}

#[tokio::test]
async fn test_get_group_requires_membership() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;
    let outsider = identity("Zoya");

    let err = service
        .get_group(outsider.user_id, trip.group_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotAMember));
    Ok(())
}

#[tokio::test]
async fn test_get_groups_lists_memberships() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;

    let outsider = identity("Zoya");
    service
        .create_group(
            &outsider,
            NewGroup {
                name: "Other".into(),
                description: None,
                is_public: false,
                department: None,
                target_years: vec![],
            },
        )
        .await?;

    let member_groups = service.get_groups(trip.member.user_id).await?;
    assert_eq!(member_groups.len(), 1);
    assert_eq!(member_groups[0].id, trip.group_id);

    let outsider_groups = service.get_groups(outsider.user_id).await?;
    assert_eq!(outsider_groups.len(), 1);
    assert_eq!(outsider_groups[0].name, "Other");
    Ok(())
}

#[tokio::test]
async fn test_update_group_requires_admin() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;

    // A regular member cannot update.
    let err = service
        .update_group(
            trip.member.user_id,
            trip.group_id,
            GroupPatch {
                name: Some("Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotAnAdmin));

    // The creator (an admin) can.
    let updated = service
        .update_group(
            trip.creator.user_id,
            trip.group_id,
            GroupPatch {
                name: Some("Renamed".into()),
                description: Some("New description".into()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.description.as_deref(), Some("New description"));
    Ok(())
}

#[tokio::test]
async fn test_delete_group_creator_only() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;

    // Promote the other member to admin; still not the creator.
    service
        .set_member_admin(
            trip.creator.user_id,
            trip.group_id,
            trip.member.user_id,
            true,
        )
        .await?;
    let err = service
        .delete_group(trip.member.user_id, trip.group_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotTheCreator));

    service
        .delete_group(trip.creator.user_id, trip.group_id)
        .await?;
    let err = service
        .get_group(trip.creator.user_id, trip.group_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::GroupNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_delete_group_cascades_to_expenses() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;
    let expense_id = trip
        .equal_expense(
            &service,
            trip.creator.user_id,
            &[trip.creator.user_id, trip.member.user_id],
            30000,
        )
        .await?;

    service
        .delete_group(trip.creator.user_id, trip.group_id)
        .await?;

    let err = service
        .get_expense(trip.creator.user_id, expense_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ExpenseNotFound(_)));

    // The creator's personal expense feed no longer sees it either.
    let expenses = service.get_expenses(trip.creator.user_id).await?;
    assert!(expenses.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_member_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;

    let err = service
        .add_member(
            trip.creator.user_id,
            trip.group_id,
            trip.member.email.as_deref().unwrap(),
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyMember));
    Ok(())
}

#[tokio::test]
async fn test_add_member_requires_registered_student() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let trip = TripGroup::create(&service).await?;

    let err = service
        .add_member(
            trip.creator.user_id,
            trip.group_id,
            "nobody@campus.example",
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StudentNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_classmates_lookup() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let asha = identity("Asha");
    let ravi = identity("Ravi");
    let meena = identity("Meena");
    register_student(&service, &asha, "CSE", 3).await?;
    register_student(&service, &ravi, "CSE", 3).await?;
    register_student(&service, &meena, "ECE", 3).await?;

    let classmates = service.get_classmates(asha.user_id).await;
    assert_eq!(classmates.len(), 1);
    assert_eq!(classmates[0].id, ravi.user_id);

    // Unknown users get an empty list, not an error.
    let unknown = identity("Ghost");
    assert!(service.get_classmates(unknown.user_id).await.is_empty());
    Ok(())
}
