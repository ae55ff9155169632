// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::Utc;
use splitledger::application::{ExpenseService, Identity, NewExpense, NewGroup, NewSettlement};
use splitledger::domain::{Cents, GroupId, ShareSpec, SplitType, Student, UserId};
use tempfile::TempDir;
use uuid::Uuid;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(ExpenseService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = ExpenseService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// A fresh identity with a derived email, as the session provider would
/// supply it.
pub fn identity(name: &str) -> Identity {
    Identity {
        user_id: Uuid::new_v4(),
        email: Some(format!("{}@campus.example", name.to_lowercase())),
        full_name: Some(name.to_string()),
    }
}

/// Register a student profile matching an identity, so email-based member
/// invitations can resolve it.
pub async fn register_student(
    service: &ExpenseService,
    who: &Identity,
    department: &str,
    year: i32,
) -> Result<Student> {
    let student = Student {
        id: who.user_id,
        full_name: who.full_name.clone().unwrap_or_else(|| "Unknown".into()),
        email: who.email.clone().unwrap_or_else(|| "unknown@campus.example".into()),
        department: department.to_string(),
        year,
        avatar_url: None,
        created_at: Utc::now(),
    };
    service.save_student(&student).await?;
    Ok(student)
}

/// Test fixture: a group with a creator and one invited member.
pub struct TripGroup {
    pub group_id: GroupId,
    pub creator: Identity,
    pub member: Identity,
}

impl TripGroup {
    /// Create group "Trip" owned by A, with B added as a regular member.
    pub async fn create(service: &ExpenseService) -> Result<Self> {
        let creator = identity("Asha");
        let member = identity("Ravi");
        register_student(service, &creator, "CSE", 3).await?;
        register_student(service, &member, "CSE", 3).await?;

        let group = service
            .create_group(
                &creator,
                NewGroup {
                    name: "Trip".into(),
                    description: Some("Shared trip costs".into()),
                    is_public: false,
                    department: None,
                    target_years: vec![],
                },
            )
            .await?;
        service
            .add_member(
                creator.user_id,
                group.id,
                member.email.as_deref().unwrap(),
                false,
            )
            .await?;

        Ok(Self {
            group_id: group.id,
            creator,
            member,
        })
    }

    /// Record an EQUAL-split expense paid by `payer` and shared among
    /// `sharers`, returning the expense id.
    pub async fn equal_expense(
        &self,
        service: &ExpenseService,
        payer: UserId,
        sharers: &[UserId],
        amount_cents: Cents,
    ) -> Result<Uuid> {
        let detail = service
            .create_expense(
                payer,
                NewExpense {
                    group_id: Some(self.group_id),
                    description: "Dinner".into(),
                    amount_cents,
                    split_type: SplitType::Equal,
                    category: None,
                    notes: None,
                    payment_date: None,
                    shares: sharers.iter().map(|&u| ShareSpec::even(u)).collect(),
                },
            )
            .await?;
        Ok(detail.expense.id)
    }

    /// Record a completed settlement from `from` to `to`.
    pub async fn settle(
        &self,
        service: &ExpenseService,
        from: UserId,
        to: UserId,
        amount_cents: Cents,
    ) -> Result<Uuid> {
        let settlement = service
            .create_settlement(
                from,
                NewSettlement {
                    group_id: self.group_id,
                    to_user_id: to,
                    amount_cents,
                    notes: None,
                    status: None,
                },
            )
            .await?;
        Ok(settlement.id)
    }
}
