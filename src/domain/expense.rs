use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, GroupId, UserId};

pub type ExpenseId = Uuid;

/// The rule used to divide an expense among its participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SplitType {
    /// Divide the total evenly; remainder cents go to the earliest shares
    Equal,
    /// Each share carries an explicit amount; the sum must equal the total
    Exact,
    /// Shares are percentages in basis points, summing to 100%
    Percentage,
    /// Shares are positive integer weights
    Shares,
}

impl SplitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitType::Equal => "EQUAL",
            SplitType::Exact => "EXACT",
            SplitType::Percentage => "PERCENTAGE",
            SplitType::Shares => "SHARES",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EQUAL" => Some(SplitType::Equal),
            "EXACT" => Some(SplitType::Exact),
            "PERCENTAGE" => Some(SplitType::Percentage),
            "SHARES" => Some(SplitType::Shares),
            _ => None,
        }
    }
}

impl std::fmt::Display for SplitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A shared expense fronted by one user.
///
/// `group_id` is nullable: personal expenses belong to no group and never
/// enter group balance computations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    /// The user who fronted the money
    pub paid_by: UserId,
    pub group_id: Option<GroupId>,
    pub split_type: SplitType,
    pub category: Option<String>,
    pub notes: Option<String>,
    /// When the payment happened in the real world
    pub payment_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(description: String, amount_cents: Cents, paid_by: UserId) -> Self {
        assert!(amount_cents > 0, "Expense amount must be positive");
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            description,
            amount_cents,
            paid_by,
            group_id: None,
            split_type: SplitType::Equal,
            category: None,
            notes: None,
            payment_date: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_split_type(mut self, split_type: SplitType) -> Self {
        self.split_type = split_type;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_payment_date(mut self, payment_date: DateTime<Utc>) -> Self {
        self.payment_date = payment_date;
        self
    }
}

/// A user owing a share of a specific expense.
///
/// The sum of `amount_owed_cents` across an expense's participants always
/// equals the expense amount; the split calculator guarantees this at
/// construction time. The `is_settled` flag is maintained independently of
/// settlement rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseParticipant {
    pub id: Uuid,
    pub expense_id: ExpenseId,
    pub user_id: UserId,
    pub amount_owed_cents: Cents,
    pub is_settled: bool,
    pub created_at: DateTime<Utc>,
}

impl ExpenseParticipant {
    pub fn new(expense_id: ExpenseId, user_id: UserId, amount_owed_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            expense_id,
            user_id,
            amount_owed_cents,
            is_settled: false,
            created_at: Utc::now(),
        }
    }
}

/// An expense together with its participant rows, as returned by reads.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseDetail {
    pub expense: Expense,
    pub participants: Vec<ExpenseParticipant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_type_roundtrip() {
        for st in [
            SplitType::Equal,
            SplitType::Exact,
            SplitType::Percentage,
            SplitType::Shares,
        ] {
            assert_eq!(SplitType::from_str(st.as_str()), Some(st));
        }
        assert_eq!(SplitType::from_str("HALVES"), None);
    }

    #[test]
    fn test_create_expense() {
        let payer = Uuid::new_v4();
        let group = Uuid::new_v4();
        let expense = Expense::new("Dinner".into(), 30000, payer)
            .with_group(group)
            .with_category("food");

        assert_eq!(expense.amount_cents, 30000);
        assert_eq!(expense.paid_by, payer);
        assert_eq!(expense.group_id, Some(group));
        assert_eq!(expense.split_type, SplitType::Equal);
        assert_eq!(expense.category.as_deref(), Some("food"));
    }

    #[test]
    #[should_panic(expected = "Expense amount must be positive")]
    fn test_expense_requires_positive_amount() {
        Expense::new("Dinner".into(), 0, Uuid::new_v4());
    }

    #[test]
    fn test_participant_starts_unsettled() {
        let participant = ExpenseParticipant::new(Uuid::new_v4(), Uuid::new_v4(), 1500);
        assert!(!participant.is_settled);
        assert_eq!(participant.amount_owed_cents, 1500);
    }
}
