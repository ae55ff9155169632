use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, GroupId, UserId};

pub type SettlementId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    Pending,
    Completed,
    Cancelled,
}

impl SettlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementStatus::Pending => "pending",
            SettlementStatus::Completed => "completed",
            SettlementStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(SettlementStatus::Pending),
            "completed" => Some(SettlementStatus::Completed),
            "cancelled" => Some(SettlementStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded real-world repayment between two users of a group.
///
/// Only completed settlements enter balance computations. Creating a
/// settlement does not flip the participants' `is_settled` flags; the two are
/// maintained independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub id: SettlementId,
    pub group_id: GroupId,
    /// The user paying back
    pub from_user_id: UserId,
    /// The user being repaid
    pub to_user_id: UserId,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    pub status: SettlementStatus,
    pub notes: Option<String>,
    pub settled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Settlement {
    /// Create a completed settlement; recording one means the repayment
    /// already happened in the real world.
    pub fn new(group_id: GroupId, from_user_id: UserId, to_user_id: UserId, amount_cents: Cents) -> Self {
        assert!(amount_cents > 0, "Settlement amount must be positive");
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            group_id,
            from_user_id,
            to_user_id,
            amount_cents,
            status: SettlementStatus::Completed,
            notes: None,
            settled_at: Some(now),
            created_at: now,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_status(mut self, status: SettlementStatus) -> Self {
        self.settled_at = match status {
            SettlementStatus::Completed => self.settled_at.or(Some(Utc::now())),
            _ => None,
        };
        self.status = status;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == SettlementStatus::Completed
    }
}
