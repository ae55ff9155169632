use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

pub type GroupId = Uuid;

/// A named collection of users sharing expenses.
///
/// The creator becomes an admin member when the group is created. Admins may
/// update the group; only the creator may delete it (which cascades to
/// members, expenses, and settlements).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub description: Option<String>,
    pub created_by: UserId,
    pub is_public: bool,
    /// Optional department scoping (e.g. "CSE") for discoverability
    pub department: Option<String>,
    /// Optional target study years (e.g. [2, 3]) for discoverability
    pub target_years: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn new(name: String, created_by: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description: None,
            created_by,
            is_public: false,
            department: None,
            target_years: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_visibility(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_target_years(mut self, target_years: Vec<i32>) -> Self {
        self.target_years = target_years;
        self
    }
}

/// Partial update for a group; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct GroupPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
    pub department: Option<String>,
    pub target_years: Option<Vec<i32>>,
}

/// A (group, user) membership row.
///
/// Display fields are denormalized from the session identity at join time so
/// member lists render without a profile lookup. A user belongs to a group at
/// most once, and a group keeps at least one admin for its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: Uuid,
    pub group_id: GroupId,
    pub user_id: UserId,
    pub user_email: Option<String>,
    pub user_name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl GroupMember {
    pub fn new(group_id: GroupId, user_id: UserId, user_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            group_id,
            user_id,
            user_email: None,
            user_name,
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }

    pub fn as_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}
