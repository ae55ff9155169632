use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// A student profile, maintained by the surrounding registration system.
/// Stored here so member invitations (by email) and classmate lookups can
/// resolve without a remote call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub year: i32,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Student {
    pub fn new(full_name: String, email: String, department: String, year: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            full_name,
            email,
            department,
            year,
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }
}

/// The trimmed-down view returned by the classmate lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classmate {
    pub id: UserId,
    pub full_name: String,
    pub avatar_url: Option<String>,
}

impl From<Student> for Classmate {
    fn from(student: Student) -> Self {
        Self {
            id: student.id,
            full_name: student.full_name,
            avatar_url: student.avatar_url,
        }
    }
}
