//! Employee profile model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An employee profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Unique record identifier, shared with the auth user id.
    pub id: String,
    /// Display name; may be unset for freshly invited users.
    pub full_name: Option<String>,
    /// Contact e-mail.
    pub email: Option<String>,
    /// Department the employee belongs to.
    pub department: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Construct a profile with a generated identifier.
    #[must_use]
    pub fn new(
        full_name: Option<String>,
        email: Option<String>,
        department: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            full_name,
            email,
            department,
            created_at: Utc::now(),
        }
    }
}
