//! Profile repository for `SQLite` persistence.

use std::sync::Arc;

use crate::models::profile::Profile;
use crate::models::{format_timestamp, parse_timestamp};
use crate::Result;

use super::db::Database;

/// Repository for `profiles` rows.
#[derive(Clone)]
pub struct ProfileRepo {
    db: Arc<Database>,
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: String,
    full_name: Option<String>,
    email: Option<String>,
    department: Option<String>,
    created_at: String,
}

impl ProfileRow {
    fn into_profile(self) -> Result<Profile> {
        Ok(Profile {
            id: self.id,
            full_name: self.full_name,
            email: self.email,
            department: self.department,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

impl ProfileRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new profile.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn create(&self, profile: &Profile) -> Result<Profile> {
        sqlx::query(
            "INSERT INTO profiles (id, full_name, email, department, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&profile.id)
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(&profile.department)
        .bind(format_timestamp(profile.created_at))
        .execute(self.db.as_ref())
        .await?;

        Ok(profile.clone())
    }

    /// Retrieve a profile by its ID.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Profile>> {
        let row: Option<ProfileRow> = sqlx::query_as("SELECT * FROM profiles WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(ProfileRow::into_profile).transpose()
    }
}
