//! Chat and membership repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::chat::{Chat, ChatMembership};
use crate::models::{format_timestamp, parse_timestamp};
use crate::Result;

use super::db::Database;

/// Repository for `chats` and `chat_members` rows.
#[derive(Clone)]
pub struct ChatRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct ChatRow {
    id: String,
    name: Option<String>,
    created_at: String,
}

impl ChatRow {
    fn into_chat(self) -> Result<Chat> {
        Ok(Chat {
            id: self.id,
            name: self.name,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    chat_id: String,
    user_id: String,
    last_read_at: Option<String>,
    joined_at: String,
}

impl MembershipRow {
    fn into_membership(self) -> Result<ChatMembership> {
        let last_read_at = self
            .last_read_at
            .as_deref()
            .map(|raw| parse_timestamp("last_read_at", raw))
            .transpose()?;

        Ok(ChatMembership {
            chat_id: self.chat_id,
            user_id: self.user_id,
            last_read_at,
            joined_at: parse_timestamp("joined_at", &self.joined_at)?,
        })
    }
}

impl ChatRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new chat record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn create(&self, chat: &Chat) -> Result<Chat> {
        sqlx::query("INSERT INTO chats (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&chat.id)
            .bind(&chat.name)
            .bind(format_timestamp(chat.created_at))
            .execute(self.db.as_ref())
            .await?;

        Ok(chat.clone())
    }

    /// Retrieve a chat by its ID.
    ///
    /// Returns `Ok(None)` if the chat does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Chat>> {
        let row: Option<ChatRow> = sqlx::query_as("SELECT * FROM chats WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(ChatRow::into_chat).transpose()
    }

    /// Add a membership row. Re-adding an existing member is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn add_member(&self, membership: &ChatMembership) -> Result<()> {
        let last_read_at = membership.last_read_at.map(format_timestamp);

        sqlx::query(
            "INSERT OR IGNORE INTO chat_members (chat_id, user_id, last_read_at, joined_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&membership.chat_id)
        .bind(&membership.user_id)
        .bind(&last_read_at)
        .bind(format_timestamp(membership.joined_at))
        .execute(self.db.as_ref())
        .await?;

        Ok(())
    }

    /// Retrieve the membership of `user_id` in `chat_id`, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_membership(
        &self,
        chat_id: &str,
        user_id: &str,
    ) -> Result<Option<ChatMembership>> {
        let row: Option<MembershipRow> =
            sqlx::query_as("SELECT * FROM chat_members WHERE chat_id = ?1 AND user_id = ?2")
                .bind(chat_id)
                .bind(user_id)
                .fetch_optional(self.db.as_ref())
                .await?;

        row.map(MembershipRow::into_membership).transpose()
    }

    /// List every membership held by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<ChatMembership>> {
        let rows: Vec<MembershipRow> = sqlx::query_as(
            "SELECT * FROM chat_members WHERE user_id = ?1 ORDER BY joined_at ASC",
        )
        .bind(user_id)
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(MembershipRow::into_membership).collect()
    }

    /// Advance the read marker of a membership to `at`.
    ///
    /// The marker never moves backward: an `at` older than the stored value
    /// leaves the row unchanged. Returns the membership as stored after the
    /// call, or `None` when the user is not a member.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update or follow-up read fails.
    pub async fn mark_read(
        &self,
        chat_id: &str,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ChatMembership>> {
        sqlx::query(
            "UPDATE chat_members SET last_read_at = ?3 \
             WHERE chat_id = ?1 AND user_id = ?2 \
             AND (last_read_at IS NULL OR last_read_at < ?3)",
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(format_timestamp(at))
        .execute(self.db.as_ref())
        .await?;

        self.get_membership(chat_id, user_id).await
    }
}
