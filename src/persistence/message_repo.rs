//! Message repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::chat::Message;
use crate::models::{format_timestamp, parse_timestamp, EPOCH_FLOOR};
use crate::{AppError, Result};

use super::db::Database;

/// Repository for `messages` rows.
#[derive(Clone)]
pub struct MessageRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    chat_id: String,
    sender_id: String,
    content: Option<String>,
    file_url: Option<String>,
    created_at: String,
}

impl MessageRow {
    fn into_message(self) -> Result<Message> {
        Ok(Message {
            id: self.id,
            chat_id: self.chat_id,
            sender_id: self.sender_id,
            content: self.content,
            file_url: self.file_url,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

impl MessageRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new message.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn insert(&self, message: &Message) -> Result<Message> {
        sqlx::query(
            "INSERT INTO messages (id, chat_id, sender_id, content, file_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&message.id)
        .bind(&message.chat_id)
        .bind(&message.sender_id)
        .bind(&message.content)
        .bind(&message.file_url)
        .bind(format_timestamp(message.created_at))
        .execute(self.db.as_ref())
        .await?;

        Ok(message.clone())
    }

    /// List the messages of a chat, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_for_chat(&self, chat_id: &str) -> Result<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT * FROM messages WHERE chat_id = ?1 ORDER BY created_at ASC",
        )
        .bind(chat_id)
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(MessageRow::into_message).collect()
    }

    /// Count messages in `chat_id` that `reader_id` has not read.
    ///
    /// A message is unread when someone other than the reader sent it after
    /// `since`. An unset `since` counts the whole chat history.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn count_unread(
        &self,
        chat_id: &str,
        reader_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<u64> {
        let floor = since.map_or_else(|| EPOCH_FLOOR.to_owned(), format_timestamp);

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages \
             WHERE chat_id = ?1 AND sender_id != ?2 AND created_at > ?3",
        )
        .bind(chat_id)
        .bind(reader_id)
        .bind(&floor)
        .fetch_one(self.db.as_ref())
        .await?;

        u64::try_from(count).map_err(|e| AppError::Db(format!("negative unread count: {e}")))
    }
}
