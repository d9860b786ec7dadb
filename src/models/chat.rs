//! Chat, membership, and message models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named conversation between employees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chat {
    /// Unique record identifier.
    pub id: String,
    /// Display name shown in notices.
    pub name: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Chat {
    /// Construct a new chat with a generated identifier.
    #[must_use]
    pub fn new(name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: Utc::now(),
        }
    }
}

/// A user's association with a chat, tracking how far they have read.
///
/// One row per `(chat_id, user_id)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMembership {
    /// Chat the user belongs to.
    pub chat_id: String,
    /// Member user identifier.
    pub user_id: String,
    /// Messages created after this instant are unread; `None` means never read.
    pub last_read_at: Option<DateTime<Utc>>,
    /// When the user joined the chat.
    pub joined_at: DateTime<Utc>,
}

impl ChatMembership {
    /// Construct a membership that has never been read.
    #[must_use]
    pub fn new(chat_id: String, user_id: String) -> Self {
        Self {
            chat_id,
            user_id,
            last_read_at: None,
            joined_at: Utc::now(),
        }
    }
}

/// A chat message. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique record identifier.
    pub id: String,
    /// Chat the message was posted to.
    pub chat_id: String,
    /// Author user identifier.
    pub sender_id: String,
    /// Text body; `None` for attachment-only messages.
    pub content: Option<String>,
    /// Attachment location, if any.
    pub file_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Construct a new message stamped with the current time.
    #[must_use]
    pub fn new(
        chat_id: String,
        sender_id: String,
        content: Option<String>,
        file_url: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            chat_id,
            sender_id,
            content,
            file_url,
            created_at: Utc::now(),
        }
    }

    /// Text used in notice bodies; attachment-only messages show `[file]`.
    #[must_use]
    pub fn preview(&self) -> &str {
        match self.content.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => "[file]",
        }
    }
}

/// Unread count for a single chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatUnread {
    /// Chat identifier.
    pub chat_id: String,
    /// Messages from other members newer than the read marker.
    pub unread: u64,
}
