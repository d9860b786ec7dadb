//! Chat write operations that feed the change feed.
//!
//! Every successful write publishes the matching [`ChangeEvent`] so that
//! listeners in this process see it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::feed::{ChangeEvent, LocalFeed};
use crate::models::chat::{ChatMembership, Message};
use crate::persistence::chat_repo::ChatRepo;
use crate::persistence::db::Database;
use crate::persistence::message_repo::MessageRepo;
use crate::{AppError, Result};

/// Sends messages, moves read markers, and manages memberships.
#[derive(Clone)]
pub struct Messenger {
    chats: ChatRepo,
    messages: MessageRepo,
    feed: LocalFeed,
}

impl Messenger {
    /// Create a messenger publishing to `feed`.
    #[must_use]
    pub fn new(db: Arc<Database>, feed: LocalFeed) -> Self {
        Self {
            chats: ChatRepo::new(Arc::clone(&db)),
            messages: MessageRepo::new(db),
            feed,
        }
    }

    /// Add `user_id` to `chat_id`. Joining twice keeps the first membership.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the chat does not exist, or
    /// `AppError::Db` on persistence failure.
    pub async fn join_chat(&self, chat_id: &str, user_id: &str) -> Result<ChatMembership> {
        if self.chats.get_by_id(chat_id).await?.is_none() {
            return Err(AppError::NotFound(format!("chat {chat_id}")));
        }

        self.chats
            .add_member(&ChatMembership::new(chat_id.to_owned(), user_id.to_owned()))
            .await?;
        self.chats
            .get_membership(chat_id, user_id)
            .await?
            .ok_or_else(|| AppError::Db("membership missing after insert".into()))
    }

    /// Post a message as `sender_id` and publish it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` if the sender is not a member of the
    /// chat, or `AppError::Db` on persistence failure.
    pub async fn send_message(
        &self,
        chat_id: &str,
        sender_id: &str,
        content: Option<String>,
        file_url: Option<String>,
    ) -> Result<Message> {
        if self.chats.get_membership(chat_id, sender_id).await?.is_none() {
            return Err(AppError::Unauthorized(format!(
                "{sender_id} is not a member of chat {chat_id}"
            )));
        }

        let message = self
            .messages
            .insert(&Message::new(
                chat_id.to_owned(),
                sender_id.to_owned(),
                content,
                file_url,
            ))
            .await?;

        let delivered = self.feed.publish(ChangeEvent::MessageInserted(message.clone()));
        debug!(message_id = %message.id, chat_id, delivered, "message sent");
        Ok(message)
    }

    /// Move the read marker of `user_id` in `chat_id` to `at` and publish
    /// the updated membership.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user is not a member, or
    /// `AppError::Db` on persistence failure.
    pub async fn mark_read(
        &self,
        chat_id: &str,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<ChatMembership> {
        let membership = self
            .chats
            .mark_read(chat_id, user_id, at)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("membership {chat_id}/{user_id}")))?;

        self.feed
            .publish(ChangeEvent::MembershipUpdated(membership.clone()));
        info!(chat_id, user_id, "chat marked read");
        Ok(membership)
    }
}
