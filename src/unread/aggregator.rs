//! Unread-count aggregation over a user's chat memberships.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::models::chat::ChatUnread;
use crate::persistence::chat_repo::ChatRepo;
use crate::persistence::db::Database;
use crate::persistence::message_repo::MessageRepo;
use crate::Result;

/// Anything that can compute a user's total unread count.
///
/// [`UnreadBadge`](super::UnreadBadge) depends on this seam rather than on
/// the database directly.
pub trait UnreadSource: Send + Sync {
    /// Total unread messages for `user_id` across all of their chats.
    ///
    /// # Errors
    ///
    /// Returns the first query failure encountered.
    fn count_unread<'a>(
        &'a self,
        user_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<u64>> + Send + 'a>>;
}

/// Sums per-chat unread counts for a user.
///
/// Issues one membership query, then one count query per membership. The
/// total is not a single snapshot: messages may land between queries.
#[derive(Clone)]
pub struct UnreadAggregator {
    chats: ChatRepo,
    messages: MessageRepo,
}

impl UnreadAggregator {
    /// Create an aggregator over the shared database.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            chats: ChatRepo::new(Arc::clone(&db)),
            messages: MessageRepo::new(db),
        }
    }

    /// Unread count for each chat `user_id` belongs to.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if any query fails.
    pub async fn breakdown(&self, user_id: &str) -> Result<Vec<ChatUnread>> {
        let memberships = self.chats.list_for_user(user_id).await?;
        let mut per_chat = Vec::with_capacity(memberships.len());

        for membership in memberships {
            let unread = self
                .messages
                .count_unread(&membership.chat_id, user_id, membership.last_read_at)
                .await?;
            per_chat.push(ChatUnread {
                chat_id: membership.chat_id,
                unread,
            });
        }

        Ok(per_chat)
    }

    /// Total unread count for `user_id`.
    ///
    /// Returns `Ok(None)` without querying when no user is given.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if any query fails.
    pub async fn count(&self, user_id: Option<&str>) -> Result<Option<u64>> {
        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let total = self
            .breakdown(user_id)
            .await?
            .iter()
            .map(|chat| chat.unread)
            .sum();
        debug!(user_id, total, "unread count aggregated");
        Ok(Some(total))
    }
}

impl UnreadSource for UnreadAggregator {
    fn count_unread<'a>(
        &'a self,
        user_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<u64>> + Send + 'a>> {
        Box::pin(async move { Ok(self.count(Some(user_id)).await?.unwrap_or(0)) })
    }
}
