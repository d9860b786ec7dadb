//! Per-event reactions of the notification listener.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::chat::{ChatMembership, Message};
use crate::notify::{Notice, Notifier};
use crate::persistence::chat_repo::ChatRepo;
use crate::persistence::profile_repo::ProfileRepo;
use crate::unread::UnreadBadge;

/// Shown when the sender's profile has no name or cannot be read.
pub(crate) const UNKNOWN_SENDER: &str = "Неизвестный";
/// Shown when the chat has no name or cannot be read.
pub(crate) const UNKNOWN_CHAT: &str = "чате";

/// What the listener did with an inserted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDisposition {
    /// The viewer wrote it.
    OwnMessage,
    /// The viewer is not in that chat (or membership could not be checked).
    NotMember,
    /// Cue played (best effort), notice shown, badge refreshed.
    Notified {
        /// Resolved sender display name.
        sender: String,
        /// Resolved chat display name.
        chat: String,
    },
}

pub(crate) struct EventHandler {
    pub(crate) user_id: String,
    pub(crate) chats: ChatRepo,
    pub(crate) profiles: ProfileRepo,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) badge: Arc<UnreadBadge>,
    pub(crate) notice_duration_ms: u64,
}

impl EventHandler {
    pub(crate) async fn on_message(&self, message: &Message) -> MessageDisposition {
        if message.sender_id == self.user_id {
            return MessageDisposition::OwnMessage;
        }

        match self.chats.get_membership(&message.chat_id, &self.user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return MessageDisposition::NotMember,
            Err(err) => {
                warn!(%err, chat_id = %message.chat_id, "membership lookup failed");
                return MessageDisposition::NotMember;
            }
        }

        let sender = self.sender_name(&message.sender_id).await;
        let chat = self.chat_name(&message.chat_id).await;

        if let Err(err) = self.notifier.play_cue().await {
            warn!(%err, "failed to play message cue");
        }

        let notice = Notice::new_message(&sender, message.preview(), self.notice_duration_ms);
        if let Err(err) = self.notifier.notify(&notice).await {
            warn!(%err, "failed to show message notice");
        }
        debug!(%sender, %chat, "new message notice shown");

        let _ = self.badge.refresh(Some(&self.user_id)).await;

        MessageDisposition::Notified { sender, chat }
    }

    /// Refresh the badge when the viewer's own read marker moved.
    pub(crate) async fn on_membership_updated(&self, membership: &ChatMembership) -> bool {
        if membership.user_id != self.user_id {
            return false;
        }
        let _ = self.badge.refresh(Some(&self.user_id)).await;
        true
    }

    async fn sender_name(&self, sender_id: &str) -> String {
        let name = match self.profiles.get_by_id(sender_id).await {
            Ok(Some(profile)) => profile.full_name.filter(|name| !name.is_empty()),
            Ok(None) => None,
            Err(err) => {
                warn!(%err, sender_id, "sender lookup failed");
                None
            }
        };
        name.unwrap_or_else(|| UNKNOWN_SENDER.to_owned())
    }

    async fn chat_name(&self, chat_id: &str) -> String {
        let name = match self.chats.get_by_id(chat_id).await {
            Ok(Some(chat)) => chat.name.filter(|name| !name.is_empty()),
            Ok(None) => None,
            Err(err) => {
                warn!(%err, chat_id, "chat lookup failed");
                None
            }
        };
        name.unwrap_or_else(|| UNKNOWN_CHAT.to_owned())
    }
}
