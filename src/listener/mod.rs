//! Live notification listener.
//!
//! While a user is set, the listener holds exactly two change-feed
//! subscriptions: message inserts and membership updates. Incoming messages
//! from other members of the user's chats raise a cue and a notice and
//! refresh the unread badge; read-marker updates on the user's own
//! memberships refresh the badge.
//!
//! ```text
//! Unsubscribed --start(user)--> Subscribed --stop / set_user(None) / drop--> Unsubscribed
//! ```

mod handler;

pub use handler::MessageDisposition;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::feed::{ChangeEvent, ChangeFeed, FeedFilter, Subscription};
use crate::notify::Notifier;
use crate::persistence::chat_repo::ChatRepo;
use crate::persistence::db::Database;
use crate::persistence::profile_repo::ProfileRepo;
use crate::unread::UnreadBadge;
use crate::Result;

use handler::EventHandler;

/// Observable lifecycle state of a [`NotificationListener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerState {
    /// No subscriptions held.
    Unsubscribed,
    /// Both subscriptions open for this user.
    Subscribed {
        /// User the listener is watching for.
        user_id: String,
    },
}

struct ActiveSession {
    user_id: String,
    cancel: CancellationToken,
    join_handle: JoinHandle<()>,
}

/// Owns the feed subscriptions for one viewing user.
pub struct NotificationListener {
    feed: Arc<dyn ChangeFeed>,
    notifier: Arc<dyn Notifier>,
    badge: Arc<UnreadBadge>,
    chats: ChatRepo,
    profiles: ProfileRepo,
    notice_duration_ms: u64,
    session: Option<ActiveSession>,
}

impl NotificationListener {
    /// Build an unsubscribed listener.
    #[must_use]
    pub fn new(
        db: Arc<Database>,
        feed: Arc<dyn ChangeFeed>,
        notifier: Arc<dyn Notifier>,
        badge: Arc<UnreadBadge>,
        notice_duration_ms: u64,
    ) -> Self {
        Self {
            feed,
            notifier,
            badge,
            chats: ChatRepo::new(Arc::clone(&db)),
            profiles: ProfileRepo::new(db),
            notice_duration_ms,
            session: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ListenerState {
        match &self.session {
            Some(session) if !session.join_handle.is_finished() => ListenerState::Subscribed {
                user_id: session.user_id.clone(),
            },
            _ => ListenerState::Unsubscribed,
        }
    }

    /// The badge this listener keeps fresh.
    #[must_use]
    pub fn badge(&self) -> &Arc<UnreadBadge> {
        &self.badge
    }

    /// Switch the watched user.
    ///
    /// `None` releases both subscriptions. A different user releases the
    /// old pair before opening a new one. The same user is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Feed` if a subscription cannot be opened; the
    /// listener is left unsubscribed.
    pub async fn set_user(&mut self, user_id: Option<&str>) -> Result<()> {
        let unchanged = matches!(
            (&self.session, user_id),
            (Some(current), Some(next)) if current.user_id == next
        );
        if unchanged {
            return Ok(());
        }

        self.stop().await;
        match user_id {
            Some(next) => self.start(next).await,
            None => Ok(()),
        }
    }

    /// Open both subscriptions for `user_id` and start handling events.
    ///
    /// Any previous session is stopped and its event loop awaited first,
    /// so the old user's handler never runs alongside the new one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Feed` if a subscription cannot be opened.
    pub async fn start(&mut self, user_id: &str) -> Result<()> {
        self.stop().await;

        let messages = self.feed.subscribe(FeedFilter::MESSAGE_INSERTS)?;
        let memberships = self.feed.subscribe(FeedFilter::MEMBERSHIP_UPDATES)?;

        let handler = EventHandler {
            user_id: user_id.to_owned(),
            chats: self.chats.clone(),
            profiles: self.profiles.clone(),
            notifier: Arc::clone(&self.notifier),
            badge: Arc::clone(&self.badge),
            notice_duration_ms: self.notice_duration_ms,
        };
        let cancel = CancellationToken::new();
        let join_handle = tokio::spawn(
            run(handler, messages, memberships, cancel.clone())
                .instrument(info_span!("notification_listener", user_id)),
        );

        info!(user_id, "notification listener subscribed");
        self.session = Some(ActiveSession {
            user_id: user_id.to_owned(),
            cancel,
            join_handle,
        });
        Ok(())
    }

    /// Release both subscriptions and wait for the event loop to exit.
    pub async fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.cancel();
            let _ = session.join_handle.await;
            info!(user_id = %session.user_id, "notification listener unsubscribed");
        }
    }
}

impl Drop for NotificationListener {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.cancel.cancel();
        }
    }
}

async fn run(
    handler: EventHandler,
    mut messages: Subscription,
    mut memberships: Subscription,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            event = messages.recv() => match event {
                Some(ChangeEvent::MessageInserted(message)) => {
                    let disposition = handler.on_message(&message).await;
                    debug!(message_id = %message.id, ?disposition, "message event handled");
                }
                Some(ChangeEvent::MembershipUpdated(_)) => {}
                None => break,
            },
            event = memberships.recv() => match event {
                Some(ChangeEvent::MembershipUpdated(membership)) => {
                    handler.on_membership_updated(&membership).await;
                }
                Some(ChangeEvent::MessageInserted(_)) => {}
                None => break,
            },
        }
    }

    messages.close();
    memberships.close();
    debug!("listener subscriptions released");
}
