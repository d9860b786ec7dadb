//! Row-level change feed.
//!
//! Subscribers receive insert/update events for one table and event kind;
//! finer filtering (by chat or user) is the subscriber's job. The
//! [`ChangeFeed`] trait is the capability handed to consumers;
//! [`LocalFeed`] is the in-process implementation.

mod local;

pub use local::LocalFeed;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::models::chat::{ChatMembership, Message};
use crate::Result;

/// Table an event originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedTable {
    /// `messages`
    Messages,
    /// `chat_members`
    ChatMembers,
}

/// Row operation an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedEventKind {
    /// Row inserted.
    Insert,
    /// Row updated.
    Update,
}

/// Server-side subscription filter: table and event kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedFilter {
    /// Table to watch.
    pub table: FeedTable,
    /// Operation to watch.
    pub kind: FeedEventKind,
}

impl FeedFilter {
    /// New message rows.
    pub const MESSAGE_INSERTS: Self = Self {
        table: FeedTable::Messages,
        kind: FeedEventKind::Insert,
    };

    /// Read-marker updates on memberships.
    pub const MEMBERSHIP_UPDATES: Self = Self {
        table: FeedTable::ChatMembers,
        kind: FeedEventKind::Update,
    };
}

/// A row-level change delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A message row was inserted.
    MessageInserted(Message),
    /// A membership row was updated.
    MembershipUpdated(ChatMembership),
}

impl ChangeEvent {
    /// Table this event belongs to.
    #[must_use]
    pub fn table(&self) -> FeedTable {
        match self {
            Self::MessageInserted(_) => FeedTable::Messages,
            Self::MembershipUpdated(_) => FeedTable::ChatMembers,
        }
    }

    /// Operation this event describes.
    #[must_use]
    pub fn kind(&self) -> FeedEventKind {
        match self {
            Self::MessageInserted(_) => FeedEventKind::Insert,
            Self::MembershipUpdated(_) => FeedEventKind::Update,
        }
    }

    /// Whether `filter` selects this event.
    #[must_use]
    pub fn matches(&self, filter: FeedFilter) -> bool {
        self.table() == filter.table && self.kind() == filter.kind
    }
}

/// Capability to open subscriptions on the change feed.
pub trait ChangeFeed: Send + Sync {
    /// Open a subscription delivering events that match `filter`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Feed` if the feed can no longer accept subscribers.
    fn subscribe(&self, filter: FeedFilter) -> Result<Subscription>;
}

/// Handle to one open subscription.
///
/// Dropping the handle releases it; [`close`](Self::close) does so
/// explicitly and makes later [`recv`](Self::recv) calls return `None`.
pub struct Subscription {
    filter: FeedFilter,
    receiver: Option<broadcast::Receiver<ChangeEvent>>,
}

impl Subscription {
    /// Wrap a broadcast receiver with its filter.
    #[must_use]
    pub fn new(filter: FeedFilter, receiver: broadcast::Receiver<ChangeEvent>) -> Self {
        Self {
            filter,
            receiver: Some(receiver),
        }
    }

    /// Filter this subscription was opened with.
    #[must_use]
    pub fn filter(&self) -> FeedFilter {
        self.filter
    }

    /// Whether the subscription has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.receiver.is_none()
    }

    /// Wait for the next matching event.
    ///
    /// Returns `None` once the subscription is closed or the feed is gone.
    /// Events dropped because this subscriber fell behind are logged and
    /// skipped.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(event) if event.matches(self.filter) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, filter = ?self.filter, "change feed subscriber lagged");
                }
                Err(RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Release the subscription.
    pub fn close(&mut self) {
        self.receiver = None;
    }
}
