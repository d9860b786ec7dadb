//! In-process change feed backed by a `tokio` broadcast channel.

use tokio::sync::broadcast;
use tracing::trace;

use super::{ChangeEvent, ChangeFeed, FeedFilter, Subscription};
use crate::Result;

const DEFAULT_CAPACITY: usize = 256;

/// Change feed shared by every writer and subscriber in this process.
#[derive(Clone)]
pub struct LocalFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for LocalFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LocalFeed {
    /// Create a feed buffering up to `capacity` events per slow subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Deliver `event` to every open subscription.
    ///
    /// Returns how many subscriptions were open; publishing with none open
    /// is not an error.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let table = event.table();
        let delivered = self.sender.send(event).unwrap_or(0);
        trace!(?table, delivered, "change event published");
        delivered
    }

    /// Number of subscriptions currently open.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl ChangeFeed for LocalFeed {
    fn subscribe(&self, filter: FeedFilter) -> Result<Subscription> {
        Ok(Subscription::new(filter, self.sender.subscribe()))
    }
}
