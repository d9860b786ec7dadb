//! Unread-message counting and the badge that holds the latest count.

pub mod aggregator;
pub mod badge;

pub use aggregator::{UnreadAggregator, UnreadSource};
pub use badge::{spawn_unread_poller, RefreshOutcome, UnreadBadge};
