use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use task_tracker::models::chat::{Chat, ChatMembership, Message};
use task_tracker::persistence::db::{self, Database};
use task_tracker::persistence::{chat_repo::ChatRepo, message_repo::MessageRepo};
use task_tracker::unread::{UnreadAggregator, UnreadSource};

struct Fixture {
    db: Arc<Database>,
    chats: ChatRepo,
    messages: MessageRepo,
}

impl Fixture {
    async fn new() -> Self {
        let db = Arc::new(db::connect_memory().await.expect("db connect"));
        Self {
            chats: ChatRepo::new(Arc::clone(&db)),
            messages: MessageRepo::new(Arc::clone(&db)),
            db,
        }
    }

    fn aggregator(&self) -> UnreadAggregator {
        UnreadAggregator::new(Arc::clone(&self.db))
    }

    async fn chat_with(&self, members: &[&str]) -> String {
        let chat = self.chats.create(&Chat::new(None)).await.expect("create chat");
        for member in members {
            self.chats
                .add_member(&ChatMembership::new(chat.id.clone(), (*member).to_owned()))
                .await
                .expect("join");
        }
        chat.id
    }

    async fn post(&self, chat_id: &str, sender: &str, at: DateTime<Utc>) {
        let mut message = Message::new(chat_id.into(), sender.into(), Some("hi".into()), None);
        message.created_at = at;
        self.messages.insert(&message).await.expect("insert message");
    }
}

#[tokio::test]
async fn no_user_yields_none() {
    let fx = Fixture::new().await;
    let total = fx.aggregator().count(None).await.expect("count");
    assert_eq!(total, None);
}

#[tokio::test]
async fn no_memberships_is_zero() {
    let fx = Fixture::new().await;
    let other = fx.chat_with(&["u-2"]).await;
    fx.post(&other, "u-2", Utc::now()).await;

    let total = fx.aggregator().count(Some("u-1")).await.expect("count");
    assert_eq!(total, Some(0));
}

#[tokio::test]
async fn unset_marker_counts_all_messages_from_others() {
    let fx = Fixture::new().await;
    let chat = fx.chat_with(&["u-1", "u-2", "u-3"]).await;
    let base = Utc::now() - Duration::days(30);
    fx.post(&chat, "u-2", base).await;
    fx.post(&chat, "u-3", base + Duration::minutes(1)).await;
    fx.post(&chat, "u-1", base + Duration::minutes(2)).await;

    let total = fx.aggregator().count(Some("u-1")).await.expect("count");
    assert_eq!(total, Some(2));
}

#[tokio::test]
async fn only_messages_after_marker_count() {
    let fx = Fixture::new().await;
    let chat = fx.chat_with(&["u-1", "u-2"]).await;
    let marker = Utc::now() - Duration::hours(1);
    fx.post(&chat, "u-2", marker - Duration::minutes(5)).await;
    fx.post(&chat, "u-2", marker).await;
    fx.post(&chat, "u-2", marker + Duration::minutes(5)).await;
    fx.chats
        .mark_read(&chat, "u-1", marker)
        .await
        .expect("mark read");

    let total = fx.aggregator().count(Some("u-1")).await.expect("count");
    assert_eq!(total, Some(1), "a message stamped at the marker is read");
}

#[tokio::test]
async fn sums_across_chats() {
    let fx = Fixture::new().await;
    let busy = fx.chat_with(&["u-1", "u-2"]).await;
    let quiet = fx.chat_with(&["u-1", "u-3"]).await;
    let now = Utc::now();
    for i in 0..3 {
        fx.post(&busy, "u-2", now - Duration::minutes(10 - i)).await;
    }
    fx.post(&quiet, "u-3", now - Duration::minutes(20)).await;
    fx.chats.mark_read(&quiet, "u-1", now).await.expect("mark read");

    let aggregator = fx.aggregator();
    assert_eq!(aggregator.count(Some("u-1")).await.expect("count"), Some(3));

    let mut breakdown = aggregator.breakdown("u-1").await.expect("breakdown");
    breakdown.sort_by_key(|c| c.unread);
    let counts: Vec<_> = breakdown.iter().map(|c| (c.chat_id.as_str(), c.unread)).collect();
    assert_eq!(counts, [(quiet.as_str(), 0), (busy.as_str(), 3)]);
}

#[tokio::test]
async fn own_messages_never_count() {
    let fx = Fixture::new().await;
    let chat = fx.chat_with(&["u-1"]).await;
    let now = Utc::now();
    for i in 0..4 {
        fx.post(&chat, "u-1", now - Duration::seconds(i)).await;
    }

    let total = fx.aggregator().count(Some("u-1")).await.expect("count");
    assert_eq!(total, Some(0));
}

#[tokio::test]
async fn unread_source_reports_total() {
    let fx = Fixture::new().await;
    let chat = fx.chat_with(&["u-1", "u-2"]).await;
    fx.post(&chat, "u-2", Utc::now()).await;

    let aggregator = fx.aggregator();
    let source: &dyn UnreadSource = &aggregator;
    assert_eq!(source.count_unread("u-1").await.expect("count"), 1);
}

#[tokio::test]
async fn closed_pool_surfaces_error() {
    let fx = Fixture::new().await;
    fx.db.close().await;

    assert!(fx.aggregator().count(Some("u-1")).await.is_err());
}
