//! Subscription lifecycle and end-to-end notices of the listener.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use task_tracker::feed::{ChangeFeed, LocalFeed};
use task_tracker::listener::{ListenerState, NotificationListener};
use task_tracker::messaging::Messenger;
use task_tracker::models::chat::Chat;
use task_tracker::models::profile::Profile;
use task_tracker::notify::{ChannelNotifier, NotifierEvent, NEW_MESSAGE_TITLE};
use task_tracker::persistence::db::Database;
use task_tracker::persistence::{chat_repo::ChatRepo, profile_repo::ProfileRepo};
use task_tracker::unread::{UnreadAggregator, UnreadBadge};

use super::test_helpers::memory_db;

struct Harness {
    db: Arc<Database>,
    feed: LocalFeed,
    messenger: Messenger,
    listener: NotificationListener,
    events: mpsc::Receiver<NotifierEvent>,
}

async fn harness() -> Harness {
    let db = memory_db().await;
    let feed = LocalFeed::default();
    let (notifier, events) = ChannelNotifier::channel(16);
    let badge = Arc::new(UnreadBadge::new(Arc::new(UnreadAggregator::new(db.clone()))));
    let shared_feed: Arc<dyn ChangeFeed> = Arc::new(feed.clone());
    let listener =
        NotificationListener::new(db.clone(), shared_feed, Arc::new(notifier), badge, 5000);

    Harness {
        messenger: Messenger::new(db.clone(), feed.clone()),
        db,
        feed,
        listener,
        events,
    }
}

async fn chat(db: &Arc<Database>, name: Option<&str>) -> String {
    ChatRepo::new(db.clone())
        .create(&Chat::new(name.map(str::to_owned)))
        .await
        .expect("create chat")
        .id
}

async fn next_event(events: &mut mpsc::Receiver<NotifierEvent>) -> NotifierEvent {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("notifier event in time")
        .expect("notifier open")
}

async fn assert_quiet(events: &mut mpsc::Receiver<NotifierEvent>) {
    let waited = tokio::time::timeout(Duration::from_millis(100), events.recv()).await;
    assert!(waited.is_err(), "no notifier event expected, got {waited:?}");
}

#[tokio::test]
async fn start_opens_two_subscriptions_and_clearing_user_closes_them() {
    let mut h = harness().await;
    assert_eq!(h.listener.state(), ListenerState::Unsubscribed);
    assert_eq!(h.feed.subscriber_count(), 0);

    h.listener.set_user(Some("u-1")).await.expect("subscribe");
    assert_eq!(
        h.listener.state(),
        ListenerState::Subscribed {
            user_id: "u-1".into()
        }
    );
    assert_eq!(h.feed.subscriber_count(), 2);

    h.listener.set_user(Some("u-1")).await.expect("same user");
    assert_eq!(h.feed.subscriber_count(), 2, "same user keeps the pair");

    h.listener.set_user(Some("u-2")).await.expect("switch user");
    assert_eq!(h.feed.subscriber_count(), 2, "switching replaces the pair");

    h.listener.set_user(None).await.expect("unsubscribe");
    assert_eq!(h.listener.state(), ListenerState::Unsubscribed);
    assert_eq!(h.feed.subscriber_count(), 0);
}

#[tokio::test]
async fn drop_releases_subscriptions() {
    let mut h = harness().await;
    h.listener.start("u-1").await.expect("subscribe");
    assert_eq!(h.feed.subscriber_count(), 2);

    drop(h.listener);

    tokio::time::timeout(Duration::from_secs(2), async {
        while h.feed.subscriber_count() > 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("subscriptions released after drop");
}

#[tokio::test]
async fn member_message_raises_cue_notice_and_badge() {
    let mut h = harness().await;
    let sender = ProfileRepo::new(h.db.clone())
        .create(&Profile::new(Some("Анна".into()), None, None))
        .await
        .expect("create profile");
    let chat_id = chat(&h.db, Some("Отдел продаж")).await;
    h.messenger.join_chat(&chat_id, "u-1").await.expect("join");
    h.messenger.join_chat(&chat_id, &sender.id).await.expect("join");

    h.listener.start("u-1").await.expect("subscribe");
    let mut badge = h.listener.badge().subscribe();

    h.messenger
        .send_message(&chat_id, &sender.id, Some("привет".into()), None)
        .await
        .expect("send");

    assert_eq!(next_event(&mut h.events).await, NotifierEvent::Cue);
    let NotifierEvent::Notice(notice) = next_event(&mut h.events).await else {
        panic!("expected a notice after the cue");
    };
    assert_eq!(notice.title, NEW_MESSAGE_TITLE);
    assert_eq!(notice.body, "Анна: привет");
    assert_eq!(notice.duration_ms, 5000);

    tokio::time::timeout(Duration::from_secs(2), badge.wait_for(|count| *count == 1))
        .await
        .expect("badge refreshed in time")
        .expect("badge alive");
}

#[tokio::test]
async fn unknown_sender_and_attachment_use_placeholders() {
    let mut h = harness().await;
    let chat_id = chat(&h.db, None).await;
    h.messenger.join_chat(&chat_id, "u-1").await.expect("join");
    h.messenger.join_chat(&chat_id, "ghost").await.expect("join");
    h.listener.start("u-1").await.expect("subscribe");

    h.messenger
        .send_message(&chat_id, "ghost", None, Some("https://files.example/a.png".into()))
        .await
        .expect("send");

    assert_eq!(next_event(&mut h.events).await, NotifierEvent::Cue);
    let NotifierEvent::Notice(notice) = next_event(&mut h.events).await else {
        panic!("expected a notice after the cue");
    };
    assert_eq!(notice.body, "Неизвестный: [file]");
}

#[tokio::test]
async fn other_chats_and_own_messages_are_ignored() {
    let mut h = harness().await;
    let mine = chat(&h.db, None).await;
    let theirs = chat(&h.db, None).await;
    h.messenger.join_chat(&mine, "u-1").await.expect("join");
    h.messenger.join_chat(&theirs, "u-2").await.expect("join");
    h.listener.start("u-1").await.expect("subscribe");

    h.messenger
        .send_message(&theirs, "u-2", Some("not for you".into()), None)
        .await
        .expect("send");
    h.messenger
        .send_message(&mine, "u-1", Some("talking to myself".into()), None)
        .await
        .expect("send");

    assert_quiet(&mut h.events).await;
    assert_eq!(h.listener.badge().current(), 0);
}

#[tokio::test]
async fn reading_clears_the_badge() {
    let mut h = harness().await;
    let chat_id = chat(&h.db, None).await;
    h.messenger.join_chat(&chat_id, "u-1").await.expect("join");
    h.messenger.join_chat(&chat_id, "u-2").await.expect("join");
    h.listener.start("u-1").await.expect("subscribe");
    let mut badge = h.listener.badge().subscribe();

    h.messenger
        .send_message(&chat_id, "u-2", Some("ping".into()), None)
        .await
        .expect("send");
    tokio::time::timeout(Duration::from_secs(2), badge.wait_for(|count| *count == 1))
        .await
        .expect("badge raised")
        .expect("badge alive");

    h.messenger
        .mark_read(&chat_id, "u-1", chrono::Utc::now())
        .await
        .expect("mark read");
    tokio::time::timeout(Duration::from_secs(2), badge.wait_for(|count| *count == 0))
        .await
        .expect("badge cleared")
        .expect("badge alive");
}

#[tokio::test]
async fn stopped_listener_stays_silent() {
    let mut h = harness().await;
    let chat_id = chat(&h.db, None).await;
    h.messenger.join_chat(&chat_id, "u-1").await.expect("join");
    h.messenger.join_chat(&chat_id, "u-2").await.expect("join");
    h.listener.start("u-1").await.expect("subscribe");
    h.listener.stop().await;

    h.messenger
        .send_message(&chat_id, "u-2", Some("anyone?".into()), None)
        .await
        .expect("send");
    assert_quiet(&mut h.events).await;
}

#[tokio::test]
async fn restarting_for_another_user_retires_the_old_session() {
    let mut h = harness().await;
    let chat_id = chat(&h.db, None).await;
    h.messenger.join_chat(&chat_id, "u-1").await.expect("join");
    h.messenger.join_chat(&chat_id, "u-3").await.expect("join");

    h.listener.start("u-1").await.expect("subscribe");
    h.listener.start("u-2").await.expect("resubscribe");

    assert_eq!(h.feed.subscriber_count(), 2, "old pair released before the new one opens");
    assert_eq!(
        h.listener.state(),
        ListenerState::Subscribed {
            user_id: "u-2".into()
        }
    );

    h.messenger
        .send_message(&chat_id, "u-3", Some("for u-1 only".into()), None)
        .await
        .expect("send");
    assert_quiet(&mut h.events).await;
}
