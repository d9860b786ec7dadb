//! Chat endpoints: membership, messages, read markers, unread counts.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use task_tracker::feed::{ChangeEvent, ChangeFeed, FeedFilter, LocalFeed};
use task_tracker::http::{router, AppState};
use task_tracker::models::chat::Chat;
use task_tracker::persistence::chat_repo::ChatRepo;
use task_tracker::persistence::db::Database;

use super::test_helpers::memory_db;

struct Harness {
    app: Router,
    feed: LocalFeed,
    chat_id: String,
}

async fn harness() -> Harness {
    let db: Arc<Database> = memory_db().await;
    let chat = ChatRepo::new(db.clone())
        .create(&Chat::new(Some("Проект Альфа".into())))
        .await
        .expect("create chat");
    let feed = LocalFeed::default();
    Harness {
        app: router(AppState::new(db, feed.clone(), None)),
        feed,
        chat_id: chat.id,
    }
}

async fn post(app: &Router, path: &str, body: Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("router responds")
}

async fn get(app: &Router, path: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).expect("request"))
        .await
        .expect("router responds")
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn unread_flow_through_the_api() {
    let h = harness().await;
    let members = format!("/chats/{}/members", h.chat_id);
    let messages = format!("/chats/{}/messages", h.chat_id);

    for user in ["u-1", "u-2"] {
        let response = post(&h.app, &members, json!({ "user_id": user })).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    for text in ["привет", "как дела?"] {
        let response = post(
            &h.app,
            &messages,
            json!({ "sender_id": "u-2", "content": text }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let body = json_body(get(&h.app, "/users/u-1/unread").await).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["chats"][0]["chat_id"], h.chat_id.as_str());
    assert_eq!(body["chats"][0]["unread"], 2);

    let body = json_body(get(&h.app, "/users/u-2/unread").await).await;
    assert_eq!(body["total"], 0, "own messages are never unread");

    let response = post(
        &h.app,
        &format!("/chats/{}/read", h.chat_id),
        json!({ "user_id": "u-1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let membership = json_body(response).await;
    assert!(membership["last_read_at"].is_string());

    let body = json_body(get(&h.app, "/users/u-1/unread").await).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn unknown_user_has_zero_unread() {
    let h = harness().await;
    let body = json_body(get(&h.app, "/users/nobody/unread").await).await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["chats"], json!([]));
}

#[tokio::test]
async fn joining_missing_chat_is_404() {
    let h = harness().await;
    let response = post(&h.app, "/chats/absent/members", json!({ "user_id": "u-1" })).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_member_cannot_post() {
    let h = harness().await;
    let response = post(
        &h.app,
        &format!("/chats/{}/messages", h.chat_id),
        json!({ "sender_id": "stranger", "content": "hi" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn non_member_cannot_mark_read() {
    let h = harness().await;
    let response = post(
        &h.app,
        &format!("/chats/{}/read", h.chat_id),
        json!({ "user_id": "stranger" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn writes_publish_change_events() {
    let h = harness().await;
    let mut inserts = h.feed.subscribe(FeedFilter::MESSAGE_INSERTS).expect("subscribe");
    let mut updates = h.feed.subscribe(FeedFilter::MEMBERSHIP_UPDATES).expect("subscribe");

    post(
        &h.app,
        &format!("/chats/{}/members", h.chat_id),
        json!({ "user_id": "u-1" }),
    )
    .await;
    post(
        &h.app,
        &format!("/chats/{}/messages", h.chat_id),
        json!({ "sender_id": "u-1", "file_url": "https://files.example/report.pdf" }),
    )
    .await;
    post(
        &h.app,
        &format!("/chats/{}/read", h.chat_id),
        json!({ "user_id": "u-1" }),
    )
    .await;

    let Some(ChangeEvent::MessageInserted(message)) = inserts.recv().await else {
        panic!("expected a message insert");
    };
    assert_eq!(message.sender_id, "u-1");
    assert_eq!(message.preview(), "[file]");

    let Some(ChangeEvent::MembershipUpdated(membership)) = updates.recv().await else {
        panic!("expected a membership update");
    };
    assert_eq!(membership.user_id, "u-1");
    assert!(membership.last_read_at.is_some());
}
