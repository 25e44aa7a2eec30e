mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use blush_client::thread::{SendOutcome, Thread};
use blush_types::models::MessageId;

use common::{FakeBackend, Reply, alert_messages, context, drain, sleep_secs};

#[tokio::test(start_paused = true)]
async fn optimistic_send_is_replaced_by_the_server_copy() {
    let api = FakeBackend::new();
    api.push_message("m1", "hey", "2025-02-01T20:00:00Z");
    api.delay("send", Duration::from_secs(1));
    let (ctx, _rx, _store) = context();

    let thread = Arc::new(Thread::new(api.clone(), ctx, "t1"));
    thread.fetch_messages(None).await.unwrap();

    let sending = {
        let thread = thread.clone();
        tokio::spawn(async move { thread.send_message("hello").await })
    };
    sleep_secs(0.1).await;

    let shown = thread.messages().await;
    let pending: Vec<_> = shown.iter().filter(|m| m.id.is_pending()).collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].text, "hello");

    assert_eq!(sending.await.unwrap(), SendOutcome::Sent("s1".into()));

    let shown = thread.messages().await;
    assert!(shown.iter().all(|m| !m.id.is_pending()));
    let hello: Vec<_> = shown.iter().filter(|m| m.text == "hello").collect();
    assert_eq!(hello.len(), 1);
    assert_eq!(hello[0].id, MessageId::Server("s1".into()));
    assert_eq!(shown.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_send_leaves_nothing_behind() {
    let api = FakeBackend::new();
    api.script("send", [Reply::status(500, json!({"detail": "db down"}))]);
    let (ctx, mut rx, _store) = context();

    let thread = Thread::new(api.clone(), ctx, "t1");
    assert_eq!(thread.send_message("hello").await, SendOutcome::Failed);
    assert!(thread.messages().await.is_empty());
    assert_eq!(alert_messages(&drain(&mut rx)), vec!["Failed to send message"]);
}

#[tokio::test(start_paused = true)]
async fn network_failure_names_the_network() {
    let api = FakeBackend::new();
    api.script("send", [Reply::Network]);
    let (ctx, mut rx, _store) = context();

    let thread = Thread::new(api, ctx, "t1");
    assert_eq!(thread.send_message("hello").await, SendOutcome::Failed);
    assert!(thread.messages().await.is_empty());
    assert_eq!(
        alert_messages(&drain(&mut rx)),
        vec!["Failed to send message: Network error"]
    );
}

#[tokio::test(start_paused = true)]
async fn blank_message_is_not_sent() {
    let api = FakeBackend::new();
    let (ctx, _rx, _store) = context();

    let thread = Thread::new(api.clone(), ctx, "t1");
    assert_eq!(thread.send_message("   \n").await, SendOutcome::Ignored);
    assert_eq!(api.calls("send"), 0);
}

#[tokio::test(start_paused = true)]
async fn older_pages_merge_behind_the_newest() {
    let api = FakeBackend::new();
    api.script(
        "messages",
        [
            Reply::ok(json!({
                "messages": [
                    {"id": "m4", "sender_id": "u2", "text": "d", "created_at": "2025-02-01T20:04:00"},
                    {"id": "m3", "sender_id": "u1", "text": "c", "created_at": "2025-02-01T20:03:00"}
                ],
                "next_cursor": "m3"
            })),
            Reply::ok(json!({
                "messages": [
                    {"id": "m3", "sender_id": "u1", "text": "c", "created_at": "2025-02-01T20:03:00"},
                    {"id": "m2", "sender_id": "u2", "text": "b", "created_at": "2025-02-01T20:02:00"},
                    {"id": "m1", "sender_id": "u1", "text": "a", "created_at": "2025-02-01T20:01:00"}
                ],
                "next_cursor": null
            })),
        ],
    );
    let (ctx, _rx, _store) = context();

    let thread = Thread::new(api, ctx, "t1");
    thread.fetch_messages(None).await.unwrap();
    assert_eq!(thread.snapshot().await.next_cursor.as_deref(), Some("m3"));

    assert!(thread.load_older().await.unwrap());
    let texts: Vec<_> = thread
        .messages()
        .await
        .into_iter()
        .map(|m| m.text)
        .collect();
    assert_eq!(texts, vec!["a", "b", "c", "d"]);
    assert_eq!(thread.snapshot().await.next_cursor, None);
    assert!(!thread.load_older().await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn open_marks_read_and_polls() {
    let api = FakeBackend::new();
    api.push_message("m1", "hey", "2025-02-01T20:00:00Z");
    api.script("mark_read", [Reply::ok(json!({"status": "ok"}))]);
    let (ctx, _rx, _store) = context();

    let thread = Thread::new(api.clone(), ctx, "t1");
    thread.open().await;
    assert_eq!(api.calls("messages"), 1);
    assert_eq!(api.calls("mark_read"), 1);

    api.push_message("m2", "you there?", "2025-02-01T20:01:00Z");
    sleep_secs(11.0).await;
    assert_eq!(api.calls("messages"), 3);
    assert_eq!(thread.messages().await.len(), 2);

    thread.stop().await;
    sleep_secs(20.0).await;
    assert_eq!(api.calls("messages"), 3);
}

#[tokio::test(start_paused = true)]
async fn partner_accepts_wrapped_profile() {
    let api = FakeBackend::new();
    api.script(
        "partner",
        [Reply::ok(json!({"partner": {"id": "u2", "first_name": "Ria", "age": 27}}))],
    );
    let (ctx, _rx, _store) = context();

    let thread = Thread::new(api, ctx, "t1");
    let partner = thread.partner().await.unwrap();
    assert_eq!(partner.first_name.as_deref(), Some("Ria"));
    assert_eq!(partner.age, Some(27));
}
