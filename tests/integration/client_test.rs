//! Integration tests for the realtime client facade against mock
//! collaborators.

mod helpers;

use serde_json::json;

use helpers::{Harness, TEST_URL, settle, topic};
use tracklink_core::error::ErrorKind;
use tracklink_realtime::{ConnectionState, TopicCallback};

#[tokio::test(start_paused = true)]
async fn test_track_before_init_fails_without_side_effects() {
    let h = Harness::new();

    let err = h
        .client
        .track(topic("chat", "room1"), h.recorder.callback("a"))
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotInitialized);
    settle().await;
    assert!(h.client.topics().is_empty());
    assert_eq!(h.handshake.calls(), 0);
    assert_eq!(h.transport.opens(), 0);
    assert_eq!(h.client.state(), ConnectionState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_first_track_opens_and_batches_registry_at_open_time() {
    let h = Harness::initialized();

    h.track(&topic("news", "top"), "a").await;
    assert_eq!(h.client.state(), ConnectionState::Connecting);
    assert_eq!(h.transport.opens(), 1);

    // Tracked while the connection is still opening.
    h.track(&topic("chat", "room2"), "b").await;
    h.track(&topic("chat", "room1"), "c").await;
    assert_eq!(h.handshake.calls(), 1);
    assert_eq!(h.transport.opens(), 1);

    let connection = h.transport.last();
    assert_eq!(connection.url, TEST_URL);
    connection.open().await;

    assert_eq!(
        connection.sent_frames(),
        vec![json!([
            {"_type": "connect", "key": "key-1"},
            {"_type": "track", "service": "chat", "key": "room1"},
            {"_type": "track", "service": "chat", "key": "room2"},
            {"_type": "track", "service": "news", "key": "top"},
        ])]
    );
    assert_eq!(h.client.state(), ConnectionState::OpenUnauthorized);
}

#[tokio::test(start_paused = true)]
async fn test_cookie_header_is_forwarded() {
    let h = Harness::initialized();
    let header = h.client.cookies([("session", "a b"), ("lang", "en")]);
    assert_eq!(header, "session=a%20b; lang=en");

    h.track(&topic("chat", "room1"), "a").await;

    let connection = h.transport.last();
    assert_eq!(
        connection.headers,
        vec![("Cookie".to_string(), "session=a%20b; lang=en".to_string())]
    );
    assert_eq!(
        h.handshake.cookies(),
        vec![Some("session=a%20b; lang=en".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn test_track_while_authorized_sends_single_frame() {
    let h = Harness::initialized();
    let (connection, _) = h.authorized(&[topic("chat", "room1")]).await;
    assert_eq!(h.client.state(), ConnectionState::OpenAuthorized);
    let before = connection.sent().len();

    h.track(&topic("news", "top"), "b").await;

    let frames = connection.sent_frames();
    assert_eq!(frames.len(), before + 1);
    assert_eq!(
        frames[before],
        json!({"_type": "track", "service": "news", "key": "top"})
    );
    assert_eq!(h.transport.opens(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_topic_tracked_before_authorization_is_sent_on_authorize() {
    let h = Harness::initialized();
    h.track(&topic("chat", "room1"), "a").await;
    let connection = h.transport.last();
    connection.open().await;

    h.track(&topic("news", "top"), "b").await;
    assert_eq!(connection.sent().len(), 1);

    connection.authorize().await;

    let frames = connection.sent_frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(
        frames[1],
        json!({"_type": "track", "service": "news", "key": "top"})
    );
}

#[tokio::test(start_paused = true)]
async fn test_topic_untracked_before_authorization_is_untracked_on_authorize() {
    let h = Harness::initialized();
    let room = topic("chat", "room1");
    let first = h.track(&room, "a").await;
    h.track(&topic("news", "top"), "b").await;
    let connection = h.transport.last();
    connection.open().await;

    assert!(h.client.untrack(&room, &first));
    assert_eq!(connection.sent().len(), 1);

    connection.authorize().await;

    let frames = connection.sent_frames();
    assert_eq!(frames.len(), 2);
    assert_eq!(
        frames[1],
        json!({"_type": "untrack", "service": "chat", "key": "room1"})
    );
    assert_eq!(h.client.topics(), vec![topic("news", "top")]);
    assert!(connection.closes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_non_intentional_close_request_is_ignored() {
    let h = Harness::initialized();
    let (connection, _) = h.authorized(&[topic("chat", "room1")]).await;

    h.client.controller().request_close(false);
    settle().await;

    assert!(connection.closes().is_empty());
    assert_eq!(h.client.state(), ConnectionState::OpenAuthorized);
    assert!(h.client.controller().has_keepalive());
}

#[tokio::test(start_paused = true)]
async fn test_untrack_unknown_callback_returns_false() {
    let h = Harness::initialized();
    let (connection, _) = h.authorized(&[topic("chat", "room1")]).await;
    let before = connection.sent().len();

    let stranger = TopicCallback::new(|_| {});
    assert!(!h.client.untrack(&topic("chat", "room1"), &stranger));
    assert!(!h.client.untrack(&topic("chat", "other"), &stranger));

    assert_eq!(connection.sent().len(), before);
    assert!(connection.closes().is_empty());
    assert_eq!(h.client.state(), ConnectionState::OpenAuthorized);
}

#[tokio::test(start_paused = true)]
async fn test_untrack_keeps_topic_while_callbacks_remain() {
    let h = Harness::initialized();
    let room = topic("chat", "room1");
    let (connection, callbacks) = h.authorized(&[room.clone()]).await;
    let _second = h.track(&room, "second").await;
    let before = connection.sent().len();

    assert!(h.client.untrack(&room, &callbacks[0]));

    assert_eq!(connection.sent().len(), before);
    assert_eq!(h.client.topics(), vec![room.clone()]);

    connection
        .deliver(r#"{"service":"chat","key":"room1","data":1}"#)
        .await;
    assert_eq!(h.recorder.labels(), vec!["second"]);
}

#[tokio::test(start_paused = true)]
async fn test_last_untrack_sends_untrack_and_closes_once() {
    let h = Harness::initialized();
    let room = topic("chat", "room1");
    let (connection, callbacks) = h.authorized(&[room.clone()]).await;
    assert!(h.client.controller().has_keepalive());

    assert!(h.client.untrack(&room, &callbacks[0]));
    settle().await;

    let frames = connection.sent_frames();
    assert_eq!(
        frames.last().unwrap(),
        &json!({"_type": "untrack", "service": "chat", "key": "room1"})
    );
    assert_eq!(
        connection.closes(),
        vec![(1000, "nothing else to track".to_string())]
    );
    assert_eq!(h.client.state(), ConnectionState::Closed);
    assert!(!h.client.controller().has_keepalive());
    assert!(h.client.topics().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_data_dispatched_to_callbacks_in_registration_order() {
    let h = Harness::initialized();
    let room = topic("chat", "room1");
    let (connection, _) = h.authorized(&[room.clone(), topic("news", "top")]).await;
    h.track(&room, "late").await;

    connection
        .deliver(r#"{"service":"chat","key":"room1","data":{"text":"hi"}}"#)
        .await;

    assert_eq!(
        h.recorder.calls(),
        vec![
            ("cb0".to_string(), json!({"text": "hi"})),
            ("late".to_string(), json!({"text": "hi"})),
        ]
    );
    assert!(h.sink.errors().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_data_for_untracked_topic_is_dropped_silently() {
    let h = Harness::initialized();
    let (connection, _) = h.authorized(&[topic("chat", "room1")]).await;

    connection
        .deliver(r#"{"service":"chat","key":"room9","data":true}"#)
        .await;

    assert!(h.recorder.calls().is_empty());
    assert!(h.sink.errors().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_callback_runs_twice() {
    let h = Harness::initialized();
    let room = topic("chat", "room1");
    let (connection, callbacks) = h.authorized(&[room.clone()]).await;
    h.client.track(room.clone(), callbacks[0].clone()).unwrap();

    connection
        .deliver(r#"{"service":"chat","key":"room1","data":null}"#)
        .await;
    assert_eq!(h.recorder.labels(), vec!["cb0", "cb0"]);

    assert!(h.client.untrack(&room, &callbacks[0]));
    connection
        .deliver(r#"{"service":"chat","key":"room1","data":null}"#)
        .await;
    assert_eq!(h.recorder.labels(), vec!["cb0", "cb0", "cb0"]);
}

#[tokio::test(start_paused = true)]
async fn test_backend_error_reported_and_not_dispatched() {
    let h = Harness::initialized();
    let (connection, _) = h.authorized(&[topic("chat", "room1")]).await;

    connection
        .deliver(r#"{"error":{"code":403,"msg":"forbidden"}}"#)
        .await;

    assert_eq!(h.sink.errors(), vec![(Some(403), "forbidden".to_string())]);
    assert!(h.recorder.calls().is_empty());
    assert_eq!(h.client.state(), ConnectionState::OpenAuthorized);
}

#[tokio::test(start_paused = true)]
async fn test_backend_error_without_code_reported() {
    let h = Harness::initialized();
    let (connection, _) = h.authorized(&[topic("chat", "room1")]).await;

    connection
        .deliver(r#"{"error":{"msg":"session expired"}}"#)
        .await;

    assert_eq!(h.sink.errors(), vec![(None, "session expired".to_string())]);
    assert!(h.recorder.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_control_string_reported() {
    let h = Harness::initialized();
    let (connection, _) = h.authorized(&[topic("chat", "room1")]).await;

    connection.deliver(r#""welcome""#).await;

    assert_eq!(
        h.sink.errors(),
        vec![(None, "unknown data: welcome".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn test_pong_is_ignored() {
    let h = Harness::initialized();
    let (connection, _) = h.authorized(&[topic("chat", "room1")]).await;

    connection.deliver(r#""pong""#).await;

    assert!(h.sink.errors().is_empty());
    assert!(h.recorder.calls().is_empty());
    assert_eq!(h.client.state(), ConnectionState::OpenAuthorized);
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_reported_without_state_change() {
    let h = Harness::initialized();
    let (connection, _) = h.authorized(&[topic("chat", "room1")]).await;

    connection.fail("connection reset").await;

    assert_eq!(
        h.sink.errors(),
        vec![(None, "transport error: connection reset".to_string())]
    );
    assert_eq!(h.client.state(), ConnectionState::OpenAuthorized);
}

#[tokio::test(start_paused = true)]
async fn test_handshake_failure_reports_and_next_track_retries() {
    let h = Harness::initialized();
    h.handshake.set_failing(true);

    h.track(&topic("chat", "room1"), "a").await;

    assert_eq!(h.client.state(), ConnectionState::Closed);
    assert_eq!(h.transport.opens(), 0);
    let errors = h.sink.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].1.starts_with("handshake failed"));

    h.handshake.set_failing(false);
    h.track(&topic("news", "top"), "b").await;

    assert_eq!(h.handshake.calls(), 2);
    assert_eq!(h.transport.opens(), 1);
    let connection = h.transport.last();
    connection.open().await;
    assert_eq!(
        connection.sent_frames()[0],
        json!([
            {"_type": "connect", "key": "key-2"},
            {"_type": "track", "service": "chat", "key": "room1"},
            {"_type": "track", "service": "news", "key": "top"},
        ])
    );
}

#[tokio::test(start_paused = true)]
async fn test_callback_may_track_reentrantly() {
    let h = Harness::initialized();
    let (connection, _) = h.authorized(&[topic("chat", "room1")]).await;

    let client = h.client.clone();
    let follow_up = h.recorder.callback("follow-up");
    h.client
        .track(
            topic("chat", "room1"),
            TopicCallback::new(move |_| {
                client
                    .track(topic("chat", "room2"), follow_up.clone())
                    .unwrap();
            }),
        )
        .unwrap();

    connection
        .deliver(r#"{"service":"chat","key":"room1","data":{}}"#)
        .await;

    assert!(h.client.topics().contains(&topic("chat", "room2")));
    assert_eq!(
        connection.sent_frames().last().unwrap(),
        &json!({"_type": "track", "service": "chat", "key": "room2"})
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_clears_and_closes() {
    let h = Harness::initialized();
    let (connection, _) = h
        .authorized(&[topic("chat", "room1"), topic("news", "top")])
        .await;

    h.client.shutdown();
    settle().await;

    assert!(h.client.topics().is_empty());
    assert_eq!(h.client.state(), ConnectionState::Closed);
    assert_eq!(
        connection.closes(),
        vec![(1000, "nothing else to track".to_string())]
    );

    let metrics = h.client.metrics();
    assert_eq!(metrics.connect_attempts, 1);
    assert_eq!(metrics.reconnects_scheduled, 0);
}
