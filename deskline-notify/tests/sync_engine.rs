use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use deskline_notify::models::NotificationStatus;
use deskline_notify::{
    EngineSettings, HttpNotificationApi, NotificationEngine, PollingFeed, ShownToastRegistry,
};
use deskline_shared::clients::{ApiClient, LocalStore};
use deskline_shared::{ForceLogout, Session, SessionStore};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Setup {
    engine: Arc<NotificationEngine>,
    sessions: Arc<SessionStore>,
}

fn build(server: &MockServer, dir: &Path) -> Setup {
    let store = LocalStore::open(dir).unwrap();
    let sessions = Arc::new(SessionStore::load(store.clone()));
    if sessions.current().is_none() {
        sessions.login(Session::new("test-token", None)).unwrap();
    }

    let handler = Arc::new(ForceLogout::new(sessions.clone()));
    let client =
        ApiClient::new(&server.uri(), Duration::from_secs(5), sessions.clone(), handler).unwrap();
    let api = Arc::new(HttpNotificationApi::new(client));
    let feed = Arc::new(PollingFeed::new(api.clone()));

    let engine = Arc::new(NotificationEngine::new(
        api,
        feed,
        sessions.clone(),
        ShownToastRegistry::load(store),
        EngineSettings::default(),
    ));
    Setup { engine, sessions }
}

fn notification_json(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "type": "ticket_assigned",
        "title": format!("Ticket #{id}"),
        "message": "Assigned to you",
        "priority": "high",
        "status": "unread",
        "sender_name": "Dana",
        "created_at": "2026-10-15T09:30:00Z",
    })
}

async fn mock_new_latest(server: &MockServer, id: i64) {
    Mock::given(method("GET"))
        .and(path("/notifications/check-new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "has_new": true, "count": 1 })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notifications/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(notification_json(id)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn nothing_new_makes_a_single_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notifications/check-new"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "has_new": false, "count": 0 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notifications/latest"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let setup = build(&server, dir.path());
    setup.engine.check_for_new().await;

    let state = setup.engine.snapshot().await;
    assert!(state.notifications.is_empty());
    assert_eq!(state.unread_count, 0);
    assert!(setup.engine.visible_toasts().await.is_empty());
}

#[tokio::test]
async fn new_notification_is_toasted_and_merged_once() {
    let server = MockServer::start().await;
    mock_new_latest(&server, 42).await;

    let dir = TempDir::new().unwrap();
    let setup = build(&server, dir.path());

    setup.engine.check_for_new().await;
    let state = setup.engine.snapshot().await;
    assert_eq!(state.notifications.len(), 1);
    assert_eq!(state.unread_count, 1);
    assert_eq!(setup.engine.visible_toasts().await.len(), 1);
    assert_eq!(setup.engine.shown_toast_count().await, 1);

    // Stale latest on the next tick.
    setup.engine.check_for_new().await;
    let state = setup.engine.snapshot().await;
    assert_eq!(state.notifications.len(), 1);
    assert_eq!(state.unread_count, 1);
    assert_eq!(setup.engine.visible_toasts().await.len(), 1);
}

#[tokio::test]
async fn mark_as_read_after_server_confirms() {
    let server = MockServer::start().await;
    mock_new_latest(&server, 42).await;
    Mock::given(method("PATCH"))
        .and(path("/notifications/42/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/notifications/99/read"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "not found" })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let setup = build(&server, dir.path());
    setup.engine.check_for_new().await;

    setup.engine.mark_as_read(42).await.unwrap();
    let state = setup.engine.snapshot().await;
    assert_eq!(state.get(42).unwrap().status, NotificationStatus::Read);
    assert_eq!(state.unread_count, 0);

    let before = setup.engine.snapshot().await;
    assert!(setup.engine.mark_as_read(99).await.is_err());
    let after = setup.engine.snapshot().await;
    assert_eq!(before.notifications, after.notifications);
    assert_eq!(after.unread_count, 0);
    assert!(setup.sessions.current().is_some());
}

#[tokio::test]
async fn shown_ids_survive_a_reload() {
    let server = MockServer::start().await;
    mock_new_latest(&server, 7).await;
    let dir = TempDir::new().unwrap();

    let first = build(&server, dir.path());
    first.engine.check_for_new().await;
    assert_eq!(first.engine.visible_toasts().await.len(), 1);
    first.engine.shutdown().await;

    let second = build(&server, dir.path());
    second.engine.check_for_new().await;
    assert!(second.engine.visible_toasts().await.is_empty());
    // Still merged into the fresh list, just not toasted.
    assert_eq!(second.engine.snapshot().await.notifications.len(), 1);
}

#[tokio::test]
async fn login_route_suppresses_and_clears_toasts() {
    let server = MockServer::start().await;
    mock_new_latest(&server, 3).await;
    let dir = TempDir::new().unwrap();
    let setup = build(&server, dir.path());

    setup.engine.check_for_new().await;
    assert_eq!(setup.engine.visible_toasts().await.len(), 1);

    setup.engine.set_route("/login").await;
    assert!(setup.engine.visible_toasts().await.is_empty());
    setup.engine.set_route("/tickets").await;
    assert!(setup.engine.visible_toasts().await.is_empty());
}

#[tokio::test]
async fn list_and_count_fetch() {
    let server = MockServer::start().await;
    let mut read = notification_json(2);
    read["status"] = json!("read");
    read["read_at"] = json!("2026-10-15T10:00:00Z");
    Mock::given(method("GET"))
        .and(path("/notifications/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([notification_json(1), read])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notifications/unread-count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unread_count": 1 })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/notifications/mark-all-read"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/notifications/1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let setup = build(&server, dir.path());

    setup.engine.fetch_notifications().await.unwrap();
    assert_eq!(setup.engine.fetch_unread_count().await.unwrap(), 1);
    let state = setup.engine.snapshot().await;
    assert_eq!(state.notifications.len(), 2);
    assert_eq!(state.unread_count, 1);

    setup.engine.mark_all_as_read().await.unwrap();
    assert_eq!(setup.engine.snapshot().await.unread_count, 0);

    setup.engine.remove_notification(1).await.unwrap();
    let state = setup.engine.snapshot().await;
    assert_eq!(state.notifications.len(), 1);
    assert_eq!(state.unread_count, 0);
}

#[tokio::test]
async fn failed_fetch_sets_error_and_keeps_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notifications/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([notification_json(1)])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notifications/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let setup = build(&server, dir.path());

    setup.engine.fetch_notifications().await.unwrap();
    assert!(setup.engine.fetch_notifications().await.is_err());

    let state = setup.engine.snapshot().await;
    assert_eq!(state.notifications.len(), 1);
    assert!(state.error.is_some());
    assert!(!state.loading);
}

#[tokio::test]
async fn unauthorized_logs_out_without_touching_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notifications/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "token expired" })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let setup = build(&server, dir.path());

    let err = setup.engine.fetch_notifications().await.unwrap_err();
    assert!(err.is_auth_failure());
    assert!(setup.sessions.current().is_none());

    let state = setup.engine.snapshot().await;
    assert!(state.error.is_none());
    assert!(state.notifications.is_empty());
}

#[tokio::test]
async fn stats_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notifications/stats"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "total": 10, "unread": 3, "read": 6, "deleted": 1 })),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let setup = build(&server, dir.path());
    let stats = setup.engine.fetch_stats().await.unwrap();
    assert_eq!((stats.total, stats.unread, stats.read, stats.deleted), (10, 3, 6, 1));
}
