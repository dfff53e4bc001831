//! End-to-end badge reconciliation against an in-process backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use futures::SinkExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use vitrine_client::config::ClientConfig;
use vitrine_client::state::{AppState, Realtime};
use vitrine_client::{BadgeStore, CommandOutcome, Reconciler};
use vitrine_client::reconciler::RECONCILER_EVENTS;
use vitrine_net::ApiClient;
use vitrine_shared::types::{ConversationId, UserId};

#[derive(Default)]
struct Backend {
    /// Conversation id -> unread count for `u1`.
    unread: HashMap<String, u32>,
    notifications_read: bool,
}

type Shared = Arc<Mutex<Backend>>;

async fn conversations(State(backend): State<Shared>) -> Json<Value> {
    let backend = backend.lock().unwrap();
    let mut ids: Vec<_> = backend.unread.keys().cloned().collect();
    ids.sort();
    Json(Value::Array(
        ids.into_iter()
            .map(|id| {
                json!({
                    "_id": id,
                    "participants": ["u1", "shop-owner"],
                    "unreadCount": { "u1": backend.unread[&id], "shop-owner": 0 }
                })
            })
            .collect(),
    ))
}

async fn mark_read(State(backend): State<Shared>, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    if id == "locked" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "database unavailable" })),
        );
    }
    backend.lock().unwrap().unread.insert(id, 0);
    (StatusCode::OK, Json(json!({ "success": true })))
}

async fn notifications(State(backend): State<Shared>) -> Json<Value> {
    let read = backend.lock().unwrap().notifications_read;
    Json(json!([
        { "_id": "n1", "type": "like", "isRead": read, "createdAt": "2026-03-01T10:00:00Z" },
        { "_id": "n2", "type": "friend_request", "isRead": read, "createdAt": "2026-03-01T10:05:00Z" },
        { "_id": "n3", "type": "comment", "isRead": true, "createdAt": "2026-03-01T09:00:00Z" }
    ]))
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["password"] != "secret" {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid credentials" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "token": "tok-1",
            "user": { "_id": "u1", "name": "Lea", "email": body["email"] },
            "userType": "user"
        })),
    )
}

async fn serve(unread: &[(&str, u32)]) -> (String, Shared) {
    let backend: Shared = Arc::new(Mutex::new(Backend {
        unread: unread.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        notifications_read: false,
    }));

    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/chat/conversations", get(conversations))
        .route("/chat/conversations/:id/read", put(mark_read))
        .route("/notifications", get(notifications))
        .route(
            "/notifications/read-all",
            put(|State(backend): State<Shared>| async move {
                backend.lock().unwrap().notifications_read = true;
                Json(json!({ "success": true }))
            }),
        )
        .with_state(Arc::clone(&backend));

    let app = Router::new().nest("/api", api);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/api"), backend)
}

fn reconciler(base_url: &str) -> Reconciler<ApiClient> {
    let api = ApiClient::new(base_url).unwrap();
    api.set_token(Some("tok-1".into()));
    Reconciler::new(Arc::new(api), BadgeStore::new(UserId::new("u1")), None)
}

#[tokio::test]
async fn mark_read_round_trip_matches_backend() {
    let (base_url, backend) = serve(&[("a", 3), ("b", 2), ("locked", 1)]).await;
    let rec = reconciler(&base_url);

    rec.refresh_all().await;
    assert_eq!(rec.badges().snapshot().messages, 6);
    assert_eq!(rec.badges().snapshot().notifications, 2);

    let outcome = rec.mark_conversation_read(&ConversationId::new("a")).await;
    assert_eq!(outcome, CommandOutcome::Committed);
    assert_eq!(rec.badges().snapshot().messages, 3);
    assert_eq!(backend.lock().unwrap().unread["a"], 0);

    let outcome = rec.mark_conversation_read(&ConversationId::new("locked")).await;
    assert_eq!(outcome, CommandOutcome::RolledBack);
    assert_eq!(rec.badges().snapshot().messages, 3);

    // A fresh fetch agrees with the optimistic state.
    rec.refresh_messages().await.unwrap();
    assert_eq!(rec.badges().snapshot().messages, 3);
}

#[tokio::test]
async fn mark_all_notifications_read() {
    let (base_url, _backend) = serve(&[]).await;
    let rec = reconciler(&base_url);

    rec.refresh_notifications().await.unwrap();
    assert_eq!(rec.badges().snapshot().notifications, 2);

    assert_eq!(rec.mark_all_notifications_read().await, CommandOutcome::Committed);
    assert_eq!(rec.badges().snapshot().notifications, 0);

    rec.refresh_notifications().await.unwrap();
    assert_eq!(rec.badges().snapshot().notifications, 0);
}

#[tokio::test]
async fn unreachable_backend_keeps_counts() {
    let (base_url, _backend) = serve(&[("a", 2)]).await;
    let rec = reconciler(&base_url);
    rec.refresh_messages().await.unwrap();

    let offline = Reconciler::new(
        Arc::new(ApiClient::new("http://127.0.0.1:1/api").unwrap()),
        rec.badges().clone(),
        None,
    );
    assert!(offline.refresh_messages().await.is_err());
    assert_eq!(
        offline.mark_conversation_read(&ConversationId::new("a")).await,
        CommandOutcome::RolledBack
    );
    assert_eq!(rec.badges().snapshot().messages, 2);
}

#[tokio::test]
async fn session_login_restore_logout() {
    let (base_url, _backend) = serve(&[]).await;
    let dir = tempfile::tempdir().unwrap();

    let config = ClientConfig {
        api_base_url: base_url,
        data_dir: Some(dir.path().to_path_buf()),
        ..ClientConfig::default()
    };
    let state = AppState::open(config.clone()).unwrap();

    assert!(state.sessions.restore().unwrap().is_none());
    assert!(state.sessions.login("lea@example.com", "wrong").await.is_err());

    let session = state.sessions.login("lea@example.com", "secret").await.unwrap();
    assert_eq!(session.user.id, UserId::new("u1"));
    assert_eq!(state.api.token().as_deref(), Some("tok-1"));
    drop(state);

    let reopened = AppState::open(config).unwrap();
    let restored = reopened.sessions.restore().unwrap().unwrap();
    assert_eq!(restored.auth_token, "tok-1");
    assert_eq!(reopened.api.token().as_deref(), Some("tok-1"));

    reopened.sessions.logout().unwrap();
    assert!(reopened.sessions.restore().unwrap().is_none());
    assert_eq!(reopened.api.token(), None);
}

#[tokio::test]
async fn logout_zeroes_badges() {
    let (base_url, _backend) = serve(&[("a", 3)]).await;
    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        api_base_url: base_url,
        data_dir: Some(dir.path().to_path_buf()),
        ..ClientConfig::default()
    };
    let state = AppState::open(config).unwrap();
    state.sessions.login("lea@example.com", "secret").await.unwrap();

    let rec = Reconciler::new(Arc::new(state.api.clone()), state.badges.clone(), None);
    rec.refresh_all().await;
    assert_eq!(state.badges.snapshot().messages, 3);
    assert_eq!(state.badges.snapshot().notifications, 2);

    state.logout().unwrap();
    let snapshot = state.badges.snapshot();
    assert_eq!((snapshot.messages, snapshot.notifications, snapshot.orders), (0, 0, 0));
    assert!(state.sessions.restore().unwrap().is_none());
}

#[tokio::test]
async fn expired_session_is_discarded() {
    let (base_url, _backend) = serve(&[]).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = ClientConfig {
        api_base_url: base_url,
        data_dir: Some(dir.path().to_path_buf()),
        ..ClientConfig::default()
    };

    let state = AppState::open(config.clone()).unwrap();
    state.sessions.login("lea@example.com", "secret").await.unwrap();
    drop(state);

    config.session_max_age = Duration::from_millis(1);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let state = AppState::open(config).unwrap();
    assert!(state.sessions.restore().unwrap().is_none());
}

#[tokio::test]
async fn realtime_events_drive_badges() {
    let (base_url, backend) = serve(&[("a", 1)]).await;

    // Socket server pushing one chat message twice (both aliases), then a
    // read receipt after the backend has zeroed the counts.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let socket_addr = listener.local_addr().unwrap();
    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel::<()>();
    let server_backend = Arc::clone(&backend);
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ready_rx.await.unwrap();

        let message = json!({
            "_id": "m1", "conversationId": "a", "sender": "shop-owner",
            "text": "Back in stock!", "createdAt": "2026-03-01T10:00:00Z"
        });
        for event in ["new_message", "message:new"] {
            let frame = json!({ "event": event, "data": { "message": message } });
            ws.send(WsMessage::Text(frame.to_string())).await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        server_backend.lock().unwrap().unread.insert("a".into(), 0);
        let frame = json!({ "event": "messages_read", "data": { "conversationId": "a", "userId": "u1" } });
        ws.send(WsMessage::Text(frame.to_string())).await.unwrap();

        // Hold the connection open.
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let dir = tempfile::tempdir().unwrap();
    let config = ClientConfig {
        api_base_url: base_url,
        socket_url: format!("ws://{socket_addr}/socket"),
        data_dir: Some(dir.path().to_path_buf()),
        ..ClientConfig::default()
    };
    let state = AppState::open(config).unwrap();
    let session = state.sessions.login("lea@example.com", "secret").await.unwrap();

    let subscription = state.bridge.subscribe(RECONCILER_EVENTS);
    let Realtime { socket, reconciler } = state.start_realtime(&session).unwrap();
    let mut badges = reconciler.badges().subscribe();
    tokio::spawn(reconciler.run(subscription));

    // Connected triggers the initial sync.
    wait_for(&mut badges, |s| s.messages == 1).await;
    ready_tx.send(()).unwrap();

    wait_for(&mut badges, |s| s.messages == 2).await;
    wait_for(&mut badges, |s| s.messages == 0).await;

    socket.shutdown().await.unwrap();
}

async fn wait_for(
    rx: &mut tokio::sync::watch::Receiver<vitrine_client::BadgeSnapshot>,
    done: impl Fn(&vitrine_client::BadgeSnapshot) -> bool,
) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if done(&rx.borrow_and_update()) {
                return;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("badge totals never reached the expected value");
}
