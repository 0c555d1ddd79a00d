//! HTTP 接口集成测试：在进程内驱动 Router，后端使用 MockLlmClient

#![cfg(feature = "web")]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use companion::core::{SessionRegistry, TurnOrchestrator, FALLBACK_REPLY};
use companion::llm::{LlmError, MockLlmClient};
use companion::memory::{Role, Turn};
use companion::persona::PersonaDirective;
use companion::web::{router, AppState, ChatResponse, HistoryResponse, StatusResponse};

const PERSONA: &str = "You are Aaradhya.";

fn make_state(mock: Arc<MockLlmClient>) -> Arc<AppState> {
    let orchestrator = TurnOrchestrator::new(mock, PersonaDirective::new(PERSONA));
    Arc::new(AppState::new(orchestrator, SessionRegistry::default()))
}

fn post_chat(body: &str) -> Request<Body> {
    Request::post("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, body.to_vec())
}

async fn session_history(state: &AppState, session_id: &str) -> Vec<Turn> {
    state.sessions.history(session_id).await.unwrap_or_default()
}

/// 按页面的方式发一条消息：带上已知的 session_id，返回服务端确认的 ID
async fn page_send(app: &Router, message: &str, session_id: Option<&str>) -> ChatResponse {
    let body = serde_json::json!({ "message": message, "session_id": session_id });
    let (status, body) = send(app, post_chat(&body.to_string())).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_chat_success_records_pair() {
    let mock = Arc::new(MockLlmClient::replying("Hey there! 😊"));
    let state = make_state(mock);
    let app = router(Arc::clone(&state));

    let (status, body) = send(&app, post_chat(r#"{"message": "Hello"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    let resp: ChatResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(resp.response, "Hey there! 😊");
    assert!(resp.session_id.starts_with("session_"));
    assert!(chrono::DateTime::parse_from_rfc3339(&resp.timestamp).is_ok());

    assert_eq!(
        session_history(&state, &resp.session_id).await,
        vec![Turn::human("hello"), Turn::assistant("Hey there! 😊")]
    );
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let mock = Arc::new(MockLlmClient::default());
    let state = make_state(mock.clone());
    let app = router(Arc::clone(&state));

    for body in [r#"{"message": ""}"#, r#"{"message": "   "}"#, r#"{}"#] {
        let (status, body) = send(&app, post_chat(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Message is required");
    }

    assert_eq!(state.sessions.active_count().await, 0);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_backend_failure_returns_fallback() {
    let mock = Arc::new(MockLlmClient::failing(LlmError::Request("connection refused".into())));
    let state = make_state(mock);
    let app = router(Arc::clone(&state));

    let resp = page_send(&app, "are you there?", None).await;

    assert_eq!(resp.response, FALLBACK_REPLY);
    assert_eq!(
        session_history(&state, &resp.session_id).await,
        vec![Turn::human("are you there?")]
    );
}

#[tokio::test]
async fn test_strict_mode_surfaces_backend_error() {
    let mock = Arc::new(MockLlmClient::failing(LlmError::Timeout(Duration::from_secs(60))));
    let orchestrator = TurnOrchestrator::new(mock, PersonaDirective::new(PERSONA));
    let state = Arc::new(
        AppState::new(orchestrator, SessionRegistry::default()).with_strict_backend_errors(true),
    );
    let app = router(Arc::clone(&state));

    let (status, body) = send(&app, post_chat(r#"{"message": "hi", "session_id": "s1"}"#)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "Something went wrong");
    assert_eq!(session_history(&state, "s1").await, vec![Turn::human("hi")]);
}

#[tokio::test]
async fn test_malformed_body_is_internal_error() {
    let state = make_state(Arc::new(MockLlmClient::default()));
    let app = router(state);

    let (status, body) = send(&app, post_chat("not json")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "Something went wrong");
}

#[tokio::test]
async fn test_index_page_does_not_touch_history() {
    let mock = Arc::new(MockLlmClient::default());
    let state = make_state(mock.clone());
    let app = router(Arc::clone(&state));

    for _ in 0..3 {
        let (status, body) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains("/api/chat"));
    }
    let first = page_send(&app, "one", None).await;
    send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    page_send(&app, "two", Some(&first.session_id)).await;

    let requests = mock.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request[0], Turn::system(PERSONA));
        assert_eq!(request.iter().filter(|t| t.role == Role::System).count(), 1);
    }
    let history = session_history(&state, &first.session_id).await;
    assert_eq!(history.len(), 4);
    assert!(history.iter().all(|t| t.role != Role::System));
}

#[tokio::test]
async fn test_status_endpoint() {
    let state = make_state(Arc::new(MockLlmClient::default()));
    let app = router(state);

    let (status, body) = send(&app, Request::get("/api/status").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    let resp: StatusResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(resp.status, "online");
    assert_eq!(resp.message, "Your AI girlfriend is here for you! 💕");
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = router(make_state(Arc::new(MockLlmClient::default())));
    let (status, body) = send(&app, Request::get("/api/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_sessions_are_partitioned() {
    let mock = Arc::new(MockLlmClient::default());
    let state = make_state(mock);
    let app = router(Arc::clone(&state));

    send(&app, post_chat(r#"{"message": "from alice", "session_id": "alice"}"#)).await;
    send(&app, post_chat(r#"{"message": "from bob", "session_id": "bob"}"#)).await;

    let (status, body) = send(
        &app,
        Request::get("/api/history?session_id=alice").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let history: HistoryResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(history.session_id, "alice");
    assert_eq!(
        history.messages,
        vec![Turn::human("from alice"), Turn::assistant("Echo: from alice")]
    );
    assert_eq!(state.sessions.active_count().await, 2);
}

#[tokio::test]
async fn test_history_of_unknown_session_is_empty() {
    let state = make_state(Arc::new(MockLlmClient::default()));
    let app = router(Arc::clone(&state));

    let (status, body) = send(
        &app,
        Request::get("/api/history?session_id=nobody").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let history: HistoryResponse = serde_json::from_slice(&body).unwrap();
    assert!(history.messages.is_empty());

    let (status, body) = send(&app, Request::get("/api/history").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let history: HistoryResponse = serde_json::from_slice(&body).unwrap();
    assert!(history.session_id.is_empty());
    assert!(history.messages.is_empty());
    assert_eq!(state.sessions.active_count().await, 0);
}

#[tokio::test]
async fn test_clients_without_session_id_are_isolated() {
    let mock = Arc::new(MockLlmClient::default());
    let state = make_state(mock.clone());
    let app = router(Arc::clone(&state));

    // 两个页面首次请求都不带 session_id，各自记住返回的 ID
    let alice = page_send(&app, "my secret is pineapple", None).await;
    let bob = page_send(&app, "hello", None).await;
    assert_ne!(alice.session_id, bob.session_id);

    page_send(&app, "again", Some(&bob.session_id)).await;

    let requests = mock.requests();
    assert_eq!(requests.len(), 3);
    for request in &requests[1..] {
        assert!(request.iter().all(|t| !t.content.contains("pineapple")));
    }
    assert_eq!(
        session_history(&state, &bob.session_id).await,
        vec![
            Turn::human("hello"),
            Turn::assistant("Echo: hello"),
            Turn::human("again"),
            Turn::assistant("Echo: again"),
        ]
    );
    assert_eq!(session_history(&state, &alice.session_id).await.len(), 2);
}

#[tokio::test]
async fn test_concurrent_requests_keep_pairs_together() {
    let mock = Arc::new(MockLlmClient::default().with_delay(Duration::from_millis(20)));
    let state = make_state(mock);
    let app = router(Arc::clone(&state));

    let (a, b) = tokio::join!(
        send(&app, post_chat(r#"{"message": "first", "session_id": "shared"}"#)),
        send(&app, post_chat(r#"{"message": "second", "session_id": "shared"}"#)),
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);

    let history = session_history(&state, "shared").await;
    assert_eq!(history.len(), 4);
    for pair in history.chunks(2) {
        assert_eq!(pair[0].role, Role::Human);
        assert_eq!(pair[1], Turn::assistant(format!("Echo: {}", pair[0].content)));
    }
}
