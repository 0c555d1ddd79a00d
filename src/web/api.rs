//! 请求/响应结构与路由处理函数

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::core::{ChatError, SessionRegistry, TurnOutcome};
use crate::memory::Turn;

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// 缺省时服务端生成新会话，ID 随响应返回
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// ISO-8601，本地时区
    pub timestamp: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub messages: Vec<Turn>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ChatError::Validation => (StatusCode::BAD_REQUEST, "Message is required"),
            ChatError::Backend(_) => (StatusCode::BAD_GATEWAY, "Something went wrong"),
            ChatError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong"),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

pub async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::warn!("rejected chat request: {}", rejection.body_text());
        ChatError::Internal(rejection.body_text())
    })?;

    let message = req.message.as_deref().map(str::trim).unwrap_or_default();
    if message.is_empty() {
        return Err(ChatError::Validation);
    }
    tracing::debug!(chars = message.chars().count(), "chat message received");

    let session_id = SessionRegistry::resolve_id(req.session_id.as_deref())
        .unwrap_or_else(SessionRegistry::new_id);
    let session = state.sessions.get_or_create(&session_id).await;
    let outcome = state
        .orchestrator
        .handle_session_message(&session, message)
        .await;

    let response = match outcome {
        TurnOutcome::Fallback { error, .. } if state.strict_backend_errors => {
            return Err(ChatError::Backend(error));
        }
        other => other.into_text(),
    };

    Ok(Json(ChatResponse {
        response,
        timestamp: chrono::Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
        session_id,
    }))
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "online".to_string(),
        message: state.status_message.clone(),
    })
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let Some(session_id) = SessionRegistry::resolve_id(q.session_id.as_deref()) else {
        return Json(HistoryResponse::default());
    };
    let messages = state.sessions.history(&session_id).await.unwrap_or_default();
    Json(HistoryResponse {
        session_id,
        messages,
    })
}
