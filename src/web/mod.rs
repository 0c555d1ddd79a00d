//! HTTP 层（axum）
//!
//! - `GET /`            聊天页面（无副作用）
//! - `POST /api/chat`   发送消息，返回回复与时间戳
//! - `GET /api/status`  固定的在线状态
//! - `GET /api/history` 只读查看某个会话的历史
//! - `GET /api/health`  存活探针

pub mod api;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, routing::post, Router};

use crate::config::AppConfig;
use crate::core::{SessionRegistry, TurnOrchestrator};
use crate::llm::create_llm_from_config;
use crate::persona::{PersonaDirective, DEFAULT_STATUS_MESSAGE};

pub use api::{ChatRequest, ChatResponse, HistoryResponse, StatusResponse};

pub struct AppState {
    pub orchestrator: TurnOrchestrator,
    pub sessions: SessionRegistry,
    pub status_message: String,
    /// 为 true 时模型失败返回 502
    pub strict_backend_errors: bool,
}

impl AppState {
    pub fn new(orchestrator: TurnOrchestrator, sessions: SessionRegistry) -> Self {
        Self {
            orchestrator,
            sessions,
            status_message: DEFAULT_STATUS_MESSAGE.to_string(),
            strict_backend_errors: false,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        let llm = create_llm_from_config(&cfg.llm);
        let persona = PersonaDirective::load(cfg.persona.prompt_path.as_deref());
        let orchestrator = TurnOrchestrator::new(llm, persona)
            .with_normalization(cfg.app.normalize_input)
            .with_request_timeout(Some(Duration::from_secs(cfg.llm.timeouts.request)));
        let sessions = SessionRegistry::from_config(&cfg.app);

        Self {
            orchestrator,
            sessions,
            status_message: cfg.persona.status_message.clone(),
            strict_backend_errors: cfg.app.strict_backend_errors,
        }
    }

    pub fn with_strict_backend_errors(mut self, strict: bool) -> Self {
        self.strict_backend_errors = strict;
        self
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::index))
        .route("/api/chat", post(api::chat))
        .route("/api/status", get(api::status))
        .route("/api/history", get(api::history))
        .route("/api/health", get(|| async { "OK" }))
        .with_state(state)
}

/// 定期回收空闲会话；未配置超时则不启动
pub fn spawn_session_reaper(state: Arc<AppState>) -> Option<tokio::task::JoinHandle<()>> {
    let timeout = state.sessions.idle_timeout()?;
    let period = (timeout / 2).max(Duration::from_secs(1));
    tracing::info!("session reaper enabled, idle timeout {}s", timeout.as_secs());

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await; // 跳过启动后立即执行
        loop {
            interval.tick().await;
            let removed = state.sessions.cleanup_expired().await;
            if removed > 0 {
                tracing::info!("expired {} idle sessions", removed);
            }
        }
    }))
}
