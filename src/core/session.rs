//! 会话管理
//!
//! 每个会话独占一份 DialogueStore，放在 tokio Mutex 后面：同一会话的回合串行，
//! 不同会话并发。请求未携带 session_id 时由服务端生成新 ID 并在响应中返回，
//! 客户端之后回传该 ID 即可续接同一会话。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use crate::config::AppSection;
use crate::memory::{DialogueStore, Turn};

/// 会话 ID
pub type SessionId = String;

const MAX_SESSION_ID_LEN: usize = 128;

/// 默认会话数上限
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// 单个会话
#[derive(Debug)]
pub struct Session {
    dialogue: Mutex<DialogueStore>,
    last_active: std::sync::Mutex<Instant>,
}

impl Session {
    pub fn new(max_history_turns: Option<usize>) -> Self {
        Self {
            dialogue: Mutex::new(DialogueStore::with_max_turns(max_history_turns)),
            last_active: std::sync::Mutex::new(Instant::now()),
        }
    }

    pub fn dialogue(&self) -> &Mutex<DialogueStore> {
        &self.dialogue
    }

    pub fn touch(&self) {
        if let Ok(mut t) = self.last_active.lock() {
            *t = Instant::now();
        }
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .map(|t| t.elapsed())
            .unwrap_or_default()
    }
}

/// 会话注册表（session_id -> Session）
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
    max_history_turns: Option<usize>,
    /// None 表示从不过期
    idle_timeout: Option<Duration>,
    /// 达到上限后新建会话会挤掉最久未活动的空闲会话
    max_sessions: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(None, 0)
    }
}

impl SessionRegistry {
    pub fn new(max_history_turns: Option<usize>, idle_timeout_secs: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history_turns,
            idle_timeout: (idle_timeout_secs > 0).then(|| Duration::from_secs(idle_timeout_secs)),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }

    pub fn from_config(app: &AppSection) -> Self {
        Self::new(app.max_history_turns, app.session_idle_timeout_secs)
            .with_max_sessions(app.max_sessions)
    }

    /// 0 视为 1
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// 规范化客户端传来的 ID：去空白，过长截断；空值返回 None
    pub fn resolve_id(raw: Option<&str>) -> Option<SessionId> {
        raw.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|id| id.chars().take(MAX_SESSION_ID_LEN).collect())
    }

    /// 生成新的会话 ID
    pub fn new_id() -> SessionId {
        format!("session_{}", uuid::Uuid::new_v4())
    }

    pub async fn get_or_create(&self, session_id: &str) -> Arc<Session> {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            session.touch();
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(session_id) {
            return Arc::clone(session);
        }
        while sessions.len() >= self.max_sessions {
            if !Self::evict_least_recent(&mut sessions) {
                tracing::warn!(
                    max_sessions = self.max_sessions,
                    "session limit reached while every session is in use"
                );
                break;
            }
        }

        tracing::info!(session_id, "session created");
        let session = Arc::new(Session::new(self.max_history_turns));
        sessions.insert(session_id.to_string(), Arc::clone(&session));
        session
    }

    /// 移除最久未活动且未被请求持有的会话
    fn evict_least_recent(sessions: &mut HashMap<SessionId, Arc<Session>>) -> bool {
        let victim = sessions
            .iter()
            .filter(|(_, session)| Arc::strong_count(session) == 1)
            .max_by_key(|(_, session)| session.idle_for())
            .map(|(id, _)| id.clone());
        match victim {
            Some(id) => {
                tracing::info!(session_id = %id, "session evicted");
                sessions.remove(&id);
                true
            }
            None => false,
        }
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// 会话历史副本；会话不存在时返回 None，不会创建会话
    pub async fn history(&self, session_id: &str) -> Option<Vec<Turn>> {
        let session = self.get(session_id).await?;
        let dialogue = session.dialogue().lock().await;
        Some(dialogue.snapshot().to_vec())
    }

    /// 清理空闲超时的会话，返回清理数量；正在被请求使用的会话不会被清理
    pub async fn cleanup_expired(&self) -> usize {
        let Some(timeout) = self.idle_timeout else {
            return 0;
        };
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let in_use = Arc::strong_count(session) > 1;
            let keep = in_use || session.idle_for() <= timeout;
            if !keep {
                tracing::info!(session_id = %id, "session expired");
            }
            keep
        });
        before - sessions.len()
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}
