//! 回合编排：一条用户消息 -> 一条助手回复
//!
//! 流程：规范化输入 -> 追加 human Turn -> [人设] + 历史 发给模型 ->
//! 成功则追加 assistant Turn 并原样返回；失败则不追加，返回固定兜底文案。
//! 不重试，也不支持中途取消；超时可选（见 with_request_timeout）。

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::core::session::Session;
use crate::llm::{LlmClient, LlmError};
use crate::memory::{DialogueStore, Role, Turn};
use crate::persona::PersonaDirective;

/// 模型调用失败时返回给用户的文案
pub const FALLBACK_REPLY: &str = "I'm sorry, something went wrong. Please try again!";

/// 写入历史前对用户输入的处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// 转小写后存储（同时影响后续所有发往模型的历史）
    #[default]
    Lowercase,
    /// 保留用户原文
    Preserve,
}

impl Normalization {
    pub fn apply(&self, message: &str) -> String {
        match self {
            Normalization::Lowercase => message.to_lowercase(),
            Normalization::Preserve => message.to_string(),
        }
    }
}

/// 单个回合的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// 模型正常回复（已写入历史）
    Replied(String),
    /// 模型调用失败，text 为兜底文案，历史中只有 human Turn
    Fallback { text: String, error: LlmError },
}

impl TurnOutcome {
    pub fn text(&self) -> &str {
        match self {
            TurnOutcome::Replied(text) => text,
            TurnOutcome::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            TurnOutcome::Replied(text) => text,
            TurnOutcome::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, TurnOutcome::Fallback { .. })
    }
}

pub struct TurnOrchestrator {
    llm: Arc<dyn LlmClient>,
    persona: PersonaDirective,
    normalization: Normalization,
    request_timeout: Option<Duration>,
    fallback_text: String,
}

impl TurnOrchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, persona: PersonaDirective) -> Self {
        Self {
            llm,
            persona,
            normalization: Normalization::default(),
            request_timeout: None,
            fallback_text: FALLBACK_REPLY.to_string(),
        }
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// None 或 0 秒表示不限制，由底层传输决定
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout.filter(|d| !d.is_zero());
        self
    }

    pub fn with_fallback_text(mut self, text: impl Into<String>) -> Self {
        self.fallback_text = text.into();
        self
    }

    pub fn persona(&self) -> &PersonaDirective {
        &self.persona
    }

    /// 发往模型的消息：人设恰好一条且位于最前，历史中残留的 system Turn 一律跳过
    pub fn build_request(&self, history: &[Turn]) -> Vec<Turn> {
        std::iter::once(self.persona.as_turn())
            .chain(history.iter().filter(|t| t.role != Role::System).cloned())
            .collect()
    }

    pub async fn handle_user_message(&self, store: &mut DialogueStore, message: &str) -> TurnOutcome {
        store.append(Turn::human(self.normalization.apply(message)));

        let request = self.build_request(store.snapshot());
        tracing::debug!(turns = request.len(), "sending history to llm");

        match self.call_backend(&request).await {
            Ok(reply) => {
                store.append(Turn::assistant(reply.clone()));
                tracing::info!(history_len = store.len(), "turn completed");
                TurnOutcome::Replied(reply)
            }
            Err(error) => {
                tracing::warn!(%error, "llm call failed, replying with fallback");
                TurnOutcome::Fallback {
                    text: self.fallback_text.clone(),
                    error,
                }
            }
        }
    }

    /// 在会话内处理消息：整个回合持有该会话的锁，同一会话的回合串行执行，
    /// 不同会话互不阻塞
    pub async fn handle_session_message(&self, session: &Session, message: &str) -> TurnOutcome {
        session.touch();
        let mut dialogue = session.dialogue().lock().await;
        let outcome = self.handle_user_message(&mut dialogue, message).await;
        session.touch();
        outcome
    }

    async fn call_backend(&self, request: &[Turn]) -> Result<String, LlmError> {
        let reply = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, self.llm.complete(request))
                .await
                .map_err(|_| LlmError::Timeout(limit))??,
            None => self.llm.complete(request).await?,
        };
        if reply.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(reply)
    }
}
