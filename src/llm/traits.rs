//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Groq / Mock）实现 LlmClient：输入有序的 Turn 列表，返回下一条 assistant 文本。

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::Turn;

/// 模型调用失败。对调用方而言这些都归为同一类 BackendError
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("LLM backend not configured: {0}")]
    NotConfigured(String),

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成
    async fn complete(&self, messages: &[Turn]) -> Result<String, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
