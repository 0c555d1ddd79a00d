//! 对话请求的错误分类
//!
//! Validation 在 HTTP 边界产生，不会进入编排层；Backend 由 TurnOrchestrator 捕获，
//! 默认折叠为兜底回复，严格模式下才作为独立信号交给传输层；Internal 是其余一切。

use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Message is required")]
    Validation,

    #[error("Backend error: {0}")]
    Backend(#[from] LlmError),

    #[error("Internal error: {0}")]
    Internal(String),
}
