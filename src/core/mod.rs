//! 核心编排层：错误分类、回合编排、会话管理

pub mod error;
pub mod orchestrator;
pub mod session;

pub use error::ChatError;
pub use orchestrator::{Normalization, TurnOrchestrator, TurnOutcome, FALLBACK_REPLY};
pub use session::{Session, SessionId, SessionRegistry, DEFAULT_MAX_SESSIONS};
