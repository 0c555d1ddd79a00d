//! Companion - 人设驱动的网页聊天服务
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 回合编排、会话管理、错误分类
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Groq / Mock）
//! - **memory**: Turn 与对话历史 DialogueStore
//! - **observability**: 日志初始化
//! - **persona**: 人设指令
//! - **web**: axum 路由与处理函数

pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod persona;
#[cfg(feature = "web")]
pub mod web;

pub use crate::core::{TurnOrchestrator, TurnOutcome};
pub use memory::{DialogueStore, Role, Turn};
pub use persona::PersonaDirective;
