//! Groq API 客户端（OpenAI 兼容格式）
//!
//! - Base URL: https://api.groq.com/openai/v1
//! - 模型: llama-3.3-70b-versatile（默认）、llama-3.1-8b-instant 等

use crate::llm::{OpenAiClient, SamplingParams};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_LLAMA_70B: &str = "llama-3.3-70b-versatile";
pub const GROQ_LLAMA_8B: &str = "llama-3.1-8b-instant";

/// 创建 Groq 客户端
///
/// - api_key 未传入时读取环境变量 `GROQ_API_KEY`
/// - base_url 未传入时使用 GROQ_BASE_URL
pub fn create_groq_client(
    base_url: Option<&str>,
    model: &str,
    api_key: Option<&str>,
    sampling: SamplingParams,
) -> OpenAiClient {
    let api_key = api_key
        .map(String::from)
        .or_else(|| std::env::var("GROQ_API_KEY").ok());
    if api_key.is_none() {
        tracing::warn!("GROQ_API_KEY not set; every chat turn will fall back");
    }

    OpenAiClient::new(
        Some(base_url.unwrap_or(GROQ_BASE_URL)),
        model,
        api_key.as_deref(),
        sampling,
    )
}
