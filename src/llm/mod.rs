//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Groq / Mock）

pub mod groq;
pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;

pub use groq::{create_groq_client, GROQ_BASE_URL, GROQ_LLAMA_70B, GROQ_LLAMA_8B};
pub use mock::{MockLlmClient, MockReply};
pub use openai::{OpenAiClient, SamplingParams, TokenUsage};
pub use traits::{LlmClient, LlmError};

use crate::config::LlmSection;

/// 后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Groq,
    OpenAi,
    Mock,
}

impl Provider {
    /// 大小写不敏感；未知值按 groq 处理
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "groq" => Self::Groq,
            "openai" => Self::OpenAi,
            "mock" => Self::Mock,
            other => {
                tracing::warn!("unknown llm provider '{}', falling back to groq", other);
                Self::Groq
            }
        }
    }
}

/// 按 [llm] 段构建后端
pub fn create_llm_from_config(cfg: &LlmSection) -> Arc<dyn LlmClient> {
    let sampling = SamplingParams {
        temperature: cfg.temperature,
        max_tokens: cfg.max_tokens,
    };
    let api_key = cfg.api_key.as_deref().filter(|k| !k.is_empty());

    match Provider::parse(&cfg.provider) {
        Provider::Mock => {
            tracing::info!("using mock LLM backend");
            Arc::new(MockLlmClient::default())
        }
        Provider::OpenAi => {
            let key = api_key
                .map(String::from)
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
            tracing::info!(model = %cfg.model, "using OpenAI-compatible backend");
            Arc::new(OpenAiClient::new(
                cfg.base_url.as_deref(),
                &cfg.model,
                key.as_deref(),
                sampling,
            ))
        }
        Provider::Groq => {
            tracing::info!(model = %cfg.model, "using Groq backend");
            Arc::new(create_groq_client(
                cfg.base_url.as_deref(),
                &cfg.model,
                api_key,
                sampling,
            ))
        }
    }
}
