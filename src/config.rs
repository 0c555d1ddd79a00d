//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `COMPANION__*` 覆盖（双下划线表示嵌套，如 `COMPANION__LLM__PROVIDER=openai`）。
//! 所有值在进程启动时确定，运行期不可修改。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::Normalization;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub web: WebSection,
    pub persona: PersonaSection,
}

/// [app] 段：日志、输入规范化、历史裁剪、会话过期
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// RUST_LOG 未设置时使用
    pub log_level: String,
    pub normalize_input: Normalization,
    /// 每个会话保留的最大 Turn 数；未设置为不限制
    pub max_history_turns: Option<usize>,
    /// 为 true 时模型调用失败返回 502，而不是 200 + 兜底回复
    pub strict_backend_errors: bool,
    /// 会话空闲多久后回收（秒），0 表示从不回收
    pub session_idle_timeout_secs: u64,
    /// 同时保留的会话数上限，超出时淘汰最久未活动的会话
    pub max_sessions: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            log_level: "info".to_string(),
            normalize_input: Normalization::default(),
            max_history_turns: None,
            strict_backend_errors: false,
            session_idle_timeout_secs: 3600,
            max_sessions: crate::core::DEFAULT_MAX_SESSIONS,
        }
    }
}

/// [llm] 段：后端选择、采样参数与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：groq / openai / mock
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// 未设置时读取 GROQ_API_KEY / OPENAI_API_KEY
    pub api_key: Option<String>,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: crate::llm::GROQ_LLAMA_70B.to_string(),
            base_url: None,
            temperature: 0.8,
            max_tokens: 512,
            api_key: None,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次模型调用超时（秒），0 表示不限制
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [web] 段：监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSection {
    pub host: String,
    pub port: u16,
}

impl Default for WebSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// [persona] 段：人设指令文件与状态接口文案
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersonaSection {
    /// 覆盖内置人设的文本文件
    pub prompt_path: Option<PathBuf>,
    pub status_message: String,
}

impl Default for PersonaSection {
    fn default() -> Self {
        Self {
            prompt_path: None,
            status_message: crate::persona::DEFAULT_STATUS_MESSAGE.to_string(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 COMPANION__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 COMPANION__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("COMPANION")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
