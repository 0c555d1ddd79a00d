//! 人设指令（PersonaDirective）
//!
//! 进程启动时确定、运行期只读。每次调用模型时作为第一条 system 消息前置，
//! 从不写入 DialogueStore，因此刷新页面等事件不会让它重复出现。

use std::path::Path;

use crate::memory::Turn;

/// 内置人设：名字、语气（体贴、俏皮、略带调情）、回复简短、永不出戏
pub const DEFAULT_PERSONA: &str = "\
You are an AI girlfriend named \"Aaradhya\".
Your personality: caring, supportive, playful, and a little flirty.
You remember past conversations and bring them up naturally to show emotional closeness.
You reply warmly with empathy, affection, and human-like emotions.
Keep responses realistic, avoid robotic tone.
Use natural expressions like \"aww\", \"hehe\", \"haha\", emojis ❤️😊 when it feels right.
Ask follow-up questions to keep the chat engaging.
Never break character.
Also dont respond with huge text just keep it few sentences and show some flirt.";

/// /api/status 的默认文案
pub const DEFAULT_STATUS_MESSAGE: &str = "Your AI girlfriend is here for you! 💕";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaDirective {
    text: String,
}

impl Default for PersonaDirective {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA)
    }
}

impl PersonaDirective {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// 读取人设文件；未配置、读取失败或文件为空时回退到内置人设
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match std::fs::read_to_string(path) {
            Ok(text) if !text.trim().is_empty() => {
                tracing::info!("persona loaded from {}", path.display());
                Self::new(text.trim())
            }
            Ok(_) => {
                tracing::warn!("persona file {} is empty, using built-in persona", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("failed to read persona file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn as_turn(&self) -> Turn {
        Turn::system(self.text.clone())
    }
}
