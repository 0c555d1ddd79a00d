//! Mock LLM 客户端（用于测试与离线运行，无需 API）
//!
//! 默认回显最后一条 human 消息；也可按顺序预置回复或失败，并记录收到的每次请求，便于断言发送顺序。

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError};
use crate::memory::{Role, Turn};

/// 单次调用的预置结果
#[derive(Debug, Clone)]
pub enum MockReply {
    Echo,
    Text(String),
    Fail(LlmError),
}

#[derive(Debug)]
pub struct MockLlmClient {
    script: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    delay: Option<Duration>,
    requests: Mutex<Vec<Vec<Turn>>>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::with_default(MockReply::Echo)
    }
}

impl MockLlmClient {
    fn with_default(fallback: MockReply) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 每次都返回同一段文本
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_default(MockReply::Text(text.into()))
    }

    /// 每次都失败
    pub fn failing(error: LlmError) -> Self {
        Self::with_default(MockReply::Fail(error))
    }

    /// 预置脚本先于默认行为被消费
    pub fn with_script(self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.extend(replies);
        }
        self
    }

    /// 模拟慢后端
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 迄今收到的所有请求（按调用顺序）
    pub fn requests(&self) -> Vec<Vec<Turn>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn next_reply(&self) -> MockReply {
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Turn]) -> Result<String, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }
        let reply = self.next_reply();

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            MockReply::Echo => {
                let last_human = messages
                    .iter()
                    .rev()
                    .find(|t| t.role == Role::Human)
                    .map(|t| t.content.as_str())
                    .unwrap_or("(no input)");
                Ok(format!("Echo: {}", last_human))
            }
            MockReply::Text(text) => Ok(text),
            MockReply::Fail(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_last_human() {
        let mock = MockLlmClient::default();
        let reply = mock
            .complete(&[Turn::human("one"), Turn::assistant("x"), Turn::human("two")])
            .await
            .unwrap();
        assert_eq!(reply, "Echo: two");
    }

    #[tokio::test]
    async fn test_script_then_default() {
        let mock = MockLlmClient::replying("default").with_script([
            MockReply::Fail(LlmError::EmptyResponse),
            MockReply::Text("scripted".into()),
        ]);
        assert_eq!(mock.complete(&[]).await, Err(LlmError::EmptyResponse));
        assert_eq!(mock.complete(&[]).await.unwrap(), "scripted");
        assert_eq!(mock.complete(&[]).await.unwrap(), "default");
        assert_eq!(mock.requests().len(), 3);
    }
}
