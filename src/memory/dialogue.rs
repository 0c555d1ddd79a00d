//! 对话历史：DialogueStore
//!
//! 只追加、有序的 Turn 序列。默认不做任何裁剪（Unbounded）；需要限制长度时注入
//! EvictionPolicy，例如 SlidingWindow 只保留最近 N 条，且窗口总是从 human Turn 开始。
//!
//! 人设指令不存放在这里，由 TurnOrchestrator 在每次调用模型时前置。

use std::sync::Arc;

use super::conversation::{Role, Turn};

/// 历史裁剪策略：每次 append 之后调用
pub trait EvictionPolicy: Send + Sync {
    fn evict(&self, turns: &mut Vec<Turn>);
}

/// 不裁剪，历史随进程生命周期无限增长
#[derive(Debug, Default, Clone, Copy)]
pub struct Unbounded;

impl EvictionPolicy for Unbounded {
    fn evict(&self, _turns: &mut Vec<Turn>) {}
}

/// 滑动窗口：超出 max_turns 条时丢弃最旧的部分
///
/// 裁剪后若开头是孤立的 assistant 回复，一并丢弃，使 human/assistant 成对移除。
#[derive(Debug, Clone, Copy)]
pub struct SlidingWindow {
    max_turns: usize,
}

impl SlidingWindow {
    /// 至少保留一对
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns: max_turns.max(2),
        }
    }
}

impl EvictionPolicy for SlidingWindow {
    fn evict(&self, turns: &mut Vec<Turn>) {
        if turns.len() <= self.max_turns {
            return;
        }
        let excess = turns.len() - self.max_turns;
        turns.drain(..excess);
        if let Some(first_human) = turns.iter().position(|t| t.role == Role::Human) {
            turns.drain(..first_human);
        }
    }
}

#[derive(Clone)]
pub struct DialogueStore {
    turns: Vec<Turn>,
    policy: Arc<dyn EvictionPolicy>,
}

impl Default for DialogueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DialogueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueStore")
            .field("turns", &self.turns)
            .finish_non_exhaustive()
    }
}

impl DialogueStore {
    pub fn new() -> Self {
        Self::with_policy(Arc::new(Unbounded))
    }

    pub fn with_policy(policy: Arc<dyn EvictionPolicy>) -> Self {
        Self {
            turns: Vec::new(),
            policy,
        }
    }

    /// 按配置选择策略：None 或 0 为 Unbounded
    pub fn with_max_turns(max_turns: Option<usize>) -> Self {
        match max_turns {
            Some(n) if n > 0 => Self::with_policy(Arc::new(SlidingWindow::new(n))),
            _ => Self::new(),
        }
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.policy.evict(&mut self.turns);
    }

    /// 当前历史的只读视图，包含此前所有已完成的 append
    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
