//! 记忆层：对话单元与按会话划分的对话历史

pub mod conversation;
pub mod dialogue;

pub use conversation::{Role, Turn};
pub use dialogue::{DialogueStore, EvictionPolicy, SlidingWindow, Unbounded};
