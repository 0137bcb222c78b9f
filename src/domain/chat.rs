//! 聊天领域实体
//!
//! 会话内消息只追加、不修改，会话关闭即丢弃

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 会话ID
pub type SessionId = String;

/// 新会话的开场白
pub const GREETING: &str = "Greetings! I'm the Monopoly Guy! Ready to talk business? 💰";

/// 聊天消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// 会话内序号，从 1 开始
    pub id: u64,
    pub text: String,
    pub is_from_bot: bool,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(id: u64, text: impl Into<String>, is_from_bot: bool) -> Self {
        Self {
            id,
            text: text.into(),
            is_from_bot,
            sent_at: Utc::now(),
        }
    }
}

/// 聊天会话
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// 创建带开场白的新会话
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string())
    }

    /// 使用指定 ID 创建会话
    pub fn with_id(id: impl Into<SessionId>) -> Self {
        let mut session = Self {
            id: id.into(),
            created_at: Utc::now(),
            messages: Vec::new(),
        };
        session.push_bot(GREETING);
        session
    }

    /// 追加用户消息
    pub fn push_user(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.push(text, false)
    }

    /// 追加机器人回复
    pub fn push_bot(&mut self, text: impl Into<String>) -> &ChatMessage {
        self.push(text, true)
    }

    fn push(&mut self, text: impl Into<String>, is_from_bot: bool) -> &ChatMessage {
        let id = self.messages.last().map_or(1, |m| m.id + 1);
        let index = self.messages.len();
        self.messages.push(ChatMessage::new(id, text, is_from_bot));
        &self.messages[index]
    }

    /// 按时间顺序的消息列表
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}
