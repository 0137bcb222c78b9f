//! 聊天服务
//!
//! 管理内存中的聊天会话，并把用户消息交给回复解析器。
//! 访客关掉窗口时不一定会发 DELETE，闲置超时的会话由后台任务回收，
//! 会话总数也有上限。

use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::core::resolver::{ReplySource, Resolution, ResponseResolver};
use crate::domain::{ChatMessage, ChatSession, SessionId};
use crate::errors::{PortalError, Result};

/// 一轮问答
#[derive(Debug, Clone, Serialize)]
pub struct ChatExchange {
    pub user: ChatMessage,
    pub reply: ChatMessage,
    pub source: ReplySource,
}

/// 会话回收策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// 超过该时长没有活动的会话会被回收
    pub idle_ttl: Duration,
    /// 同时打开的会话上限，满时回收最久未活动的会话
    pub max_sessions: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            max_sessions: 1000,
        }
    }
}

struct SessionEntry {
    session: ChatSession,
    last_active: Instant,
}

/// 聊天服务
pub struct ChatService {
    resolver: Arc<ResponseResolver>,
    sessions: DashMap<SessionId, SessionEntry>,
    limits: SessionLimits,
}

impl ChatService {
    pub fn new(resolver: Arc<ResponseResolver>) -> Self {
        Self::with_limits(resolver, SessionLimits::default())
    }

    pub fn with_limits(resolver: Arc<ResponseResolver>, limits: SessionLimits) -> Self {
        Self {
            resolver,
            sessions: DashMap::new(),
            limits,
        }
    }

    pub fn resolver(&self) -> &ResponseResolver {
        &self.resolver
    }

    /// 当前打开的会话数
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// 打开新会话，返回带开场白的快照
    pub fn open_session(&self) -> ChatSession {
        self.evict_idle();
        while self.sessions.len() >= self.limits.max_sessions.max(1) {
            if !self.evict_least_recent() {
                break;
            }
        }

        let session = ChatSession::new();
        self.sessions.insert(
            session.id.clone(),
            SessionEntry {
                session: session.clone(),
                last_active: Instant::now(),
            },
        );
        info!(session_id = %session.id, "chat session opened");
        session
    }

    /// 会话历史
    pub fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>> {
        self.sessions
            .get(session_id)
            .map(|e| e.session.messages().to_vec())
            .ok_or_else(|| not_found(session_id))
    }

    /// 关闭会话，历史随之丢弃
    pub fn close_session(&self, session_id: &str) -> Result<()> {
        match self.sessions.remove(session_id) {
            Some(_) => {
                info!(session_id, "chat session closed");
                Ok(())
            }
            None => Err(not_found(session_id)),
        }
    }

    /// 单次问答，不保存历史
    pub async fn ask(&self, text: &str) -> Result<Resolution> {
        let text = normalize(text)?;
        Ok(self.resolver.resolve_detailed(text).await)
    }

    /// 在会话中发送消息并等待回复
    pub async fn send(&self, session_id: &str, text: &str) -> Result<ChatExchange> {
        let text = normalize(text)?;

        // 等待回复期间不能持有 DashMap 的锁
        let user = {
            let mut entry = self
                .sessions
                .get_mut(session_id)
                .ok_or_else(|| not_found(session_id))?;
            entry.last_active = Instant::now();
            entry.session.push_user(text).clone()
        };

        let resolution = self.resolver.resolve_detailed(text).await;

        let mut entry = self.sessions.get_mut(session_id).ok_or_else(|| {
            debug!(session_id, "session closed while waiting for reply, discarding");
            not_found(session_id)
        })?;
        entry.last_active = Instant::now();
        let reply = entry.session.push_bot(resolution.text).clone();

        Ok(ChatExchange {
            user,
            reply,
            source: resolution.source,
        })
    }

    /// 回收闲置超时的会话，返回回收数量
    pub fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let ttl = self.limits.idle_ttl;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.duration_since(entry.last_active) < ttl);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            info!(evicted, remaining = self.sessions.len(), "idle chat sessions evicted");
        }
        evicted
    }

    fn evict_least_recent(&self) -> bool {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|entry| entry.last_active)
            .map(|entry| entry.key().clone());
        match oldest {
            Some(id) => {
                debug!(session_id = %id, "session limit reached, evicting least recent");
                self.sessions.remove(&id).is_some()
            }
            None => false,
        }
    }

    /// 启动后台回收任务，服务被释放后任务自动结束
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let period = (self.limits.idle_ttl / 2).max(Duration::from_millis(100));
        let service: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                match service.upgrade() {
                    Some(service) => {
                        service.evict_idle();
                    }
                    None => break,
                }
            }
        })
    }
}

fn not_found(session_id: &str) -> PortalError {
    PortalError::NotFound(format!("chat session {}", session_id))
}

fn normalize(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(PortalError::Validation("message must not be empty".to_string()));
    }
    Ok(trimmed)
}
