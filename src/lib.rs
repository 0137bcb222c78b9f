//! 学生分会网站后端
//!
//! 提供网站背后的两条业务链路：
//! - 聊天回复（按顺序尝试多个 AI 服务，全部失败时使用本地兜底回复）
//! - 表单通知（联系表单、入会申请逐个发送给干部）
//!
//! # 架构分层
//!
//! - `domain`: 领域模型，纯数据
//! - `core`: 核心层，回复解析与通知分发
//! - `infrastructure`: 基础设施层，外部系统交互
//! - `application`: 应用层，业务编排

// 领域层
pub mod domain;

// 核心层
pub mod core;

// 基础设施层
pub mod infrastructure;

// 应用层
pub mod application;

// 横切关注点
pub mod config;
pub mod errors;
pub mod logger;

pub use crate::application::chat_service::{ChatExchange, ChatService, SessionLimits};
pub use crate::application::portal::Portal;
pub use crate::config::AppConfig;
pub use crate::core::notifier::{
    Mailer, Notifier, NotifyReport, Outcome, RecipientSource, Templates,
};
pub use crate::core::provider::{
    CompletionProvider, CompletionRequest, ProviderCredential, ProviderId, ProviderOutcome,
};
pub use crate::core::resolver::{FallbackDelay, ReplySource, Resolution, ResponseResolver};
pub use crate::domain::{
    ChatMessage, ChatSession, ContactForm, FormStatus, FormSubmission, MembershipApplication,
    RecipientRecord,
};
pub use crate::errors::{PortalError, Result};
pub use crate::infrastructure::web::{create_router, start_web_server, AppState};

/// 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
