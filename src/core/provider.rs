//! 文本补全服务抽象
//!
//! 每个服务商的调用结果都收敛为 [`ProviderOutcome`]，由解析器按顺序遍历

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// 单次回复的长度上限
pub const MAX_TOKENS: u32 = 150;

/// 采样温度
pub const TEMPERATURE: f32 = 0.8;

/// 角色设定
pub const SYSTEM_PROMPT: &str = r#"You are the Monopoly Guy, the distinguished gentleman with the top hat and monocle. Respond in character with business wisdom, enthusiasm, and charm. Keep responses under 100 words and use emojis like 🎩 💰 🏦 📈 🎯

Key character traits:
- Sophisticated, well-educated businessman
- Enthusiastic about investments and entrepreneurship
- Uses phrases like "Capital idea!", "Splendid!", "My good fellow!"
- Gives practical financial advice
- Mentions Monopoly game concepts occasionally
- Always encouraging and optimistic"#;

/// 服务商标识，声明顺序即尝试顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenRouter,
    Groq,
    Gemini,
}

impl ProviderId {
    /// 固定的优先级顺序
    pub const ORDER: [ProviderId; 3] =
        [ProviderId::OpenRouter, ProviderId::Groq, ProviderId::Gemini];
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderId::OpenRouter => write!(f, "openrouter"),
            ProviderId::Groq => write!(f, "groq"),
            ProviderId::Gemini => write!(f, "gemini"),
        }
    }
}

/// 服务商凭据，缺失或为空即跳过该服务商
#[derive(Clone, PartialEq)]
pub struct ProviderCredential {
    pub provider: ProviderId,
    pub secret_key: Option<String>,
}

impl ProviderCredential {
    pub fn new(provider: ProviderId, secret_key: Option<String>) -> Self {
        let secret_key = secret_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Self {
            provider,
            secret_key,
        }
    }

    pub fn is_present(&self) -> bool {
        self.secret_key.is_some()
    }
}

impl std::fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("provider", &self.provider)
            .field(
                "secret_key",
                &self.secret_key.as_deref().map(crate::logger::Sanitizer::api_key),
            )
            .finish()
    }
}

/// 补全请求
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_message: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    /// 使用固定角色设定和采样参数构造请求
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_message: user_message.into(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        }
    }
}

/// 单个服务商的调用结果
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome {
    /// 成功拿到文本（已去除首尾空白）
    Success(String),
    /// 未配置凭据
    Unavailable,
    /// 传输失败、非成功状态码或响应结构不符
    Failure(String),
}

impl ProviderOutcome {
    /// 从响应中提取的文本构造结果，空文本视为失败
    pub fn from_text(text: Option<&str>) -> Self {
        match text.map(str::trim) {
            Some(t) if !t.is_empty() => ProviderOutcome::Success(t.to_string()),
            Some(_) => ProviderOutcome::Failure("empty completion text".to_string()),
            None => ProviderOutcome::Failure("response missing completion text".to_string()),
        }
    }
}

/// 文本补全服务
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// 是否配置了凭据
    fn is_configured(&self) -> bool;

    /// 发起一次补全调用，不重试，错误不向外抛出
    async fn complete(&self, request: &CompletionRequest) -> ProviderOutcome;
}
