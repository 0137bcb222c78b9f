//! LLM 客户端
//!
//! OpenRouter 与 Groq 走 OpenAI 兼容的 chat/completions 接口，Gemini 走 generateContent。
//! 所有传输、状态码和解析错误都转换为 [`ProviderOutcome::Failure`]。

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::provider::{
    CompletionProvider, CompletionRequest, ProviderCredential, ProviderId, ProviderOutcome,
};

pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const OPENROUTER_MODEL: &str = "meta-llama/llama-3.2-3b-instruct:free";
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_MODEL: &str = "llama3-8b-8192";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_MODEL: &str = "gemini-2.0-flash";

/// 出现在 OpenRouter 统计中的应用名
const APP_TITLE: &str = "Monopoly Guy Chatbot";

// ==================== OpenAI 兼容接口 ====================

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Message {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Message {
    fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.to_string()),
        }
    }

    fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<Message>,
}

impl ChatResponse {
    fn text(&self) -> Option<&str> {
        self.choices
            .first()?
            .message
            .as_ref()?
            .content
            .as_deref()
    }
}

/// OpenAI 兼容的补全客户端（OpenRouter / Groq）
#[derive(Clone)]
pub struct OpenAICompatibleClient {
    id: ProviderId,
    api_key: Option<String>,
    model: String,
    base_url: String,
    referer: Option<String>,
    http: reqwest::Client,
}

impl OpenAICompatibleClient {
    pub fn new_with_base_url(
        credential: ProviderCredential,
        model: impl Into<String>,
        base_url: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            id: credential.provider,
            api_key: credential.secret_key,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            referer: None,
            http,
        }
    }

    /// OpenRouter 默认配置
    pub fn openrouter(api_key: Option<String>, http: reqwest::Client) -> Self {
        Self::new_with_base_url(
            ProviderCredential::new(ProviderId::OpenRouter, api_key),
            OPENROUTER_MODEL,
            OPENROUTER_BASE_URL,
            http,
        )
    }

    /// Groq 默认配置
    pub fn groq(api_key: Option<String>, http: reqwest::Client) -> Self {
        Self::new_with_base_url(
            ProviderCredential::new(ProviderId::Groq, api_key),
            GROQ_MODEL,
            GROQ_BASE_URL,
            http,
        )
    }

    /// 设置 OpenRouter 要求的来源站点（HTTP-Referer）
    pub fn with_referer(mut self, origin: impl Into<String>) -> Self {
        self.referer = Some(origin.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, api_key: &str, request: &CompletionRequest) -> Result<ChatResponse> {
        let req = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(&request.system_prompt),
                Message::user(&request.user_message),
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let mut builder = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&req);
        if self.id == ProviderId::OpenRouter {
            if let Some(referer) = &self.referer {
                builder = builder.header("HTTP-Referer", referer);
            }
            builder = builder.header("X-Title", APP_TITLE);
        }

        let res = builder
            .send()
            .await
            .with_context(|| format!("failed to call {}", self.id))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            bail!("{} returned status {}: {}", self.id, status, body);
        }

        res.json()
            .await
            .with_context(|| format!("failed to parse {} response", self.id))
    }
}

#[async_trait]
impl CompletionProvider for OpenAICompatibleClient {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, request: &CompletionRequest) -> ProviderOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            return ProviderOutcome::Unavailable;
        };

        match self.chat(api_key, request).await {
            Ok(response) => ProviderOutcome::from_text(response.text()),
            Err(e) => ProviderOutcome::Failure(format!("{:#}", e)),
        }
    }
}

// ==================== Gemini ====================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    fn text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}

/// Gemini generateContent 客户端
#[derive(Clone)]
pub struct GeminiClient {
    api_key: Option<String>,
    model: String,
    base_url: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new_with_base_url(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            api_key: ProviderCredential::new(ProviderId::Gemini, api_key).secret_key,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn new(api_key: Option<String>, http: reqwest::Client) -> Self {
        Self::new_with_base_url(api_key, GEMINI_MODEL, GEMINI_BASE_URL, http)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<GenerateResponse> {
        // Gemini 没有 system 角色，角色设定拼在用户消息前
        let prompt = format!(
            "{}\n\nUser message: {}",
            request.system_prompt, request.user_message
        );
        let req = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        };

        let res = self
            .http
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("X-goog-api-key", api_key)
            .json(&req)
            .send()
            .await
            .context("failed to call gemini")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            bail!("gemini returned status {}: {}", status, body);
        }

        res.json().await.context("failed to parse gemini response")
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, request: &CompletionRequest) -> ProviderOutcome {
        let Some(api_key) = self.api_key.as_deref() else {
            return ProviderOutcome::Unavailable;
        };

        match self.generate(api_key, request).await {
            Ok(response) => ProviderOutcome::from_text(response.text()),
            Err(e) => ProviderOutcome::Failure(format!("{:#}", e)),
        }
    }
}
