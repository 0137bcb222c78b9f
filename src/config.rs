use std::time::Duration;

use clap::Parser;

use crate::application::chat_service::SessionLimits;
use crate::core::notifier::Templates;
use crate::core::provider::{ProviderCredential, ProviderId};
use crate::core::resolver::FallbackDelay;
use crate::infrastructure::email::{DEFAULT_SERVICE_ID, EMAILJS_BASE_URL};
use crate::infrastructure::llm::{
    GEMINI_BASE_URL, GEMINI_MODEL, GROQ_BASE_URL, GROQ_MODEL, OPENROUTER_BASE_URL,
    OPENROUTER_MODEL,
};
use crate::logger::LogFormat;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Student chapter website backend: chat replies and form notifications"
)]
pub struct AppConfig {
    /// 监听地址
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// 站点静态文件目录（可选）
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<String>,

    // 静态文档配置
    /// 通过 HTTP 读取文档的基础 URL，优先于 DATA_DIR
    #[arg(long, env = "DATA_URL")]
    pub data_url: Option<String>,

    /// 本地文档目录
    #[arg(long, env = "DATA_DIR", default_value = "./public/data")]
    pub data_dir: String,

    // AI 服务配置
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub openrouter_api_key: Option<String>,

    #[arg(long, env = "OPENROUTER_BASE_URL", default_value = OPENROUTER_BASE_URL)]
    pub openrouter_base_url: String,

    #[arg(long, env = "OPENROUTER_MODEL", default_value = OPENROUTER_MODEL)]
    pub openrouter_model: String,

    /// 发给 OpenRouter 的 HTTP-Referer
    #[arg(long, env = "SITE_ORIGIN")]
    pub site_origin: Option<String>,

    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    #[arg(long, env = "GROQ_BASE_URL", default_value = GROQ_BASE_URL)]
    pub groq_base_url: String,

    #[arg(long, env = "GROQ_MODEL", default_value = GROQ_MODEL)]
    pub groq_model: String,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_BASE_URL", default_value = GEMINI_BASE_URL)]
    pub gemini_base_url: String,

    #[arg(long, env = "GEMINI_MODEL", default_value = GEMINI_MODEL)]
    pub gemini_model: String,

    /// 兜底回复前的最小延迟（毫秒）
    #[arg(long, env = "FALLBACK_DELAY_MIN_MS", default_value_t = 800)]
    pub fallback_delay_min_ms: u64,

    /// 兜底回复前的最大延迟（毫秒）
    #[arg(long, env = "FALLBACK_DELAY_MAX_MS", default_value_t = 2000)]
    pub fallback_delay_max_ms: u64,

    // 邮件配置
    #[arg(long, env = "EMAILJS_SERVICE_ID", default_value = DEFAULT_SERVICE_ID)]
    pub emailjs_service_id: String,

    #[arg(long, env = "EMAILJS_PUBLIC_KEY", default_value = "")]
    pub emailjs_public_key: String,

    #[arg(long, env = "EMAILJS_PRIVATE_KEY", hide_env_values = true)]
    pub emailjs_private_key: Option<String>,

    #[arg(long, env = "EMAILJS_CONTACT_TEMPLATE", default_value = "template_gisx1yg")]
    pub emailjs_contact_template: String,

    #[arg(long, env = "EMAILJS_JOIN_TEMPLATE", default_value = "template_4gpe6yc")]
    pub emailjs_join_template: String,

    #[arg(long, env = "EMAILJS_BASE_URL", default_value = EMAILJS_BASE_URL)]
    pub emailjs_base_url: String,

    /// 外部 HTTP 调用超时（秒）
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 20)]
    pub http_timeout_secs: u64,

    /// 聊天会话闲置回收时间（秒）
    #[arg(long, env = "CHAT_SESSION_TTL_SECS", default_value_t = 1800)]
    pub chat_session_ttl_secs: u64,

    /// 同时打开的聊天会话上限
    #[arg(long, env = "CHAT_MAX_SESSIONS", default_value_t = 1000)]
    pub chat_max_sessions: usize,

    /// 日志格式: pretty, compact, json
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fallback_delay_min_ms > self.fallback_delay_max_ms {
            anyhow::bail!(
                "FALLBACK_DELAY_MIN_MS ({}) must not exceed FALLBACK_DELAY_MAX_MS ({})",
                self.fallback_delay_min_ms,
                self.fallback_delay_max_ms
            );
        }

        if self.data_url.is_none() && self.data_dir.trim().is_empty() {
            anyhow::bail!("either DATA_URL or DATA_DIR is required");
        }

        let urls = [
            ("DATA_URL", self.data_url.as_deref()),
            ("OPENROUTER_BASE_URL", Some(self.openrouter_base_url.as_str())),
            ("GROQ_BASE_URL", Some(self.groq_base_url.as_str())),
            ("GEMINI_BASE_URL", Some(self.gemini_base_url.as_str())),
            ("EMAILJS_BASE_URL", Some(self.emailjs_base_url.as_str())),
        ];
        for (name, value) in urls {
            if let Some(value) = value {
                url::Url::parse(value).map_err(|e| {
                    anyhow::anyhow!("{} is not a valid url ({}): {}", name, value, e)
                })?;
            }
        }

        if self.http_timeout_secs == 0 {
            anyhow::bail!("HTTP_TIMEOUT_SECS must be greater than zero");
        }

        if self.chat_session_ttl_secs == 0 || self.chat_max_sessions == 0 {
            anyhow::bail!("CHAT_SESSION_TTL_SECS and CHAT_MAX_SESSIONS must be greater than zero");
        }

        Ok(())
    }

    /// 按优先级排列的服务商凭据
    pub fn credentials(&self) -> Vec<ProviderCredential> {
        ProviderId::ORDER
            .iter()
            .map(|id| {
                let key = match id {
                    ProviderId::OpenRouter => self.openrouter_api_key.clone(),
                    ProviderId::Groq => self.groq_api_key.clone(),
                    ProviderId::Gemini => self.gemini_api_key.clone(),
                };
                ProviderCredential::new(*id, key)
            })
            .collect()
    }

    pub fn fallback_delay(&self) -> FallbackDelay {
        FallbackDelay::new(self.fallback_delay_min_ms, self.fallback_delay_max_ms)
    }

    pub fn templates(&self) -> Templates {
        Templates {
            contact: self.emailjs_contact_template.clone(),
            membership: self.emailjs_join_template.clone(),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// 是否能发送邮件
    pub fn email_configured(&self) -> bool {
        !self.emailjs_public_key.trim().is_empty()
    }

    /// 聊天会话回收策略
    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            idle_ttl: Duration::from_secs(self.chat_session_ttl_secs),
            max_sessions: self.chat_max_sessions,
        }
    }

    /// 测试用解析：没有显式给出的密钥一律置空，不读外部环境变量
    #[cfg(test)]
    pub(crate) fn parse_for_test(args: &[&str]) -> Self {
        const SECRET_FLAGS: [&str; 4] = [
            "--openrouter-api-key",
            "--groq-api-key",
            "--gemini-api-key",
            "--emailjs-private-key",
        ];
        let mut argv = vec!["test".to_string()];
        argv.extend(args.iter().map(|a| a.to_string()));
        for flag in SECRET_FLAGS {
            if !args.iter().any(|a| a.starts_with(flag)) {
                argv.push(format!("{}=", flag));
            }
        }
        Self::parse_from(argv)
    }
}
