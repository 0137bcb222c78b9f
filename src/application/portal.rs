//! 站点后端装配
//!
//! 根据配置构建服务商、文档来源、邮件客户端，并启动 Web 服务

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::application::chat_service::ChatService;
use crate::config::AppConfig;
use crate::core::notifier::Notifier;
use crate::core::provider::{CompletionProvider, ProviderId};
use crate::core::resolver::ResponseResolver;
use crate::infrastructure::documents::DocumentSource;
use crate::infrastructure::email::EmailJsClient;
use crate::infrastructure::llm::{GeminiClient, OpenAICompatibleClient};
use crate::infrastructure::web::{self, AppState};
use crate::logger::Sanitizer;

/// 装配完成的站点后端
pub struct Portal {
    state: Arc<AppState>,
    bind_addr: String,
    static_dir: Option<String>,
}

impl Portal {
    /// 从配置构建
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .context("failed to build http client")?;

        let resolver =
            ResponseResolver::new(build_providers(config, &http), config.fallback_delay());
        let configured = resolver.configured_providers();
        if configured.is_empty() {
            warn!("no AI provider configured, chat will use fallback replies only");
        } else {
            info!(providers = ?configured, "AI providers configured");
        }

        let documents = match &config.data_url {
            Some(url) => DocumentSource::http(url, http.clone())?,
            None => DocumentSource::local(&config.data_dir),
        };

        if !config.email_configured() {
            warn!("EMAILJS_PUBLIC_KEY is empty, form notifications will be rejected by EmailJS");
        }
        let mailer = EmailJsClient::new(
            config.emailjs_service_id.clone(),
            config.emailjs_public_key.clone(),
            http,
        )
        .with_base_url(config.emailjs_base_url.clone())
        .with_private_key(config.emailjs_private_key.clone());

        let documents = Arc::new(documents);
        let notifier = Notifier::new(documents.clone(), Arc::new(mailer), config.templates());

        let state = Arc::new(AppState {
            chat: Arc::new(ChatService::with_limits(
                Arc::new(resolver),
                config.session_limits(),
            )),
            notifier,
            documents,
        });

        Ok(Self {
            state,
            bind_addr: config.bind_addr.clone(),
            static_dir: config.static_dir.clone(),
        })
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// 启动 Web 服务，直到进程退出
    pub async fn serve(self) -> Result<()> {
        let _sweeper = self.state.chat.spawn_sweeper();
        web::start_web_server(&self.bind_addr, self.state, self.static_dir.as_deref()).await
    }
}

/// 按固定顺序构建服务商客户端
fn build_providers(
    config: &AppConfig,
    http: &reqwest::Client,
) -> Vec<Box<dyn CompletionProvider>> {
    config
        .credentials()
        .into_iter()
        .map(|credential| -> Box<dyn CompletionProvider> {
            if let Some(key) = &credential.secret_key {
                info!(
                    provider = %credential.provider,
                    key = %Sanitizer::api_key(key),
                    "provider credential loaded"
                );
            }
            match credential.provider {
                ProviderId::OpenRouter => {
                    let client = OpenAICompatibleClient::new_with_base_url(
                        credential,
                        config.openrouter_model.clone(),
                        config.openrouter_base_url.clone(),
                        http.clone(),
                    );
                    match &config.site_origin {
                        Some(origin) => Box::new(client.with_referer(origin.clone())),
                        None => Box::new(client),
                    }
                }
                ProviderId::Groq => Box::new(OpenAICompatibleClient::new_with_base_url(
                    credential,
                    config.groq_model.clone(),
                    config.groq_base_url.clone(),
                    http.clone(),
                )),
                ProviderId::Gemini => Box::new(GeminiClient::new_with_base_url(
                    credential.secret_key,
                    config.gemini_model.clone(),
                    config.gemini_base_url.clone(),
                    http.clone(),
                )),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_providers_order() {
        let config = AppConfig::parse_for_test(&["--groq-api-key", "gsk_test"]);
        let providers = build_providers(&config, &reqwest::Client::new());

        let ids: Vec<ProviderId> = providers.iter().map(|p| p.id()).collect();
        assert_eq!(ids, ProviderId::ORDER.to_vec());
        let configured: Vec<bool> = providers.iter().map(|p| p.is_configured()).collect();
        assert_eq!(configured, vec![false, true, false]);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = AppConfig::parse_for_test(&["--http-timeout-secs", "0"]);
        assert!(Portal::from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_local_documents() {
        let config = AppConfig::parse_for_test(&["--data-dir", "/tmp/site-data"]);
        let portal = Portal::from_config(&config).unwrap();
        assert!(matches!(
            portal.state().documents.as_ref(),
            DocumentSource::Local { .. }
        ));
        assert_eq!(portal.state().chat.session_count(), 0);
    }
}
