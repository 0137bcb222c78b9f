//! EmailJS 邮件发送客户端

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::core::notifier::Mailer;
use crate::domain::TemplateParams;
use crate::errors::{PortalError, Result};

pub const EMAILJS_BASE_URL: &str = "https://api.emailjs.com";
pub const DEFAULT_SERVICE_ID: &str = "service_wd1mv5m";

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<&'a str>,
    template_params: &'a TemplateParams,
}

/// EmailJS REST 客户端
#[derive(Clone)]
pub struct EmailJsClient {
    base_url: String,
    service_id: String,
    public_key: String,
    private_key: Option<String>,
    http: reqwest::Client,
}

impl EmailJsClient {
    pub fn new(
        service_id: impl Into<String>,
        public_key: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            base_url: EMAILJS_BASE_URL.to_string(),
            service_id: service_id.into(),
            public_key: public_key.into(),
            private_key: None,
            http,
        }
    }

    /// 使用自定义服务地址（测试或自建代理）
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// 开启严格模式时需要的私钥
    pub fn with_private_key(mut self, private_key: Option<String>) -> Self {
        self.private_key = private_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }
}

#[async_trait]
impl Mailer for EmailJsClient {
    async fn send(&self, template_id: &str, params: &TemplateParams) -> Result<()> {
        let req = SendRequest {
            service_id: &self.service_id,
            template_id,
            user_id: &self.public_key,
            access_token: self.private_key.as_deref(),
            template_params: params,
        };

        let res = self
            .http
            .post(format!("{}/api/v1.0/email/send", self.base_url))
            .json(&req)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(PortalError::Delivery(format!(
                "emailjs returned status {}: {}",
                status, body
            )));
        }

        debug!(template = template_id, "email accepted by emailjs");
        Ok(())
    }
}
