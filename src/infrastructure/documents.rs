//! 静态 JSON 文档读取
//!
//! 干部名单、活动、社交媒体都以静态 JSON 发布，可以来自 HTTP 站点或本地目录。
//! 每次调用都重新读取，不做缓存。

use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::core::notifier::RecipientSource;
use crate::domain::{EventItem, RecipientRecord, SocialMedia};
use crate::errors::{PortalError, Result};

pub const OFFICERS_DOCUMENT: &str = "officers.json";
pub const EVENTS_DOCUMENT: &str = "events.json";
pub const MEDIA_DOCUMENT: &str = "media.json";

/// 文档来源
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// 通过 HTTP GET 读取，`base` 以 `/` 结尾
    Http { base: Url, http: reqwest::Client },
    /// 从本地目录读取
    Local { root: PathBuf },
}

impl DocumentSource {
    /// HTTP 来源，自动补全末尾的 `/` 以便 join
    pub fn http(base: &str, http: reqwest::Client) -> Result<Self> {
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };
        let base = Url::parse(&normalized)
            .map_err(|e| PortalError::Config(format!("invalid data url {}: {}", base, e)))?;
        Ok(DocumentSource::Http { base, http })
    }

    pub fn local(root: impl Into<PathBuf>) -> Self {
        DocumentSource::Local { root: root.into() }
    }

    /// 读取并解析一个文档
    pub async fn fetch<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let bytes = match self {
            DocumentSource::Http { base, http } => {
                let url = base
                    .join(name)
                    .map_err(|e| PortalError::Document(format!("{}: {}", name, e)))?;
                debug!(%url, "fetching document");
                let res = http.get(url).send().await?;
                let status = res.status();
                if !status.is_success() {
                    return Err(PortalError::Document(format!(
                        "failed to load {}: {}",
                        name, status
                    )));
                }
                res.bytes().await?.to_vec()
            }
            DocumentSource::Local { root } => {
                let path = root.join(name);
                debug!(path = %path.display(), "reading document");
                tokio::fs::read(&path).await.map_err(|e| {
                    PortalError::Document(format!("failed to read {}: {}", path.display(), e))
                })?
            }
        };

        serde_json::from_slice(&bytes)
            .map_err(|e| PortalError::Document(format!("malformed {}: {}", name, e)))
    }

    pub async fn officers(&self) -> Result<Vec<RecipientRecord>> {
        self.fetch(OFFICERS_DOCUMENT).await
    }

    pub async fn events(&self) -> Result<Vec<EventItem>> {
        self.fetch(EVENTS_DOCUMENT).await
    }

    pub async fn media(&self) -> Result<Vec<SocialMedia>> {
        self.fetch(MEDIA_DOCUMENT).await
    }
}

#[async_trait]
impl RecipientSource for DocumentSource {
    async fn load_recipients(&self) -> Result<Vec<RecipientRecord>> {
        self.officers().await
    }
}
