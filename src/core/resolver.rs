//! 回复解析器
//!
//! 按固定顺序逐个尝试服务商，第一个成功的结果直接返回；
//! 全部不可用或失败时延迟片刻后给出本地兜底回复。调用方永远拿到文本。

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::fallback::FallbackResponder;
use crate::core::provider::{CompletionProvider, CompletionRequest, ProviderId, ProviderOutcome};
use crate::logger::Timer;

/// 回复来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "provider", rename_all = "lowercase")]
pub enum ReplySource {
    Provider(ProviderId),
    Fallback,
}

/// 解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub text: String,
    pub source: ReplySource,
}

/// 兜底回复前的模拟延迟窗口（毫秒）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackDelay {
    window: RangeInclusive<u64>,
}

impl FallbackDelay {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        let (lo, hi) = if min_ms <= max_ms {
            (min_ms, max_ms)
        } else {
            (max_ms, min_ms)
        };
        Self { window: lo..=hi }
    }

    /// 不延迟
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn min(&self) -> Duration {
        Duration::from_millis(*self.window.start())
    }

    pub fn max(&self) -> Duration {
        Duration::from_millis(*self.window.end())
    }

    fn sample(&self) -> Duration {
        if self.window.start() == self.window.end() {
            return self.min();
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.window.clone()))
    }
}

impl Default for FallbackDelay {
    fn default() -> Self {
        Self::new(800, 2000)
    }
}

/// 回复解析器
pub struct ResponseResolver {
    providers: Vec<Box<dyn CompletionProvider>>,
    fallback: FallbackResponder,
    delay: FallbackDelay,
}

impl ResponseResolver {
    /// 服务商按 [`ProviderId::ORDER`] 排序后保存
    pub fn new(mut providers: Vec<Box<dyn CompletionProvider>>, delay: FallbackDelay) -> Self {
        providers.sort_by_key(|p| p.id());
        Self {
            providers,
            fallback: FallbackResponder::new(),
            delay,
        }
    }

    /// 只有兜底回复的解析器
    pub fn fallback_only(delay: FallbackDelay) -> Self {
        Self::new(Vec::new(), delay)
    }

    /// 已配置凭据的服务商
    pub fn configured_providers(&self) -> Vec<ProviderId> {
        self.providers
            .iter()
            .filter(|p| p.is_configured())
            .map(|p| p.id())
            .collect()
    }

    /// 解析用户消息，只返回文本
    pub async fn resolve(&self, user_message: &str) -> String {
        self.resolve_detailed(user_message).await.text
    }

    /// 解析用户消息并返回来源
    pub async fn resolve_detailed(&self, user_message: &str) -> Resolution {
        let _timer = Timer::new("resolve_reply");
        let request = CompletionRequest::new(user_message);

        for provider in &self.providers {
            let id = provider.id();
            if !provider.is_configured() {
                debug!(provider = %id, "provider has no credential, skipping");
                continue;
            }

            match provider.complete(&request).await {
                ProviderOutcome::Success(text) => {
                    info!(provider = %id, "provider replied");
                    return Resolution {
                        text: text.trim().to_string(),
                        source: ReplySource::Provider(id),
                    };
                }
                ProviderOutcome::Unavailable => {
                    debug!(provider = %id, "provider unavailable");
                }
                ProviderOutcome::Failure(reason) => {
                    warn!(provider = %id, %reason, "provider failed, trying next");
                }
            }
        }

        let delay = self.delay.sample();
        info!(delay_ms = delay.as_millis() as u64, "all providers exhausted, using fallback reply");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Resolution {
            text: self.fallback.respond(user_message),
            source: ReplySource::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fallback::GENERIC_REPLIES;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FakeProvider {
        id: ProviderId,
        configured: bool,
        outcome: ProviderOutcome,
        calls: Arc<AtomicUsize>,
    }

    impl FakeProvider {
        fn boxed(
            id: ProviderId,
            configured: bool,
            outcome: ProviderOutcome,
        ) -> (Box<dyn CompletionProvider>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let provider = FakeProvider {
                id,
                configured,
                outcome,
                calls: calls.clone(),
            };
            (Box::new(provider), calls)
        }
    }

    #[async_trait]
    impl CompletionProvider for FakeProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn complete(&self, _request: &CompletionRequest) -> ProviderOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let (a, a_calls) = FakeProvider::boxed(
            ProviderId::OpenRouter,
            true,
            ProviderOutcome::Success("  Capital idea!  ".to_string()),
        );
        let (b, b_calls) = FakeProvider::boxed(
            ProviderId::Groq,
            true,
            ProviderOutcome::Success("from groq".to_string()),
        );

        let resolver = ResponseResolver::new(vec![b, a], FallbackDelay::none());
        let resolution = resolver.resolve_detailed("hello").await;

        assert_eq!(resolution.text, "Capital idea!");
        assert_eq!(resolution.source, ReplySource::Provider(ProviderId::OpenRouter));
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_falls_through_in_order() {
        let (a, a_calls) = FakeProvider::boxed(
            ProviderId::OpenRouter,
            true,
            ProviderOutcome::Failure("malformed".to_string()),
        );
        let (b, b_calls) =
            FakeProvider::boxed(ProviderId::Groq, false, ProviderOutcome::Unavailable);
        let (c, c_calls) = FakeProvider::boxed(
            ProviderId::Gemini,
            true,
            ProviderOutcome::Success("from gemini".to_string()),
        );

        let resolver = ResponseResolver::new(vec![a, b, c], FallbackDelay::none());
        let resolution = resolver.resolve_detailed("anything").await;

        assert_eq!(resolution.text, "from gemini");
        assert_eq!(resolution.source, ReplySource::Provider(ProviderId::Gemini));
        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
        assert_eq!(c_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            resolver.configured_providers(),
            vec![ProviderId::OpenRouter, ProviderId::Gemini]
        );
    }

    #[tokio::test]
    async fn test_all_failed_uses_keyword_fallback() {
        let (a, _) = FakeProvider::boxed(
            ProviderId::OpenRouter,
            true,
            ProviderOutcome::Failure("503".to_string()),
        );
        let resolver = ResponseResolver::new(vec![a], FallbackDelay::none());

        let resolution = resolver.resolve_detailed("HELLO monocle man").await;
        assert_eq!(resolution.source, ReplySource::Fallback);
        assert!(resolution.text.starts_with("Well hello there"));
    }

    #[tokio::test]
    async fn test_no_credentials_returns_pool_reply() {
        let resolver = ResponseResolver::fallback_only(FallbackDelay::none());
        let reply = resolver.resolve("qwerty").await;
        assert!(GENERIC_REPLIES.contains(&reply.as_str()));
        assert!(resolver.configured_providers().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_waits_within_delay_window() {
        let resolver = ResponseResolver::fallback_only(FallbackDelay::new(800, 2000));
        let start = tokio::time::Instant::now();
        let reply = resolver.resolve("money").await;
        let elapsed = start.elapsed();

        assert!(!reply.is_empty());
        assert!(elapsed >= Duration::from_millis(800));
        assert!(elapsed <= Duration::from_millis(2100));
    }

    #[test]
    fn test_delay_window_normalized() {
        let delay = FallbackDelay::new(500, 100);
        assert_eq!(delay.min(), Duration::from_millis(100));
        assert_eq!(delay.max(), Duration::from_millis(500));
        assert_eq!(FallbackDelay::none().sample(), Duration::ZERO);
    }

    #[test]
    fn test_reply_source_serialization() {
        let provider = serde_json::to_value(ReplySource::Provider(ProviderId::Groq)).unwrap();
        assert_eq!(provider["kind"], "provider");
        assert_eq!(provider["provider"], "groq");

        let fallback = serde_json::to_value(ReplySource::Fallback).unwrap();
        assert_eq!(fallback["kind"], "fallback");
    }
}
