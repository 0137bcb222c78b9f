//! 测试通用工具
//!
//! 用本地 axum 服务模拟 AI 服务、EmailJS 和静态文档站点

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

static INIT: Once = Once::new();

/// 初始化测试日志
pub fn setup() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("chapter_portal=debug")
            .with_test_writer()
            .try_init();
    });
}

/// 在随机端口启动路由，返回地址
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

/// 测试超时包装器
pub async fn with_timeout<F, T>(duration: std::time::Duration, f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(duration, f)
        .await
        .expect("Test timed out")
}

pub const TEST_TIMEOUT_SHORT: std::time::Duration = std::time::Duration::from_secs(5);

/// 被模拟服务收到的请求
#[derive(Debug, Clone)]
pub struct Recorded {
    pub headers: HeaderMap,
    pub body: Value,
}

/// 模拟上游：固定状态码与响应体，记录所有请求
#[derive(Clone)]
pub struct MockUpstream {
    status: StatusCode,
    body: Value,
    pub hits: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockUpstream {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            body,
            hits: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn record(
    State(mock): State<MockUpstream>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    mock.hits.fetch_add(1, Ordering::SeqCst);
    let body = serde_json::from_str(&body).unwrap_or(Value::Null);
    mock.requests.lock().unwrap().push(Recorded { headers, body });
    (mock.status, Json(mock.body.clone()))
}

/// OpenAI 兼容接口：`POST {base}/chat/completions`，base 为 `http://addr/v1`
pub async fn spawn_openai_mock(mock: MockUpstream) -> String {
    let app = Router::new()
        .route("/v1/chat/completions", post(record))
        .with_state(mock);
    format!("http://{}/v1", spawn_server(app).await)
}

/// Gemini 接口：`POST {base}/models/{model}:generateContent`
pub async fn spawn_gemini_mock(mock: MockUpstream, model: &str) -> String {
    let app = Router::new()
        .route(&format!("/v1beta/models/{}", gemini_path(model)), post(record))
        .with_state(mock);
    format!("http://{}/v1beta", spawn_server(app).await)
}

fn gemini_path(model: &str) -> String {
    format!("{}:generateContent", model)
}

/// EmailJS 接口：`POST {base}/api/v1.0/email/send`
pub async fn spawn_emailjs_mock(mock: MockUpstream) -> String {
    let app = Router::new()
        .route("/api/v1.0/email/send", post(record))
        .with_state(mock);
    format!("http://{}", spawn_server(app).await)
}

/// 静态文档站点：`GET {base}/data/officers.json`
pub async fn spawn_documents_mock(officers_status: u16, officers: Value) -> (String, MockUpstream) {
    let mock = MockUpstream::new(officers_status, officers);
    let app = Router::new()
        .route("/data/officers.json", get(record))
        .with_state(mock.clone());
    (format!("http://{}/data", spawn_server(app).await), mock)
}

pub fn chat_completion(text: &str) -> Value {
    serde_json::json!({
        "id": "cmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": text}, "finish_reason": "stop"}]
    })
}

pub fn gemini_completion(text: &str) -> Value {
    serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    })
}
