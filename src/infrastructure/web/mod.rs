//! Web 服务器模块
//!
//! 提供聊天、表单提交和静态内容的 HTTP API

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::application::chat_service::ChatService;
use crate::core::notifier::{Notifier, Outcome};
use crate::domain::{
    ContactForm, EventItem, FormSubmission, MembershipApplication, NotificationForm,
    RecipientRecord, SocialMedia,
};
use crate::errors::PortalError;
use crate::infrastructure::documents::{
    DocumentSource, EVENTS_DOCUMENT, MEDIA_DOCUMENT, OFFICERS_DOCUMENT,
};

// ==================== 错误响应 ====================

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        // 上游错误细节只写日志，不返回给访客
        let (status, message) = match &self {
            PortalError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            PortalError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            PortalError::Document(_) | PortalError::Network(_) => {
                (StatusCode::BAD_GATEWAY, "Content is temporarily unavailable".to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

// ==================== 状态 ====================

pub struct AppState {
    pub chat: Arc<ChatService>,
    pub notifier: Notifier,
    pub documents: Arc<DocumentSource>,
}

// ==================== 请求/响应类型 ====================

#[derive(Deserialize)]
pub struct AskRequest {
    pub message: String,
}

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Serialize)]
struct FormResponse<F> {
    status: Outcome,
    attempted: usize,
    delivered: usize,
    failed: usize,
    fields: F,
}

// ==================== 处理器 ====================

/// 健康检查
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "providers": state.chat.resolver().configured_providers(),
    }))
}

/// 单次问答
async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Response, PortalError> {
    let resolution = state.chat.ask(&req.message).await?;
    Ok(Json(serde_json::json!({
        "reply": resolution.text,
        "source": resolution.source,
    }))
    .into_response())
}

/// 打开聊天会话
async fn open_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = state.chat.open_session();
    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": session.id,
            "messages": session.messages(),
        })),
    )
}

/// 获取会话历史
async fn get_session_messages(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Response, PortalError> {
    let messages = state.chat.history(&session_id)?;
    Ok(Json(messages).into_response())
}

/// 在会话中发送消息
async fn send_session_message(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Response, PortalError> {
    let exchange = state.chat.send(&session_id, &req.text).await?;
    Ok(Json(exchange).into_response())
}

/// 关闭会话
async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, PortalError> {
    state.chat.close_session(&session_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// 提交表单并分发给干部
async fn submit_form<F>(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<F>,
) -> Result<Response, PortalError>
where
    F: NotificationForm + Serialize + DeserializeOwned + 'static,
{
    fields.validate()?;

    let mut submission = FormSubmission::new(fields);
    let report = state.notifier.notify(&mut submission).await;

    let status = match report.outcome {
        Outcome::Sent => StatusCode::OK,
        Outcome::Partial => StatusCode::MULTI_STATUS,
        Outcome::Error => StatusCode::BAD_GATEWAY,
    };
    info!(form = %F::KIND, outcome = ?report.outcome, "form submission handled");

    Ok((
        status,
        Json(FormResponse {
            status: report.outcome,
            attempted: report.attempted,
            delivered: report.delivered,
            failed: report.failed,
            fields: submission.fields,
        }),
    )
        .into_response())
}

fn document_unavailable(document: &'static str) -> impl FnOnce(PortalError) -> PortalError {
    move |e| {
        warn!(document, error = %e, "document unavailable");
        e
    }
}

/// 活动列表
async fn list_events(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<EventItem>>, PortalError> {
    let events = state
        .documents
        .events()
        .await
        .map_err(document_unavailable(EVENTS_DOCUMENT))?;
    Ok(Json(events))
}

/// 社交媒体列表
async fn list_media(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SocialMedia>>, PortalError> {
    let media = state
        .documents
        .media()
        .await
        .map_err(document_unavailable(MEDIA_DOCUMENT))?;
    Ok(Json(media))
}

/// 干部名单
async fn list_officers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RecipientRecord>>, PortalError> {
    let officers = state
        .documents
        .officers()
        .await
        .map_err(document_unavailable(OFFICERS_DOCUMENT))?;
    Ok(Json(officers))
}

// ==================== 路由 ====================

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/chat", post(ask))
        .route("/api/chat/sessions", post(open_session))
        .route(
            "/api/chat/sessions/{id}/messages",
            get(get_session_messages).post(send_session_message),
        )
        .route("/api/chat/sessions/{id}", axum::routing::delete(close_session))
        .route("/api/forms/contact", post(submit_form::<ContactForm>))
        .route("/api/forms/join", post(submit_form::<MembershipApplication>))
        .route("/api/events", get(list_events))
        .route("/api/media", get(list_media))
        .route("/api/officers", get(list_officers))
        .layer(cors)
        .with_state(state)
}

// ==================== 服务器启动 ====================

pub async fn start_web_server(
    bind_addr: &str,
    state: Arc<AppState>,
    static_dir: Option<&str>,
) -> anyhow::Result<()> {
    let mut app = create_router(state);
    if let Some(dir) = static_dir {
        info!("Serving static site from {}", dir);
        app = app.fallback_service(ServeDir::new(dir));
    }

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Web server started on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
