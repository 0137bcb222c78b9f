//! 表单领域实体
//!
//! 联系表单与入会申请表单，提交后由通知分发逐个发送给干部

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{PortalError, Result};

/// 邮件模板变量
pub type TemplateParams = Map<String, Value>;

/// 表单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStatus {
    Idle,
    Sending,
    Sent,
    Partial,
    Error,
}

/// 表单类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Contact,
    Membership,
}

impl std::fmt::Display for FormKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormKind::Contact => write!(f, "contact"),
            FormKind::Membership => write!(f, "membership"),
        }
    }
}

/// 可分发为邮件通知的表单
pub trait NotificationForm: Clone + Send + Sync {
    /// 表单类型（决定邮件模板）
    const KIND: FormKind;

    /// 是否只发送给有邮箱地址的收件人
    const REQUIRES_ADDRESS: bool;

    /// 校验必填字段
    fn validate(&self) -> Result<()>;

    /// 生成发送给指定收件人的模板变量
    fn template_params(&self, recipient_email: &str) -> TemplateParams;

    /// 清空所有字段
    fn clear(&mut self);
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PortalError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern")
    })
}

/// 联系我们表单
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactForm {
    pub full_name: String,
    pub objectif: String,
    pub comment: String,
}

impl NotificationForm for ContactForm {
    const KIND: FormKind = FormKind::Contact;
    const REQUIRES_ADDRESS: bool = false;

    fn validate(&self) -> Result<()> {
        require("fullName", &self.full_name)?;
        require("objectif", &self.objectif)?;
        require("comment", &self.comment)
    }

    fn template_params(&self, recipient_email: &str) -> TemplateParams {
        let mut params = Map::new();
        params.insert("email".into(), recipient_email.into());
        params.insert(
            "title".into(),
            format!("{}: {}", self.full_name, self.objectif).into(),
        );
        params.insert("message".into(), self.comment.clone().into());
        params
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// 入会申请表单
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipApplication {
    pub full_name: String,
    pub phone_number: String,
    pub ieee_mail: String,
    pub ieee_account_number: String,
}

impl NotificationForm for MembershipApplication {
    const KIND: FormKind = FormKind::Membership;
    const REQUIRES_ADDRESS: bool = true;

    fn validate(&self) -> Result<()> {
        require("fullName", &self.full_name)?;
        require("phoneNumber", &self.phone_number)?;
        require("ieeeMail", &self.ieee_mail)?;
        require("ieeeAccountNumber", &self.ieee_account_number)?;
        if !email_pattern().is_match(self.ieee_mail.trim()) {
            return Err(PortalError::Validation(
                "ieeeMail is not a valid email address".to_string(),
            ));
        }
        Ok(())
    }

    fn template_params(&self, recipient_email: &str) -> TemplateParams {
        let mut params = Map::new();
        params.insert("name".into(), self.full_name.clone().into());
        params.insert("phone".into(), self.phone_number.clone().into());
        params.insert("ieeeemail".into(), self.ieee_mail.clone().into());
        params.insert(
            "ieeeAccountNumber".into(),
            self.ieee_account_number.clone().into(),
        );
        params.insert("email".into(), recipient_email.into());
        params
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// 一次表单提交及其状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSubmission<F> {
    pub fields: F,
    pub status: FormStatus,
}

impl<F: NotificationForm> FormSubmission<F> {
    pub fn new(fields: F) -> Self {
        Self {
            fields,
            status: FormStatus::Idle,
        }
    }

    /// 进入发送中状态
    pub fn begin_sending(&mut self) {
        self.status = FormStatus::Sending;
    }

    /// 记录终态；只有全部送达才清空字段，便于用户重试
    pub fn finish(&mut self, status: FormStatus) {
        self.status = status;
        if status == FormStatus::Sent {
            self.fields.clear();
        }
    }

    /// 用户手动重置
    pub fn reset(&mut self) {
        self.fields.clear();
        self.status = FormStatus::Idle;
    }
}
