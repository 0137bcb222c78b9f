//! 领域模型
//!
//! 聊天、表单、收件人与站点内容的纯数据定义

pub mod chat;
pub mod content;
pub mod form;
pub mod recipient;

pub use chat::{ChatMessage, ChatSession, SessionId, GREETING};
pub use content::{EventItem, SocialMedia};
pub use form::{
    ContactForm, FormKind, FormStatus, FormSubmission, MembershipApplication, NotificationForm,
    TemplateParams,
};
pub use recipient::RecipientRecord;
