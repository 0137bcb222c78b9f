//! 基础设施层：外部系统交互
//!
//! 提供与外部系统（AI 服务、EmailJS、静态文档、HTTP）的交互能力

pub mod documents;
pub mod email;
pub mod llm;
pub mod web;
