//! 应用层：业务编排

pub mod chat_service;
pub mod portal;
