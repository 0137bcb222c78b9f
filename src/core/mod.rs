//! 核心层
//!
//! 回复解析与通知分发，外部服务通过 trait 注入

pub mod fallback;
pub mod notifier;
pub mod provider;
pub mod resolver;
