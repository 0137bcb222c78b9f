//! 日志模块 - 结构化日志、耗时记录与敏感信息脱敏
//!
//! 特性：
//! - 支持人类可读、紧凑和 JSON 三种格式
//! - 操作耗时在 `metrics` target 下输出
//! - API 密钥与邮箱地址脱敏

use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日志格式类型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// 人类可读格式（带颜色）
    Pretty,
    /// 紧凑单行格式
    Compact,
    /// JSON 结构化格式（适合日志收集系统）
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Compact => write!(f, "compact"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志格式
    pub format: LogFormat,
    /// 是否启用颜色（JSON 格式忽略）
    pub enable_color: bool,
    /// 是否显示目标模块
    pub show_target: bool,
    /// 是否显示文件名和行号
    pub show_file: bool,
    /// `RUST_LOG` 未设置时的默认过滤级别
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            enable_color: true,
            show_target: true,
            show_file: false,
            default_filter: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// 指定格式的默认配置
    pub fn with_format(format: LogFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }
}

/// 初始化日志系统
///
/// # 环境变量
/// - `RUST_LOG`: 日志级别过滤（如 `info`, `debug`, `warn,chapter_portal=trace`）
///
/// 重复调用时静默忽略（测试中可能多次初始化）。
pub fn init(config: LogConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let result = match config.format {
        LogFormat::Pretty => subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(config.enable_color)
                    .with_target(config.show_target)
                    .with_file(config.show_file)
                    .with_line_number(config.show_file),
            )
            .try_init(),
        LogFormat::Compact => subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_ansi(config.enable_color)
                    .with_target(config.show_target)
                    .with_file(config.show_file)
                    .with_line_number(config.show_file),
            )
            .try_init(),
        LogFormat::Json => subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(config.show_target)
                    .with_file(config.show_file)
                    .with_line_number(config.show_file)
                    .with_current_span(true),
            )
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!("logger already initialized: {}", e);
    }
}

/// 性能计时器 - 离开作用域时记录执行时间
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// 创建新的计时器
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            target: "metrics",
            operation = %self.name,
            elapsed_ms = %format!("{:.2}", elapsed_ms),
            "operation completed"
        );
    }
}

/// 敏感信息脱敏工具
pub struct Sanitizer;

impl Sanitizer {
    /// 脱敏 API 密钥 - 只保留前 8 位和后 4 位
    pub fn api_key(key: &str) -> String {
        let chars: Vec<char> = key.chars().collect();
        if chars.len() <= 16 {
            return "***".to_string();
        }
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }

    /// 脱敏邮箱 - 本地部分只保留首字符
    pub fn email(address: &str) -> String {
        match address.split_once('@') {
            Some((local, domain)) if !local.is_empty() => {
                let first: String = local.chars().take(1).collect();
                format!("{}***@{}", first, domain)
            }
            _ if address.is_empty() => "<empty>".to_string(),
            _ => "***".to_string(),
        }
    }
}
