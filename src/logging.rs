//! # 日志配置模块
//!
//! 初始化 `tracing` 订阅器，并提供带请求ID、阶段和组件字段的结构化日志宏

use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 请求处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    /// 启动
    Startup,
    /// 访问校验
    Authentication,
    /// 密钥选择
    Scheduling,
    /// 构建上游请求
    RequestModify,
    /// 调用上游
    UpstreamRequest,
    /// 转发响应
    Response,
    /// 错误处理
    Error,
    /// 关闭
    Shutdown,
}

impl LogStage {
    /// 日志字段取值
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Authentication => "authentication",
            Self::Scheduling => "scheduling",
            Self::RequestModify => "request_modify",
            Self::UpstreamRequest => "upstream_request",
            Self::Response => "response",
            Self::Error => "error",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    /// 主程序
    Main,
    /// 配置加载
    Config,
    /// HTTP服务器
    ServerSetup,
    /// 访问控制
    Auth,
    /// 密钥池
    KeyPool,
    /// 上游请求构建
    Translator,
    /// 上游客户端
    Upstream,
    /// 转发引擎
    Engine,
}

impl LogComponent {
    /// 日志字段取值
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Config => "config",
            Self::ServerSetup => "server_setup",
            Self::Auth => "auth",
            Self::KeyPool => "key_pool",
            Self::Translator => "translator",
            Self::Upstream => "upstream",
            Self::Engine => "engine",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 结构化 INFO 日志
///
/// `linfo!(request_id, stage, component, operation, message, field = value...)`
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $message
        )
    };
}

/// 结构化 DEBUG 日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $message
        )
    };
}

/// 结构化 WARN 日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $message
        )
    };
}

/// 结构化 ERROR 日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $message
        )
    };
}

/// 默认过滤规则：全局级别 + 本 crate 的调试日志
fn default_filter(level: &str) -> String {
    format!("{level},translator_key_proxy=debug,hyper=warn,reqwest=warn")
}

/// 初始化日志系统
///
/// `RUST_LOG` 存在时优先生效，否则使用 `log_level`（默认 info）
pub fn init_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    // 测试中可能被重复调用，忽略重复初始化
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

/// 脱敏密钥或令牌，用于日志输出，格式: "abcd***wxyz"
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return "<empty>".to_string();
    }
    if chars.len() > 10 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}***{tail}")
    } else {
        "***".to_string()
    }
}
