//! # 错误类型定义

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum ProxyError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 访问令牌缺失或不匹配
    #[error("Unauthorized")]
    Unauthorized,

    /// 入站请求无法解析
    #[error("请求格式错误: {message}")]
    BadRequest {
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 上游传输失败（网络错误、超时、响应无法解析）
    #[error("{message}")]
    BadGateway {
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: std::io::Error,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: anyhow::Error,
    },

    /// 服务器启动错误
    #[error("服务器启动错误: {message}")]
    ServerStart {
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 附带上下文信息的错误
    #[error("{context}: {source}")]
    Context {
        /// 上下文信息
        context: String,
        /// 底层错误
        #[source]
        source: Box<ProxyError>,
    },
}

impl ProxyError {
    /// 获取HTTP状态码与对外错误标签
    #[must_use]
    pub fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            Self::BadRequest { .. } => (StatusCode::BAD_REQUEST, "Bad Request"),
            Self::BadGateway { .. } => (StatusCode::BAD_GATEWAY, "Bad Gateway"),
            Self::Config { .. }
            | Self::Io { .. }
            | Self::Serialization { .. }
            | Self::ServerStart { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            Self::Context { source, .. } => source.to_http_response_parts(),
        }
    }

    /// HTTP状态码
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        self.to_http_response_parts().0
    }

    /// 去掉上下文包装后的原始错误
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// 响应体中的 `detail` 字段（未授权时不返回）
    fn detail(&self) -> Option<String> {
        match self.root() {
            Self::Unauthorized => None,
            Self::BadGateway { message, .. } | Self::BadRequest { message, .. } => {
                Some(message.clone())
            }
            other => Some(other.to_string()),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建请求格式错误
    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        Self::BadRequest {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的请求格式错误
    pub fn bad_request_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::BadRequest {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建网关错误
    pub fn bad_gateway<T: Into<String>>(message: T) -> Self {
        Self::BadGateway {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的网关错误
    pub fn bad_gateway_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::BadGateway {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建服务器启动错误
    pub fn server_start_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::ServerStart {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, label) = self.to_http_response_parts();
        let body = match self.detail() {
            Some(detail) => json!({ "error": label, "detail": detail }),
            None => json!({ "error": label }),
        };
        (status, Json(body)).into_response()
    }
}

// 自动转换常见错误类型
impl From<std::io::Error> for ProxyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for ProxyError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<serde_json::Error> for ProxyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}

impl From<url::ParseError> for ProxyError {
    fn from(err: url::ParseError) -> Self {
        Self::config_with_source("URL解析失败", err)
    }
}

// 上游请求失败统一视为网关错误
impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("upstream request timed out: {}", error_chain(&err))
        } else {
            error_chain(&err)
        };
        Self::bad_gateway_with_source(message, err)
    }
}

/// 拼接错误及其全部来源，形如 "outer: inner: root"
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        current = cause.source();
    }
    text
}
