//! # 代理访问控制
//!
//! 校验客户端携带的共享令牌，与轮换使用的上游订阅密钥无关。
//!
//! 令牌按以下优先级提取，取第一个非空值：
//! 1. `x-proxy-token` 请求头
//! 2. `Ocp-Apim-Subscription-Key` 请求头：部分客户端只能设置这个上游头名称，
//!    因此允许用它携带代理令牌
//! 3. `Authorization: Bearer <token>`（前缀不区分大小写，去除首尾空白）
//! 4. 查询参数 `token`、`access_key`、`accessKey`

use crate::proxy::headers::{PROXY_TOKEN_HEADER, SUBSCRIPTION_KEY_HEADER};
use crate::proxy::query::QueryParams;
use axum::http::{HeaderMap, header::AUTHORIZATION};

/// 可携带令牌的查询参数，按优先级排列
pub const TOKEN_QUERY_PARAMS: [&str; 3] = ["token", "access_key", "accessKey"];

/// 访问校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    /// 放行
    Allowed,
    /// 拒绝（401）
    Denied,
}

impl AuthDecision {
    /// 是否放行
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// 共享令牌校验器
#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    secret: Option<String>,
}

impl AuthGate {
    /// 创建校验器，空字符串令牌等同于未配置
    pub fn new<S: Into<String>>(secret: Option<S>) -> Self {
        let secret = secret.map(Into::into).filter(|secret| !secret.is_empty());
        Self { secret }
    }

    /// 不做任何校验的校验器
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// 是否启用了令牌校验
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// 校验入站请求
    #[must_use]
    pub fn check(&self, headers: &HeaderMap, query: &QueryParams) -> AuthDecision {
        let Some(secret) = self.secret.as_deref() else {
            return AuthDecision::Allowed;
        };

        match extract_token(headers, query) {
            Some(token) if token == secret => AuthDecision::Allowed,
            _ => AuthDecision::Denied,
        }
    }
}

/// 按优先级提取候选令牌
pub(crate) fn extract_token<'a>(headers: &'a HeaderMap, query: &'a QueryParams) -> Option<&'a str> {
    header_str(headers, PROXY_TOKEN_HEADER)
        .or_else(|| header_str(headers, SUBSCRIPTION_KEY_HEADER))
        .or_else(|| {
            header_str(headers, AUTHORIZATION.as_str())
                .map(strip_bearer)
                .filter(|token| !token.is_empty())
        })
        .or_else(|| {
            TOKEN_QUERY_PARAMS
                .iter()
                .find_map(|name| query.first(name).filter(|token| !token.is_empty()))
        })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

/// 去掉 `Bearer` 前缀（不区分大小写，后面至少一个空白）并去除首尾空白
fn strip_bearer(value: &str) -> &str {
    const PREFIX: &str = "bearer";

    let stripped = value
        .get(..PREFIX.len())
        .filter(|head| head.eq_ignore_ascii_case(PREFIX))
        .and_then(|_| value.get(PREFIX.len()..))
        .filter(|rest| rest.starts_with(char::is_whitespace));

    stripped.unwrap_or(value).trim()
}
