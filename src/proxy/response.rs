//! # 代理响应
//!
//! 保留上游状态码，按响应体类型写出，并附加 `x-proxy-upstream` 标记头

use super::headers::{PROXY_UPSTREAM_HEADER, PROXY_UPSTREAM_VALUE};
use super::upstream::{UpstreamBody, UpstreamResponse};
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// 转发给客户端的响应
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    /// 上游状态码
    pub status: StatusCode,
    /// 写出的 content-type
    pub content_type: String,
    /// 响应体
    pub body: UpstreamBody,
}

impl From<UpstreamResponse> for ProxyResponse {
    fn from(upstream: UpstreamResponse) -> Self {
        let content_type = match &upstream.body {
            UpstreamBody::Json(_) => JSON_CONTENT_TYPE.to_string(),
            UpstreamBody::Text(_) => upstream
                .content_type
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| TEXT_CONTENT_TYPE.to_string()),
        };
        Self {
            status: upstream.status,
            content_type,
            body: upstream.body,
        }
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let body = match self.body {
            UpstreamBody::Json(value) => match serde_json::to_vec(&value) {
                Ok(bytes) => Body::from(bytes),
                Err(e) => {
                    return crate::error::ProxyError::from(e).into_response();
                }
            },
            UpstreamBody::Text(text) => Body::from(text),
        };

        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(TEXT_CONTENT_TYPE));

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, content_type);
        headers.insert(
            HeaderName::from_static(PROXY_UPSTREAM_HEADER),
            HeaderValue::from_static(PROXY_UPSTREAM_VALUE),
        );
        response
    }
}
