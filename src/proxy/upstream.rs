//! # 上游调用
//!
//! `UpstreamClient` 是转发引擎与网络之间的接缝，默认实现基于 `reqwest`

use crate::error::{ProxyError, Result};
use async_trait::async_trait;
use axum::http::{HeaderMap, Method, StatusCode, header::CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// 发往上游的请求
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// GET 或 POST
    pub method: Method,
    /// 完整上游地址
    pub url: Url,
    /// 含订阅密钥的请求头
    pub headers: HeaderMap,
    /// GET 请求没有请求体
    pub body: Option<Value>,
}

/// 按 content-type 一次性解析出的上游响应体
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    /// content-type 声明为 JSON
    Json(Value),
    /// 其他响应按文本转发
    Text(String),
}

impl UpstreamBody {
    /// 根据 content-type 解析响应体
    ///
    /// 声明为 JSON 但无法解析时视为上游失败
    pub fn from_bytes(content_type: Option<&str>, bytes: &[u8]) -> Result<Self> {
        if is_json_content_type(content_type) {
            serde_json::from_slice(bytes).map(Self::Json).map_err(|e| {
                ProxyError::bad_gateway_with_source(
                    format!("invalid JSON in upstream response: {e}"),
                    e,
                )
            })
        } else {
            Ok(Self::Text(String::from_utf8_lossy(bytes).into_owned()))
        }
    }
}

/// content-type 是否声明为 JSON
#[must_use]
pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|value| value.to_ascii_lowercase().contains("application/json"))
}

/// 上游响应
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    /// 上游状态码
    pub status: StatusCode,
    /// 上游声明的 content-type
    pub content_type: Option<String>,
    /// 解析后的响应体
    pub body: UpstreamBody,
}

/// 上游客户端
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// 发送请求；网络错误、超时、响应无法解析均返回 `ProxyError::BadGateway`
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse>;

    /// 客户端名称
    fn name(&self) -> &'static str;
}

/// 基于 reqwest 的上游客户端
#[derive(Debug, Clone)]
pub struct HttpUpstreamClient {
    client: reqwest::Client,
}

impl HttpUpstreamClient {
    /// 创建客户端，`timeout` 覆盖整个请求（连接、发送、读取响应）
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ProxyError::config_with_source("创建上游HTTP客户端失败", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstreamClient {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        let body = UpstreamBody::from_bytes(content_type.as_deref(), &bytes)?;
        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}
