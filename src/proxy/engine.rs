//! # 转发引擎
//!
//! 单次转发流程：访问校验 → 构建上游URL → 选取密钥 → 调用上游 → 转发响应。
//! 访问被拒绝时不会消耗密钥；一旦选取了密钥，无论上游成功与否游标都已推进。

use super::query::QueryParams;
use super::response::ProxyResponse;
use super::translator::RequestTranslator;
use super::upstream::{HttpUpstreamClient, OutboundRequest, UpstreamClient};
use crate::auth::AuthGate;
use crate::config::AppConfig;
use crate::error::{ProxyError, Result};
use crate::key_pool::KeyPool;
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lerror, linfo, lwarn};
use axum::http::{HeaderMap, Method};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 入站请求中参与转发的部分
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    /// 入站请求头（用于访问校验）
    pub headers: HeaderMap,
    /// 入站查询参数
    pub query: QueryParams,
    /// 已解析的请求体，`None` 表示缺失
    pub body: Option<Value>,
}

/// 转发引擎
pub struct ForwardingEngine {
    auth: AuthGate,
    key_pool: KeyPool,
    translator: RequestTranslator,
    upstream: Arc<dyn UpstreamClient>,
}

impl std::fmt::Debug for ForwardingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardingEngine")
            .field("auth_enabled", &self.auth.is_enabled())
            .field("key_count", &self.key_pool.len())
            .field("translator", &self.translator)
            .field("upstream", &self.upstream.name())
            .finish()
    }
}

impl ForwardingEngine {
    /// 由各组件组装引擎
    pub fn new(
        auth: AuthGate,
        key_pool: KeyPool,
        translator: RequestTranslator,
        upstream: Arc<dyn UpstreamClient>,
    ) -> Self {
        Self {
            auth,
            key_pool,
            translator,
            upstream,
        }
    }

    /// 根据配置创建引擎，上游使用 reqwest 客户端
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let upstream = HttpUpstreamClient::new(Duration::from_secs(
            config.upstream.timeout_seconds,
        ))?;
        Self::with_upstream(config, Arc::new(upstream))
    }

    /// 根据配置创建引擎，使用指定的上游客户端
    pub fn with_upstream(config: &AppConfig, upstream: Arc<dyn UpstreamClient>) -> Result<Self> {
        let translator = RequestTranslator::new(&config.upstream.endpoint, config.region())?;
        let key_pool = KeyPool::from_keys(&config.upstream.keys);
        let auth = AuthGate::new(config.access_token());

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Engine,
            "engine_ready",
            "Forwarding engine initialized",
            endpoint = %translator.base_endpoint(),
            key_count = key_pool.len(),
            auth_enabled = auth.is_enabled(),
            upstream = upstream.name()
        );

        Ok(Self::new(auth, key_pool, translator, upstream))
    }

    /// 密钥池
    #[must_use]
    pub fn key_pool(&self) -> &KeyPool {
        &self.key_pool
    }

    /// 转发一次请求，`method` 为 GET 或 POST；只有 POST 携带请求体
    ///
    /// 访问被拒绝返回 `ProxyError::Unauthorized`；上游不可达、超时或响应无法解析返回
    /// `ProxyError::BadGateway`；其余情况按原状态码转发上游响应。
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        inbound: InboundRequest,
    ) -> Result<ProxyResponse> {
        let request_id = uuid::Uuid::new_v4().to_string();

        if !self.auth.check(&inbound.headers, &inbound.query).is_allowed() {
            lwarn!(
                request_id,
                LogStage::Authentication,
                LogComponent::Auth,
                "access_denied",
                "Rejected request with missing or invalid proxy token",
                method = %method,
                path = path
            );
            return Err(ProxyError::Unauthorized);
        }

        let url = self.translator.build_url(path, &inbound.query)?;
        let body = if method == Method::POST {
            Some(inbound.body.unwrap_or_else(|| json!([])))
        } else {
            None
        };
        ldebug!(
            request_id,
            LogStage::RequestModify,
            LogComponent::Translator,
            "build_upstream_url",
            "Built upstream URL",
            url = %url,
            has_body = body.is_some()
        );

        let credential = self.key_pool.next();
        let headers = self.translator.build_headers(&credential)?;

        ldebug!(
            request_id,
            LogStage::UpstreamRequest,
            LogComponent::Upstream,
            "send_upstream",
            "Forwarding request to upstream",
            method = %method,
            key = %credential
        );

        let started = Instant::now();
        let outbound = OutboundRequest {
            method: method.clone(),
            url,
            headers,
            body,
        };

        match self.upstream.send(outbound).await {
            Ok(upstream) => {
                linfo!(
                    request_id,
                    LogStage::Response,
                    LogComponent::Engine,
                    "relay_response",
                    "Relaying upstream response",
                    method = %method,
                    path = path,
                    status = upstream.status.as_u16(),
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
                );
                Ok(ProxyResponse::from(upstream))
            }
            Err(err) => {
                lerror!(
                    request_id,
                    LogStage::Error,
                    LogComponent::Upstream,
                    "upstream_failed",
                    "Upstream request failed",
                    method = %method,
                    path = path,
                    key = %credential,
                    error = %err,
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
                );
                match err {
                    ProxyError::BadGateway { .. } => Err(err),
                    other => Err(ProxyError::bad_gateway_with_source(other.to_string(), other)),
                }
            }
        }
    }
}
