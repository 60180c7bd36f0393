//! # 路由处理器

use super::AppState;
use super::body::parse_inbound_body;
use crate::error::Result;
use crate::proxy::{InboundRequest, ProxyResponse, QueryParams};
use axum::{
    Json,
    body::Bytes,
    extract::{RawQuery, State},
    http::{HeaderMap, Method, StatusCode},
    response::IntoResponse,
};
use serde_json::json;

/// 转发到上游的路径
pub const TRANSLATE_PATH: &str = "/translate";

/// 健康检查，不校验令牌也不消耗密钥
pub async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// `GET /translate`（axum 同时以此响应 HEAD，上游一律按 GET 转发）
pub async fn translate_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
) -> Result<ProxyResponse> {
    let inbound = InboundRequest {
        headers,
        query: QueryParams::parse(raw_query.as_deref()),
        body: None,
    };
    state.engine.forward(Method::GET, TRANSLATE_PATH, inbound).await
}

/// `POST /translate`
pub async fn translate_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
    body: Bytes,
) -> Result<ProxyResponse> {
    let body = parse_inbound_body(&headers, &body)?;
    let inbound = InboundRequest {
        headers,
        query: QueryParams::parse(raw_query.as_deref()),
        body,
    };
    state.engine.forward(Method::POST, TRANSLATE_PATH, inbound).await
}

/// 未匹配的路由
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}
