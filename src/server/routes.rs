//! # 路由配置

use super::AppState;
use super::handlers::{TRANSLATE_PATH, health, not_found, translate_get, translate_post};
use crate::config::ServerConfig;
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lwarn};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// 创建路由器
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route(TRANSLATE_PATH, get(translate_get).post(translate_post))
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.body_limit));

    let service_builder = ServiceBuilder::new().layer(TraceLayer::new_for_http());

    if config.enable_cors {
        app = app.layer(service_builder.layer(cors_layer(&config.cors_origins)));
    } else {
        app = app.layer(service_builder);
    }
    app
}

/// CORS 配置；包含 `*` 或源地址无效时允许任意来源
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let parsed = origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<std::result::Result<Vec<_>, _>>();

    match parsed {
        Ok(origins) => {
            ldebug!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "cors_origins",
                "Restricting CORS to configured origins",
                count = origins.len()
            );
            layer.allow_origin(origins)
        }
        Err(e) => {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "cors_config_fail",
                &format!("Invalid CORS origin configuration: {e}, falling back to allow any")
            );
            layer.allow_origin(Any)
        }
    }
}
