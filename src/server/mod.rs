//! # 代理HTTP服务器
//!
//! Axum HTTP服务器，暴露 `/health` 与 `/translate`

pub mod body;
pub mod handlers;
pub mod routes;

pub use routes::build_router;

use crate::config::AppConfig;
use crate::error::{ProxyError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::proxy::ForwardingEngine;
use crate::linfo;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// 服务器应用状态
#[derive(Debug, Clone)]
pub struct AppState {
    /// 共享的转发引擎
    pub engine: Arc<ForwardingEngine>,
}

impl AppState {
    /// 创建应用状态
    #[must_use]
    pub const fn new(engine: Arc<ForwardingEngine>) -> Self {
        Self { engine }
    }
}

/// 代理服务器
pub struct ProxyServer {
    addr: SocketAddr,
    router: Router,
}

impl ProxyServer {
    /// 创建服务器
    pub fn new(config: &AppConfig, engine: Arc<ForwardingEngine>) -> Result<Self> {
        let addr = config.socket_addr()?;
        let router = build_router(AppState::new(engine), &config.server);
        Ok(Self { addr, router })
    }

    /// 监听地址
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// 路由器（测试中直接驱动）
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// 启动服务器，`shutdown` 完成后优雅退出
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await.map_err(|e| {
            ProxyError::server_start_with_source(format!("无法绑定监听地址 {}", self.addr), e)
        })?;
        let addr = listener.local_addr()?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            &format!("Key-rotator proxy listening on http://{addr}")
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ProxyError::server_start_with_source("代理服务器异常退出", e))?;

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "server_stopped",
            "Proxy server stopped"
        );
        Ok(())
    }
}
