//! # 应用配置结构定义

use crate::ensure_config;
use crate::error::Result;
use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use url::Url;

/// 默认上游翻译服务地址
pub const DEFAULT_UPSTREAM_ENDPOINT: &str = "https://api.cognitive.microsofttranslator.com";

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 监听服务配置
    pub server: ServerConfig,
    /// 上游翻译服务配置
    pub upstream: UpstreamConfig,
    /// 代理访问控制配置
    pub access: AccessConfig,
}

/// 监听服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// 入站请求体大小上限（字节）
    pub body_limit: usize,
    /// 是否启用CORS
    pub enable_cors: bool,
    /// 允许的CORS源地址
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            body_limit: 1024 * 1024, // 1MB
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// 上游翻译服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// 上游基础地址
    pub endpoint: String,
    /// 订阅区域（全局 Cognitive Services 资源需要）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// 上游请求超时时间（秒）
    pub timeout_seconds: u64,
    /// 轮换使用的订阅密钥
    pub keys: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_UPSTREAM_ENDPOINT.to_string(),
            region: None,
            timeout_seconds: 30,
            keys: Vec::new(),
        }
    }
}

/// 代理访问控制配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// 客户端访问代理所需的共享令牌，为空表示不校验
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AppConfig {
    /// 监听地址
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip = self.server.host.parse::<IpAddr>().map_err(|e| {
            crate::error::ProxyError::config_with_source(
                format!("无效的监听地址: {}", self.server.host),
                e,
            )
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// 非空的区域配置
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.upstream
            .region
            .as_deref()
            .map(str::trim)
            .filter(|region| !region.is_empty())
    }

    /// 非空的访问令牌
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access.token.as_deref().filter(|token| !token.is_empty())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        let endpoint = Url::parse(self.upstream.endpoint.trim())?;
        ensure_config!(
            matches!(endpoint.scheme(), "http" | "https"),
            "上游地址必须是 http(s) URL: {}",
            self.upstream.endpoint
        );
        ensure_config!(
            endpoint.host().is_some(),
            "上游地址缺少 host: {}",
            self.upstream.endpoint
        );
        ensure_config!(self.upstream.timeout_seconds > 0, "上游超时时间必须大于0");
        ensure_config!(self.server.body_limit > 0, "请求体大小上限必须大于0");
        self.socket_addr()?;

        for (index, key) in self.upstream.keys.iter().enumerate() {
            ensure_config!(
                HeaderValue::from_str(key.trim()).is_ok(),
                "第 {} 个订阅密钥包含非法字符",
                index + 1
            );
        }
        if let Some(region) = self.region() {
            ensure_config!(
                HeaderValue::from_str(region).is_ok(),
                "区域配置包含非法字符: {}",
                region
            );
        }

        Ok(())
    }
}
