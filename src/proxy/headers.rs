//! 代理使用的固定请求头/响应头名称

/// 客户端访问代理的专用令牌头
pub const PROXY_TOKEN_HEADER: &str = "x-proxy-token";

/// 上游订阅密钥头
pub const SUBSCRIPTION_KEY_HEADER: &str = "ocp-apim-subscription-key";

/// 上游订阅区域头
pub const SUBSCRIPTION_REGION_HEADER: &str = "ocp-apim-subscription-region";

/// 标记响应由本代理转发
pub const PROXY_UPSTREAM_HEADER: &str = "x-proxy-upstream";

/// `x-proxy-upstream` 的固定值
pub const PROXY_UPSTREAM_VALUE: &str = "azure-translator";
