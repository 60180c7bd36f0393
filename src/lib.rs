//! # Translator Key Proxy Library
//!
//! 翻译服务反向代理核心库：按请求轮换订阅密钥，可选共享令牌访问控制

pub mod auth;
pub mod config;
pub mod error;
pub mod key_pool;
pub mod logging;
pub mod proxy;
pub mod server;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{ProxyError, Result};
