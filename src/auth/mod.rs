//! # 认证模块
//!
//! 代理自身的共享令牌访问控制

mod gate;

pub use gate::{AuthDecision, AuthGate, TOKEN_QUERY_PARAMS};
