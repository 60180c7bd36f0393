//! # 密钥池
//!
//! 订阅密钥的有序集合与轮询选择

mod pool;
mod types;

pub use pool::KeyPool;
pub use types::Credential;
