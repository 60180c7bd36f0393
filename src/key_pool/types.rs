//! # 密钥池类型定义

use crate::logging::mask_secret;
use std::fmt;
use std::sync::Arc;

/// 上游订阅密钥
///
/// 加载后不可变；`Debug` 与 `Display` 只输出脱敏形式。
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Credential(Arc<str>);

impl Credential {
    /// 创建密钥
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(Arc::from(value.as_ref()))
    }

    /// 空密钥（密钥池未配置时使用）
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// 原始密钥值，仅用于写入上游请求头
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// 是否为空密钥
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&mask_secret(&self.0)).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&mask_secret(&self.0))
    }
}

impl From<&str> for Credential {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}
