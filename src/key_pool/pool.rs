//! # 轮询密钥池
//!
//! 持有有序的订阅密钥与轮询游标，每个转发请求调用一次 [`KeyPool::next`]

use super::types::Credential;
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lwarn};
use std::sync::atomic::{AtomicUsize, Ordering};

/// 轮询密钥池
///
/// 游标只在 `next()` 内部以原子方式推进，始终满足 `cursor < max(1, len)`。
/// 推进与请求最终成功与否无关。
#[derive(Debug)]
pub struct KeyPool {
    credentials: Box<[Credential]>,
    cursor: AtomicUsize,
}

impl KeyPool {
    /// 创建密钥池，密钥按给定顺序轮换
    pub fn new<I, C>(credentials: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Credential>,
    {
        let credentials: Box<[Credential]> = credentials.into_iter().map(Into::into).collect();
        if credentials.is_empty() {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::KeyPool,
                "empty_key_pool",
                "Key pool is empty, requests will be forwarded without a subscription key"
            );
        }
        Self {
            credentials,
            cursor: AtomicUsize::new(0),
        }
    }

    /// 从配置中的原始字符串创建，去除空白并丢弃空项
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            keys.into_iter()
                .map(|key| key.as_ref().trim().to_string())
                .filter(|key| !key.is_empty()),
        )
    }

    /// 取出下一个密钥并推进游标
    ///
    /// 密钥池为空时返回空密钥
    pub fn next(&self) -> Credential {
        let len = self.credentials.len();
        if len == 0 {
            return Credential::empty();
        }

        // 闭包总是返回 Some，fetch_update 不会失败
        let index = match self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cursor| {
                Some((cursor + 1) % len)
            }) {
            Ok(previous) | Err(previous) => previous,
        };

        let credential = self.credentials[index].clone();
        ldebug!(
            "system",
            LogStage::Scheduling,
            LogComponent::KeyPool,
            "select_key",
            "Selected subscription key using round robin",
            selected_index = index,
            pool_size = len,
            key = %credential
        );
        credential
    }

    /// 密钥数量
    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// 是否未配置任何密钥
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
