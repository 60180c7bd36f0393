//! # 上游请求构建
//!
//! 拼接上游地址、重新序列化查询参数，并生成带订阅密钥的请求头

use super::headers::{SUBSCRIPTION_KEY_HEADER, SUBSCRIPTION_REGION_HEADER};
use super::query::{QueryParams, QueryValue};
use crate::error::{ProxyError, Result};
use crate::key_pool::Credential;
use axum::http::{HeaderMap, HeaderName, HeaderValue, header::CONTENT_TYPE};
use url::Url;

/// 上游请求构建器
#[derive(Debug, Clone)]
pub struct RequestTranslator {
    /// 去掉末尾斜杠的基础地址
    base_endpoint: String,
    /// 区域头，未配置时不发送
    region: Option<HeaderValue>,
}

impl RequestTranslator {
    /// 创建构建器；空白区域视为未配置
    pub fn new(base_endpoint: &str, region: Option<&str>) -> Result<Self> {
        let base_endpoint = base_endpoint.trim().trim_end_matches('/').to_string();
        Url::parse(&base_endpoint).map_err(|e| {
            ProxyError::config_with_source(format!("无效的上游地址: {base_endpoint}"), e)
        })?;

        let region = region
            .map(str::trim)
            .filter(|region| !region.is_empty())
            .map(|region| {
                HeaderValue::from_str(region).map_err(|e| {
                    ProxyError::config_with_source(format!("无效的区域配置: {region}"), e)
                })
            })
            .transpose()?;

        Ok(Self {
            base_endpoint,
            region,
        })
    }

    /// 基础地址
    #[must_use]
    pub fn base_endpoint(&self) -> &str {
        &self.base_endpoint
    }

    /// 构建上游URL
    ///
    /// 单值参数按 "set" 语义写入（同名只保留一个），列表参数逐个追加，空值丢弃。
    pub fn build_url(&self, path: &str, query: &QueryParams) -> Result<Url> {
        let joined = format!("{}/{}", self.base_endpoint, path.trim_start_matches('/'));
        let mut url = Url::parse(&joined)?;

        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        for (name, value) in query.iter() {
            match value {
                QueryValue::Scalar(value) => set_pair(&mut pairs, name, value),
                QueryValue::List(values) => pairs.extend(
                    values
                        .iter()
                        .map(|value| (name.to_string(), value.clone())),
                ),
                QueryValue::Null => {}
            }
        }

        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(&pairs);
        }
        Ok(url)
    }

    /// 构建上游请求头
    pub fn build_headers(&self, credential: &Credential) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let mut key = HeaderValue::from_str(credential.expose())
            .map_err(|e| ProxyError::config_with_source("订阅密钥包含非法字符", e))?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static(SUBSCRIPTION_KEY_HEADER), key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(region) = &self.region {
            headers.insert(
                HeaderName::from_static(SUBSCRIPTION_REGION_HEADER),
                region.clone(),
            );
        }
        Ok(headers)
    }
}

/// `URLSearchParams.set` 语义：替换第一个同名参数并删除其余同名参数，不存在时追加
fn set_pair(pairs: &mut Vec<(String, String)>, name: &str, value: &str) {
    match pairs.iter().position(|(existing, _)| existing == name) {
        Some(index) => {
            pairs[index].1 = value.to_string();
            let mut seen = 0;
            pairs.retain(|(existing, _)| {
                if existing != name {
                    return true;
                }
                seen += 1;
                seen == 1
            });
        }
        None => pairs.push((name.to_string(), value.to_string())),
    }
}
