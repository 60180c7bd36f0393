//! # 入站请求体解析
//!
//! JSON 请求体原样解析；表单请求体转为字符串对象；空请求体或其他类型视为缺失

use crate::error::{ProxyError, Result};
use crate::proxy::QueryParams;
use axum::body::Bytes;
use axum::http::{HeaderMap, header::CONTENT_TYPE};
use serde_json::Value;

/// 入站请求体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
    Other,
}

fn body_kind(headers: &HeaderMap) -> BodyKind {
    let Some(content_type) = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return BodyKind::Other;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if mime == "application/json" || mime.ends_with("+json") {
        BodyKind::Json
    } else if mime == "application/x-www-form-urlencoded" {
        BodyKind::Form
    } else {
        BodyKind::Other
    }
}

/// 解析入站请求体
///
/// JSON `null` 与空请求体一样视为缺失
pub fn parse_inbound_body(headers: &HeaderMap, bytes: &Bytes) -> Result<Option<Value>> {
    if bytes.is_empty() {
        return Ok(None);
    }

    match body_kind(headers) {
        BodyKind::Json => {
            let value: Value = serde_json::from_slice(bytes).map_err(|e| {
                ProxyError::bad_request_with_source(format!("invalid JSON body: {e}"), e)
            })?;
            Ok(Some(value).filter(|value| !value.is_null()))
        }
        BodyKind::Form => {
            let raw = std::str::from_utf8(bytes).map_err(|e| {
                ProxyError::bad_request_with_source("form body is not valid UTF-8", e)
            })?;
            Ok(Some(QueryParams::parse(Some(raw)).to_json()))
        }
        BodyKind::Other => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[rstest]
    #[case("application/json")]
    #[case("application/json; charset=utf-8")]
    #[case("application/merge-patch+json")]
    fn test_json_body(#[case] content_type: &'static str) {
        let body = Bytes::from_static(br#"[{"Text":"Hello"}]"#);
        let parsed = parse_inbound_body(&headers(content_type), &body).unwrap();
        assert_eq!(parsed, Some(json!([{ "Text": "Hello" }])));
    }

    #[test]
    fn test_json_null_is_absent() {
        let parsed = parse_inbound_body(&headers("application/json"), &Bytes::from_static(b"null"))
            .unwrap();
        assert_eq!(parsed, None);
    }

    #[test]
    fn test_malformed_json_is_bad_request() {
        let err = parse_inbound_body(&headers("application/json"), &Bytes::from_static(b"[{"))
            .unwrap_err();
        assert!(matches!(err, ProxyError::BadRequest { .. }));
    }

    #[test]
    fn test_form_body_becomes_object() {
        let body = Bytes::from_static(b"text=hello+world&to=es&to=fr");
        let parsed =
            parse_inbound_body(&headers("application/x-www-form-urlencoded"), &body).unwrap();
        assert_eq!(parsed, Some(json!({ "text": "hello world", "to": ["es", "fr"] })));
    }

    #[rstest]
    #[case(None, b"[1]".as_slice())]
    #[case(Some("text/plain"), b"hello".as_slice())]
    #[case(Some("application/json"), b"".as_slice())]
    fn test_absent_body(#[case] content_type: Option<&'static str>, #[case] raw: &'static [u8]) {
        let headers = content_type.map(headers).unwrap_or_default();
        let parsed = parse_inbound_body(&headers, &Bytes::from_static(raw)).unwrap();
        assert_eq!(parsed, None);
    }
}
