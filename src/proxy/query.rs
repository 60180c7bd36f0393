//! # 查询参数模型
//!
//! 保持参数出现顺序；同名参数重复出现或以 `name[]` 形式出现时视为列表

use indexmap::IndexMap;
use serde_json::Value;

/// 单个查询参数的值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// 单值，重新序列化时按 "set" 语义写入
    Scalar(String),
    /// 多值，每个元素追加一次
    List(Vec<String>),
    /// 空值，重新序列化时丢弃
    Null,
}

impl QueryValue {
    /// 第一个值
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value.as_str()),
            Self::List(values) => values.first().map(String::as_str),
            Self::Null => None,
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl<T: Into<String>> From<Vec<T>> for QueryValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// 有序的查询参数集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(IndexMap<String, QueryValue>);

impl QueryParams {
    /// 空集合
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析原始查询字符串（不含 `?`）
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let mut params = Self::new();
        let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
            return params;
        };

        for (name, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            match name.strip_suffix("[]") {
                Some(list_name) => params.push(list_name, value.into_owned(), true),
                None => params.push(&name, value.into_owned(), false),
            }
        }
        params
    }

    /// 追加一个值：首次出现为单值（`as_list` 时直接为列表），再次出现转为列表
    fn push(&mut self, name: &str, value: String, as_list: bool) {
        match self.0.get_mut(name) {
            Some(QueryValue::List(values)) => values.push(value),
            Some(slot) => {
                *slot = match std::mem::replace(slot, QueryValue::Null) {
                    QueryValue::Scalar(first) => QueryValue::List(vec![first, value]),
                    _ if as_list => QueryValue::List(vec![value]),
                    _ => QueryValue::Scalar(value),
                };
            }
            None => {
                let value = if as_list {
                    QueryValue::List(vec![value])
                } else {
                    QueryValue::Scalar(value)
                };
                self.0.insert(name.to_string(), value);
            }
        }
    }

    /// 设置参数值（覆盖同名参数，保持原位置）
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// 按名称取值
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&QueryValue> {
        self.0.get(name)
    }

    /// 参数的第一个值
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(QueryValue::first)
    }

    /// 按出现顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// 参数个数
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否没有参数
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 转为 JSON 对象（表单请求体使用）
    #[must_use]
    pub fn to_json(&self) -> Value {
        let object = self
            .0
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    QueryValue::Scalar(value) => Value::String(value.clone()),
                    QueryValue::List(values) => {
                        Value::Array(values.iter().cloned().map(Value::String).collect())
                    }
                    QueryValue::Null => Value::Null,
                };
                (name.clone(), value)
            })
            .collect();
        Value::Object(object)
    }
}
