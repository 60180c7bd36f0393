//! # 翻译代理模块
//!
//! 将 `/translate` 请求转发至上游翻译服务，每个请求轮换一个订阅密钥

pub mod engine;
pub mod headers;
pub mod query;
pub mod response;
pub mod translator;
pub mod upstream;

pub use engine::{ForwardingEngine, InboundRequest};
pub use query::{QueryParams, QueryValue};
pub use response::ProxyResponse;
pub use translator::RequestTranslator;
pub use upstream::{HttpUpstreamClient, OutboundRequest, UpstreamBody, UpstreamClient, UpstreamResponse};
