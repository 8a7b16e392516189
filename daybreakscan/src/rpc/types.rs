use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("no RPC providers configured")]
    NoProvidersConfigured,
    #[error("upstream timeout")]
    UpstreamTimeout,
    #[error("upstream rate limited")]
    UpstreamRateLimited,
    #[error("upstream error: {0}")]
    UpstreamError(String),
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    pub id: u64,
    pub result: Option<serde_json::Value>,
    pub error: Option<JsonRpcErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcErrorBody {
    pub code: i64,
    pub message: String,
}

/// One call in a `batch()` request: method name plus positional params.
#[derive(Debug, Clone)]
pub struct RpcCall {
    pub method: String,
    pub params: serde_json::Value,
}

impl RpcCall {
    pub fn new(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self { method: method.into(), params }
    }
}

/// Sort order for enhanced transaction history pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}
