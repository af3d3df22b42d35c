/// JSON-RPC / MCP error taxonomy.
///
/// Every handler in the tool dispatcher and every step of the `/mcp` request
/// pipeline returns `Result<_, McpError>`. `code()` and `http_status()` are
/// the single place the wire-level mapping from spec lives, so callers never
/// hand-roll a status code or JSON-RPC code next to a `Result`.
use axum::http::StatusCode;
use serde_json::Value;

#[derive(thiserror::Error, Debug)]
pub enum McpError {
    #[error("Parse error")]
    ParseError,

    #[error("Invalid Request")]
    InvalidRequest,

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {message}")]
    InvalidParams {
        message: String,
        data: Option<Value>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// Construct an `InvalidParams` error with no structured `data` payload.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        McpError::InvalidParams {
            message: message.into(),
            data: None,
        }
    }

    /// Construct an `InvalidParams` error that lists valid alternatives, per
    /// the "enumerate available alternatives" requirement for unknown
    /// referenced entities (circuit, component, signal, cached analysis).
    pub fn invalid_params_with_alternatives(
        message: impl Into<String>,
        alternatives: Vec<String>,
    ) -> Self {
        McpError::InvalidParams {
            message: message.into(),
            data: Some(serde_json::json!({ "available": alternatives })),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        McpError::Internal(message.into())
    }

    /// JSON-RPC 2.0 numeric error code.
    pub fn code(&self) -> i32 {
        match self {
            McpError::ParseError => -32700,
            McpError::InvalidRequest => -32600,
            McpError::MethodNotFound(_) => -32601,
            McpError::InvalidParams { .. } => -32602,
            McpError::Internal(_) => -32603,
        }
    }

    /// HTTP status code the `/mcp` pipeline answers with for this error.
    pub fn http_status(&self) -> StatusCode {
        match self {
            McpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Optional structured `data` field carried in the JSON-RPC error body.
    pub fn data(&self) -> Option<Value> {
        match self {
            McpError::InvalidParams { data, .. } => data.clone(),
            _ => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            McpError::InvalidParams { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_json_rpc_spec() {
        assert_eq!(McpError::ParseError.code(), -32700);
        assert_eq!(McpError::InvalidRequest.code(), -32600);
        assert_eq!(McpError::MethodNotFound("x".into()).code(), -32601);
        assert_eq!(McpError::invalid_params("x").code(), -32602);
        assert_eq!(McpError::internal("x").code(), -32603);
    }

    #[test]
    fn internal_maps_to_500_others_to_400() {
        assert_eq!(
            McpError::internal("boom").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            McpError::invalid_params("boom").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(McpError::ParseError.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn invalid_params_with_alternatives_carries_data() {
        let err = McpError::invalid_params_with_alternatives(
            "no such circuit",
            vec!["c1".to_string(), "c2".to_string()],
        );
        let data = err.data().unwrap();
        assert_eq!(data["available"], serde_json::json!(["c1", "c2"]));
    }
}
