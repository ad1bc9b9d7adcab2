use serde::Serialize;
use serde_json::Value;

use super::request::RpcId;
use crate::error::ToolError;

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 response layer
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 response envelope.
///
/// `id` is always serialized; it is `null` when the request id could not
/// be determined.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<RpcId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<RpcId>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<RpcId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self {
            code: Self::PARSE_ERROR,
            message: "Parse error".into(),
            data: Some(Value::String(detail.into())),
        }
    }

    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self {
            code: Self::INVALID_REQUEST,
            message: "Invalid request".into(),
            data: Some(Value::String(detail.into())),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: "Method not found".into(),
            data: Some(Value::String(format!("Unknown method: {method}"))),
        }
    }

    pub fn invalid_params(data: Value) -> Self {
        Self {
            code: Self::INVALID_PARAMS,
            message: "Invalid params".into(),
            data: Some(data),
        }
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self {
            code: Self::INTERNAL_ERROR,
            message: "Internal error".into(),
            data: Some(Value::String(detail.into())),
        }
    }
}

/// Convert a failed tool call into a JSON-RPC error.
///
/// The JSON-RPC `code` is derived from the error kind; the error's
/// display string is carried in `data`.
impl From<ToolError> for JsonRpcError {
    fn from(err: ToolError) -> Self {
        let detail = err.to_string();
        match err.json_rpc_code() {
            Self::INVALID_PARAMS => Self::invalid_params(Value::String(detail)),
            _ => Self::internal_error(detail),
        }
    }
}

// ---------------------------------------------------------------------------
// MCP tool result layer (returned inside a *successful* JSON-RPC response)
// ---------------------------------------------------------------------------

/// MCP tool call result wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub content: Vec<ToolResultContent>,
}

/// A single content block inside a tool result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResultContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl ToolResultContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text".into(),
            text: text.into(),
        }
    }
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResultContent::text(text)],
        }
    }

    /// Single text block holding pretty-printed JSON.
    pub fn json(value: &Value) -> Result<Self, ToolError> {
        Ok(Self::text(to_pretty(value)?))
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.content.push(ToolResultContent::text(text));
    }
}

pub(crate) fn to_pretty(value: &Value) -> Result<String, ToolError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ToolError::Internal(format!("Serialization failed: {e}")))
}
