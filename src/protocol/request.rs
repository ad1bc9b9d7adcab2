use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// JSON-RPC 2.0 id: a number or a string, echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(Number),
    Str(String),
}

impl From<i64> for RpcId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for RpcId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

/// JSON-RPC 2.0 request envelope.
///
/// `id` is `None` both for an absent and an explicit `null` id; only an
/// absent id makes the message a notification.
#[derive(Debug, Clone)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<RpcId>,
    pub method: String,
    pub params: Option<Value>,
    pub notification: bool,
}

/// A request body that is valid JSON but not a valid JSON-RPC request.
///
/// `id` is set when it could still be recovered from the body, so the
/// error can be correlated by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidRequest {
    pub id: Option<RpcId>,
    pub reason: String,
}

impl JsonRpcRequest {
    /// Validate the shape of a decoded JSON body.
    ///
    /// Serde derive is not used here because a shape error must still
    /// recover the `id` for the error response.
    pub fn from_value(value: Value) -> Result<Self, InvalidRequest> {
        let Value::Object(mut obj) = value else {
            return Err(invalid(None, "request must be a JSON object"));
        };

        let notification = !obj.contains_key("id");
        let id = match obj.remove("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(RpcId::Str(s)),
            Some(Value::Number(n)) => Some(RpcId::Number(n)),
            Some(_) => return Err(invalid(None, "id must be a number or a string")),
        };

        match obj.remove("jsonrpc") {
            Some(Value::String(v)) if v == "2.0" => {}
            _ => return Err(invalid(id, "jsonrpc must be \"2.0\"")),
        }

        let method = match obj.remove("method") {
            Some(Value::String(m)) => m,
            Some(_) => return Err(invalid(id, "method must be a string")),
            None => return Err(invalid(id, "method is required")),
        };

        let params = match obj.remove("params") {
            None | Some(Value::Null) => None,
            Some(p @ Value::Object(_)) => Some(p),
            Some(_) => return Err(invalid(id, "params must be an object")),
        };

        Ok(Self {
            jsonrpc: "2.0".into(),
            id,
            method,
            params,
            notification,
        })
    }

    /// A request without an `id` member expects no response.
    pub fn is_notification(&self) -> bool {
        self.notification
    }
}

fn invalid(id: Option<RpcId>, reason: &str) -> InvalidRequest {
    InvalidRequest {
        id,
        reason: reason.to_string(),
    }
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Arguments shared by tools that read one node of one file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeArgs {
    pub file_key: String,
    pub node_id: String,
    pub api_key: String,
}

/// Arguments for `get_screenshot`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotArgs {
    #[serde(flatten)]
    pub node: NodeArgs,
    pub format: Option<String>,
    pub scale: Option<f64>,
}

/// Arguments for `get_design_context`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignContextArgs {
    #[serde(flatten)]
    pub node: NodeArgs,
    pub client_languages: Option<String>,
    pub client_frameworks: Option<String>,
    #[serde(default)]
    pub force_code: bool,
}

/// Arguments for `get_figjam`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigjamArgs {
    #[serde(flatten)]
    pub node: NodeArgs,
    #[serde(default)]
    pub include_images_of_nodes: bool,
}

/// Arguments for `get_code_connect_map`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeConnectArgs {
    #[serde(flatten)]
    pub node: NodeArgs,
    pub code_connect_label: String,
}

/// Arguments for `create_design_system_rules`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSystemRulesArgs {
    pub node_id: String,
    pub client_languages: Option<String>,
    pub client_frameworks: Option<String>,
}

/// Arguments for `whoami`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoamiArgs {
    pub api_key: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_well_formed_request() {
        let req = JsonRpcRequest::from_value(json!({
            "jsonrpc": "2.0", "id": "abc", "method": "tools/list"
        }))
        .unwrap();
        assert_eq!(req.id, Some(RpcId::from("abc")));
        assert_eq!(req.method, "tools/list");
        assert!(req.params.is_none());
        assert!(!req.is_notification());
    }

    #[test]
    fn non_integer_ids_are_kept() {
        let req = JsonRpcRequest::from_value(json!({
            "jsonrpc": "2.0", "id": 1.5, "method": "tools/list"
        }))
        .unwrap();
        assert_eq!(serde_json::to_value(&req.id).unwrap(), json!(1.5));

        let req = JsonRpcRequest::from_value(json!({
            "jsonrpc": "2.0", "id": u64::MAX, "method": "tools/list"
        }))
        .unwrap();
        assert_eq!(serde_json::to_value(&req.id).unwrap(), json!(u64::MAX));
    }

    #[test]
    fn only_absent_id_marks_notification() {
        let absent = JsonRpcRequest::from_value(json!({"jsonrpc": "2.0", "method": "bogus"})).unwrap();
        assert!(absent.is_notification());

        let null = JsonRpcRequest::from_value(json!({"jsonrpc": "2.0", "id": null, "method": "bogus"})).unwrap();
        assert!(null.id.is_none());
        assert!(!null.is_notification());
    }

    #[test]
    fn missing_method_keeps_id() {
        let err = JsonRpcRequest::from_value(json!({"jsonrpc": "2.0", "id": 4})).unwrap_err();
        assert_eq!(err.id, Some(RpcId::from(4)));
    }

    #[test]
    fn wrong_version_rejected() {
        let err = JsonRpcRequest::from_value(json!({
            "jsonrpc": "1.0", "id": 1, "method": "initialize"
        }))
        .unwrap_err();
        assert_eq!(err.id, Some(RpcId::from(1)));
        assert!(err.reason.contains("2.0"));
    }

    #[test]
    fn unusable_id_is_dropped() {
        let err = JsonRpcRequest::from_value(json!({
            "jsonrpc": "2.0", "id": {"nested": true}, "method": "initialize"
        }))
        .unwrap_err();
        assert_eq!(err.id, None);
    }

    #[test]
    fn flattened_args_deserialize() {
        let args: DesignContextArgs = serde_json::from_value(json!({
            "fileKey": "F", "nodeId": "1:2", "apiKey": "k", "forceCode": true
        }))
        .unwrap();
        assert_eq!(args.node.file_key, "F");
        assert!(args.force_code);
        assert!(args.client_languages.is_none());
    }
}
