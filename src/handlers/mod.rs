pub mod create_design_system_rules;
pub mod get_code_connect_map;
pub mod get_design_context;
pub mod get_figjam;
pub mod get_metadata;
pub mod get_screenshot;
pub mod get_variable_defs;
pub mod whoami;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::{RegistryError, ToolError};
use crate::figma_url;
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, NodeArgs, ToolCallParams};
use crate::registry::{ToolContext, ToolDefinition, ToolRegistry};
use crate::upstream::{Credential, Upstream};

/// MCP protocol revision advertised by `initialize`.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

pub const SERVER_NAME: &str = "figma-mcp-server";

/// Everything the dispatcher needs. Immutable once built.
pub struct ServerContext {
    pub registry: ToolRegistry,
    pub tools: ToolContext,
    pub tool_timeout: Duration,
}

impl ServerContext {
    pub fn new(registry: ToolRegistry, tools: ToolContext, tool_timeout: Duration) -> Self {
        Self {
            registry,
            tools,
            tool_timeout,
        }
    }

    /// Full Figma tool catalog against `upstream`.
    pub fn from_config(config: &ServerConfig, upstream: Arc<dyn Upstream>) -> Result<Self, RegistryError> {
        Ok(Self::new(
            figma_tools()?,
            ToolContext::from_config(upstream, config),
            config.tool_timeout,
        ))
    }
}

/// The registry in advertised order.
pub fn figma_tools() -> Result<ToolRegistry, RegistryError> {
    ToolRegistry::new()
        .with(Box::new(get_screenshot::GetScreenshot))?
        .with(Box::new(get_design_context::GetDesignContext))?
        .with(Box::new(get_metadata::GetMetadata))?
        .with(Box::new(get_variable_defs::GetVariableDefs))?
        .with(Box::new(get_figjam::GetFigjam))?
        .with(Box::new(get_code_connect_map::GetCodeConnectMap))?
        .with(Box::new(create_design_system_rules::CreateDesignSystemRules))?
        .with(Box::new(whoami::Whoami))
}

/// Parse one raw message and dispatch it.
///
/// Returns `None` when no response must be sent.
pub async fn handle_message(raw: &str, ctx: &ServerContext) -> Option<JsonRpcResponse> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Parse error");
            return Some(JsonRpcResponse::error(None, JsonRpcError::parse_error(e.to_string())));
        }
    };

    let req = match JsonRpcRequest::from_value(value) {
        Ok(r) => r,
        Err(invalid) => {
            warn!(reason = %invalid.reason, "Invalid request");
            return Some(JsonRpcResponse::error(
                invalid.id,
                JsonRpcError::invalid_request(invalid.reason),
            ));
        }
    };

    dispatch(&req, ctx).await
}

/// Dispatch a JSON-RPC request to the appropriate handler.
///
/// Returns `None` for notifications of undefined methods (no response required).
pub async fn dispatch(req: &JsonRpcRequest, ctx: &ServerContext) -> Option<JsonRpcResponse> {
    info!(method = %req.method, id = ?req.id, "MCP request");

    match req.method.as_str() {
        "initialize" => {
            let result = json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                },
                "instructions": "Figma design retrieval tools. Pass your Figma personal access token as `apiKey` with every call that reads a file."
            });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "tools/list" => {
            let list = ToolList {
                tools: ctx.registry.definitions(),
            };
            Some(serialize_result(req, &list))
        }

        "tools/call" => Some(call_tool(req, ctx).await),

        _ if req.is_notification() => None,

        _ => {
            warn!(method = %req.method, "Method not found");
            Some(JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::method_not_found(&req.method),
            ))
        }
    }
}

async fn call_tool(req: &JsonRpcRequest, ctx: &ServerContext) -> JsonRpcResponse {
    let id = req.id.clone();

    let params: ToolCallParams = match &req.params {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(Value::String(format!(
                        "Invalid tools/call params: {e}"
                    ))),
                );
            }
        },
        None => {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(Value::String("Missing params for tools/call".into())),
            );
        }
    };

    if !ctx.registry.contains(&params.name) {
        error!(tool = %params.name, "Unknown tool requested");
        return JsonRpcResponse::error(id, JsonRpcError::invalid_params(json!(ctx.registry.names())));
    }

    let args = match params.arguments {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(v @ Value::Object(_)) => v,
        Some(_) => {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params(Value::String("arguments must be an object".into())),
            );
        }
    };

    info!(tool = %params.name, "Calling tool");
    let outcome = match tokio::time::timeout(
        ctx.tool_timeout,
        ctx.registry.call(&params.name, &args, &ctx.tools),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(_) => Err(ToolError::Timeout(ctx.tool_timeout.as_secs())),
    };

    match outcome {
        Ok(result) => serialize_result(req, &result),
        Err(err) => {
            error!(tool = %params.name, error = %err, "Tool call failed");
            JsonRpcResponse::error(id, err.into())
        }
    }
}

fn serialize_result<T: Serialize>(req: &JsonRpcRequest, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(req.id.clone(), value),
        Err(e) => JsonRpcResponse::error(
            req.id.clone(),
            JsonRpcError::internal_error(format!("Serialization failed: {e}")),
        ),
    }
}

#[derive(Serialize)]
struct ToolList<'a> {
    tools: Vec<&'a ToolDefinition>,
}

// ---------------------------------------------------------------------------
// Shared helpers for tool handlers
// ---------------------------------------------------------------------------

/// Deserialize already schema-checked arguments into a typed struct.
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: &Value) -> Result<T, ToolError> {
    serde_json::from_value(args.clone())
        .map_err(|e| ToolError::InvalidParams(format!("Invalid arguments for {tool}: {e}")))
}

pub(crate) fn string_prop(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn required_string_prop(description: &str) -> Value {
    json!({ "type": "string", "minLength": 1, "description": description })
}

/// Input schema for tools reading one node of one file.
///
/// `extra` is merged into `properties`; `extra_required` is appended to
/// `fileKey`, `nodeId`, `apiKey`.
pub(crate) fn node_tool_schema(extra: Value, extra_required: &[&str]) -> Value {
    let mut properties = Map::new();
    properties.insert(
        "nodeId".into(),
        required_string_prop("The ID of the node in the Figma document, e.g. 1:2 (a share URL with node-id is accepted)"),
    );
    properties.insert(
        "fileKey".into(),
        required_string_prop("The key of the Figma file to use (a share URL is accepted)"),
    );
    properties.insert("apiKey".into(), required_string_prop("Figma API access token"));
    if let Value::Object(extra) = extra {
        properties.extend(extra);
    }

    let mut required = vec!["nodeId", "fileKey", "apiKey"];
    required.extend_from_slice(extra_required);

    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// Schema for a single required `apiKey`.
pub(crate) fn api_key_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "apiKey": required_string_prop("Figma API access token") },
        "required": ["apiKey"]
    })
}

/// File key, node id and credential after URL normalization.
pub(crate) struct NodeTarget {
    pub file_key: String,
    pub node_id: String,
    pub credential: Credential,
}

impl NodeTarget {
    pub fn resolve(args: &NodeArgs) -> Result<Self, ToolError> {
        let file_key = figma_url::file_key(&args.file_key);
        let node_id = figma_url::node_id(&args.node_id);
        if file_key.is_empty() || node_id.is_empty() {
            return Err(ToolError::InvalidParams("fileKey and nodeId are required".into()));
        }
        Ok(Self {
            file_key,
            node_id,
            credential: Credential::new(args.api_key.clone()),
        })
    }
}

/// `nodes[<id>]` entry of a `GET /files/{key}/nodes` response.
pub(crate) fn node_entry<'a>(payload: &'a Value, node_id: &str) -> Option<&'a Value> {
    payload
        .get("nodes")
        .and_then(|nodes| nodes.get(node_id))
        .filter(|entry| !entry.is_null())
}

pub(crate) fn node_not_found(target: &NodeTarget) -> ToolError {
    ToolError::NotFound(format!(
        "Node {} not found in file {}",
        target.node_id, target.file_key
    ))
}
