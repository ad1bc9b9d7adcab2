use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{node_entry, node_not_found, node_tool_schema, parse_args, string_prop, NodeTarget};
use crate::error::ToolError;
use crate::protocol::{CodeConnectArgs, ToolResult};
use crate::registry::{ToolContext, ToolDefinition, ToolHandler};
use crate::upstream::UpstreamRequest;

const NO_SOURCE_NOTE: &str =
    "The Figma REST API does not expose Code Connect sources; codeConnectSrc is null and componentName identifies the component to map.";

/// Component instances under a node, keyed by node id.
pub struct GetCodeConnectMap;

#[async_trait]
impl ToolHandler for GetCodeConnectMap {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_code_connect_map".into(),
            description: "Get a mapping from node ids to the components they instantiate, for linking Figma components to code.".into(),
            input_schema: node_tool_schema(
                json!({
                    "codeConnectLabel": string_prop("Label to fetch Code Connect info for a language/framework")
                }),
                &["codeConnectLabel"],
            ),
        }
    }

    async fn call(&self, args: &Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: CodeConnectArgs = parse_args("get_code_connect_map", args)?;
        let target = NodeTarget::resolve(&args.node)?;

        let request = UpstreamRequest::FileNodes {
            file_key: target.file_key.clone(),
            node_ids: vec![target.node_id.clone()],
        };
        let payload = ctx.fetch(request, &target.credential).await?;

        let entry = node_entry(&payload, &target.node_id).ok_or_else(|| node_not_found(&target))?;
        let document = entry.get("document").ok_or_else(|| node_not_found(&target))?;
        let components = entry.get("components").cloned().unwrap_or(Value::Null);

        let mut mappings = Map::new();
        collect_instances(document, &components, &args.code_connect_label, &mut mappings);

        ToolResult::json(&json!({
            "nodeId": target.node_id,
            "codeConnectLabel": args.code_connect_label,
            "mappings": mappings,
            "note": NO_SOURCE_NOTE
        }))
    }
}

/// Walk the subtree collecting `INSTANCE` nodes.
pub fn collect_instances(node: &Value, components: &Value, label: &str, out: &mut Map<String, Value>) {
    if node.get("type").and_then(Value::as_str) == Some("INSTANCE") {
        if let (Some(id), Some(component_id)) = (
            node.get("id").and_then(Value::as_str),
            node.get("componentId").and_then(Value::as_str),
        ) {
            let component_name = components
                .get(component_id)
                .and_then(|c| c.get("name"))
                .cloned()
                .unwrap_or(Value::Null);
            out.insert(
                id.to_string(),
                json!({
                    "name": node.get("name").cloned().unwrap_or(Value::Null),
                    "componentId": component_id,
                    "componentName": component_name,
                    "label": label,
                    "codeConnectSrc": null
                }),
            );
        }
    }

    if let Some(children) = node.get("children").and_then(Value::as_array) {
        for child in children {
            collect_instances(child, components, label, out);
        }
    }
}
