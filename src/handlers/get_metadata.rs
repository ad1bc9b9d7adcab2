use async_trait::async_trait;
use serde_json::{json, Value};

use super::{node_entry, node_not_found, node_tool_schema, parse_args, string_prop, NodeTarget};
use crate::error::ToolError;
use crate::protocol::{NodeArgs, ToolResult};
use crate::registry::{ToolContext, ToolDefinition, ToolHandler};
use crate::upstream::UpstreamRequest;

/// Raw node metadata for one node.
pub struct GetMetadata;

#[async_trait]
impl ToolHandler for GetMetadata {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_metadata".into(),
            description: "Get metadata for a node or page of a Figma file: ids, layer types, names, positions and sizes.".into(),
            input_schema: node_tool_schema(
                json!({ "clientLanguages": string_prop("Programming languages used") }),
                &[],
            ),
        }
    }

    async fn call(&self, args: &Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: NodeArgs = parse_args("get_metadata", args)?;
        let target = NodeTarget::resolve(&args)?;

        let request = UpstreamRequest::FileNodes {
            file_key: target.file_key.clone(),
            node_ids: vec![target.node_id.clone()],
        };
        let payload = ctx.fetch(request, &target.credential).await?;

        if node_entry(&payload, &target.node_id).is_none() {
            return Err(node_not_found(&target));
        }
        ToolResult::json(&payload)
    }
}
