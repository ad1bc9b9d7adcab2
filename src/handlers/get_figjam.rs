use async_trait::async_trait;
use serde_json::{json, Value};

use super::{node_entry, node_not_found, node_tool_schema, parse_args, string_prop, NodeTarget};
use crate::error::ToolError;
use crate::protocol::response::to_pretty;
use crate::protocol::{FigjamArgs, ToolResult};
use crate::registry::{ToolContext, ToolDefinition, ToolHandler};
use crate::upstream::{ImageFormat, UpstreamRequest};

/// FigJam board nodes, optionally with rendered images.
pub struct GetFigjam;

#[async_trait]
impl ToolHandler for GetFigjam {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_figjam".into(),
            description: "Get the content of a given FigJam node (stickies, shapes, connectors), optionally with rendered images.".into(),
            input_schema: node_tool_schema(
                json!({
                    "clientLanguages": string_prop("Programming languages used"),
                    "includeImagesOfNodes": {
                        "type": "boolean",
                        "description": "Include images of nodes in response"
                    }
                }),
                &[],
            ),
        }
    }

    async fn call(&self, args: &Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: FigjamArgs = parse_args("get_figjam", args)?;
        let target = NodeTarget::resolve(&args.node)?;

        let request = UpstreamRequest::FileNodes {
            file_key: target.file_key.clone(),
            node_ids: vec![target.node_id.clone()],
        };
        let payload = ctx.fetch(request, &target.credential).await?;
        if node_entry(&payload, &target.node_id).is_none() {
            return Err(node_not_found(&target));
        }

        let mut result = ToolResult::json(&payload)?;

        if args.include_images_of_nodes {
            let request = UpstreamRequest::RenderImages {
                file_key: target.file_key.clone(),
                node_ids: vec![target.node_id.clone()],
                format: ImageFormat::Png,
                scale: 1.0,
            };
            let images = ctx.fetch(request, &target.credential).await?;
            result.push_text(format!("Node images:\n{}", to_pretty(&images)?));
        }

        Ok(result)
    }
}
