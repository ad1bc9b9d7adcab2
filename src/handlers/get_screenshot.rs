use async_trait::async_trait;
use serde_json::{json, Value};

use super::{node_tool_schema, parse_args, string_prop, NodeTarget};
use crate::error::ToolError;
use crate::protocol::{ScreenshotArgs, ToolResult};
use crate::registry::{ToolContext, ToolDefinition, ToolHandler};
use crate::upstream::{ImageFormat, UpstreamRequest};

const DEFAULT_SCALE: f64 = 2.0;

/// Render a node to an image and return the render URLs.
pub struct GetScreenshot;

#[async_trait]
impl ToolHandler for GetScreenshot {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_screenshot".into(),
            description: "Generate a screenshot for a given node of a Figma file. Returns URLs of the rendered images.".into(),
            input_schema: node_tool_schema(
                json!({
                    "clientLanguages": string_prop("Programming languages used by the client"),
                    "format": {
                        "type": "string",
                        "enum": ["png", "jpg", "svg", "pdf"],
                        "description": "Image format (default png)"
                    },
                    "scale": {
                        "type": "number",
                        "minimum": 0.01,
                        "maximum": 4,
                        "description": "Image scale factor (default 2)"
                    }
                }),
                &[],
            ),
        }
    }

    async fn call(&self, args: &Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: ScreenshotArgs = parse_args("get_screenshot", args)?;
        let target = NodeTarget::resolve(&args.node)?;

        let format = match args.format.as_deref() {
            Some(f) => ImageFormat::parse(f)
                .ok_or_else(|| ToolError::InvalidParams(format!("Unsupported image format: {f}")))?,
            None => ImageFormat::Png,
        };

        let request = UpstreamRequest::RenderImages {
            file_key: target.file_key,
            node_ids: vec![target.node_id],
            format,
            scale: args.scale.unwrap_or(DEFAULT_SCALE),
        };

        let images = ctx.fetch(request, &target.credential).await?;
        ToolResult::json(&images)
    }
}
