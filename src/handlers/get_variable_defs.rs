use async_trait::async_trait;
use serde_json::{json, Value};

use super::{node_tool_schema, parse_args, string_prop, NodeTarget};
use crate::error::ToolError;
use crate::protocol::{NodeArgs, ToolResult};
use crate::registry::{ToolContext, ToolDefinition, ToolHandler};
use crate::upstream::UpstreamRequest;

/// Local variable definitions of the file containing the node.
pub struct GetVariableDefs;

#[async_trait]
impl ToolHandler for GetVariableDefs {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_variable_defs".into(),
            description: "Get variable definitions (colors, spacing, typography tokens) for the file containing a given node.".into(),
            input_schema: node_tool_schema(
                json!({ "clientLanguages": string_prop("Programming languages used") }),
                &[],
            ),
        }
    }

    async fn call(&self, args: &Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: NodeArgs = parse_args("get_variable_defs", args)?;
        let target = NodeTarget::resolve(&args)?;

        // Variables are file-scoped; the node id only identifies the caller's selection.
        let request = UpstreamRequest::LocalVariables {
            file_key: target.file_key,
        };
        let variables = ctx.fetch(request, &target.credential).await?;
        ToolResult::json(&variables)
    }
}
