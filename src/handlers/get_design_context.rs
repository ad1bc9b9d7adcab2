use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{node_entry, node_not_found, node_tool_schema, parse_args, string_prop, NodeTarget};
use crate::error::ToolError;
use crate::protocol::response::to_pretty;
use crate::protocol::{DesignContextArgs, ToolResult};
use crate::registry::{ToolContext, ToolDefinition, ToolHandler};
use crate::upstream::UpstreamRequest;

/// Above this size the full view is replaced by an outline unless `forceCode` is set.
pub const LARGE_CONTEXT_BYTES: usize = 100_000;

/// Style properties copied verbatim into the code-generation view.
const STYLE_KEYS: [&str; 3] = ["fills", "strokes", "effects"];

/// A node reduced to what code generation needs.
pub struct GetDesignContext;

#[async_trait]
impl ToolHandler for GetDesignContext {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_design_context".into(),
            description: "Generate UI code context for a given node of a Figma file: layout, fills, strokes, effects and text, recursively.".into(),
            input_schema: node_tool_schema(
                json!({
                    "clientLanguages": string_prop("Programming languages for code generation"),
                    "clientFrameworks": string_prop("Frameworks used by the client"),
                    "forceCode": {
                        "type": "boolean",
                        "description": "Force code generation even if response is large"
                    }
                }),
                &[],
            ),
        }
    }

    async fn call(&self, args: &Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: DesignContextArgs = parse_args("get_design_context", args)?;
        let target = NodeTarget::resolve(&args.node)?;

        let request = UpstreamRequest::FileNodes {
            file_key: target.file_key.clone(),
            node_ids: vec![target.node_id.clone()],
        };
        let payload = ctx.fetch(request, &target.credential).await?;

        let document = node_entry(&payload, &target.node_id)
            .and_then(|entry| entry.get("document"))
            .ok_or_else(|| node_not_found(&target))?;

        let mut header = String::new();
        if let Some(languages) = &args.client_languages {
            header.push_str(&format!("Client languages: {languages}\n"));
        }
        if let Some(frameworks) = &args.client_frameworks {
            header.push_str(&format!("Client frameworks: {frameworks}\n"));
        }

        let view = to_pretty(&simplify(document))?;
        if view.len() > LARGE_CONTEXT_BYTES && !args.force_code {
            let outline = to_pretty(&outline(document))?;
            return Ok(ToolResult::text(format!(
                "{header}Design Context (outline only, full context is {} bytes; call again with forceCode=true for styles and layout):\n{outline}",
                view.len()
            )));
        }

        Ok(ToolResult::text(format!("{header}Design Context:\n{view}")))
    }
}

/// Reduce a Figma node to id, name, type, layout, styles, text and children.
pub fn simplify(node: &Value) -> Value {
    let mut out = Map::new();
    for key in ["id", "name", "type"] {
        out.insert(key.into(), node.get(key).cloned().unwrap_or(Value::Null));
    }

    if let Some(bbox) = node.get("absoluteBoundingBox") {
        out.insert("layout".into(), bbox.clone());
    }

    for key in STYLE_KEYS {
        if let Some(v) = node.get(key) {
            out.insert(key.into(), v.clone());
        }
    }

    if node.get("type").and_then(Value::as_str) == Some("TEXT") {
        out.insert(
            "characters".into(),
            node.get("characters").cloned().unwrap_or(Value::Null),
        );
        out.insert("style".into(), node.get("style").cloned().unwrap_or(Value::Null));
    }

    if let Some(children) = node.get("children").and_then(Value::as_array) {
        out.insert(
            "children".into(),
            Value::Array(children.iter().map(simplify).collect()),
        );
    }

    Value::Object(out)
}

/// Id, name and type only, recursively.
pub fn outline(node: &Value) -> Value {
    let mut out = Map::new();
    for key in ["id", "name", "type"] {
        out.insert(key.into(), node.get(key).cloned().unwrap_or(Value::Null));
    }
    if let Some(children) = node.get("children").and_then(Value::as_array) {
        out.insert(
            "children".into(),
            Value::Array(children.iter().map(outline).collect()),
        );
    }
    Value::Object(out)
}
