use async_trait::async_trait;
use serde_json::{json, Value};

use super::{parse_args, string_prop};
use crate::error::ToolError;
use crate::figma_url;
use crate::protocol::{DesignSystemRulesArgs, ToolResult};
use crate::registry::{ToolContext, ToolDefinition, ToolHandler};

/// Prompt for generating design-system rules. Makes no upstream call.
///
/// Takes only `nodeId`: no file key or API key is declared for this tool.
pub struct CreateDesignSystemRules;

#[async_trait]
impl ToolHandler for CreateDesignSystemRules {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "create_design_system_rules".into(),
            description: "Provides a prompt to generate design system rules for this repo.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "nodeId": {
                        "type": "string",
                        "minLength": 1,
                        "description": "The ID of the node in the Figma document"
                    },
                    "clientLanguages": string_prop("Programming languages used by the client"),
                    "clientFrameworks": string_prop("Frameworks used by the client")
                },
                "required": ["nodeId"]
            }),
        }
    }

    async fn call(&self, args: &Value, _ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: DesignSystemRulesArgs = parse_args("create_design_system_rules", args)?;
        Ok(ToolResult::text(rules_prompt(&args)))
    }
}

fn rules_prompt(args: &DesignSystemRulesArgs) -> String {
    let node_id = figma_url::node_id(&args.node_id);
    let languages = args.client_languages.as_deref().unwrap_or("unknown");
    let frameworks = args.client_frameworks.as_deref().unwrap_or("unknown");

    format!(
        "Generate design system rules for this repository, starting from Figma node {node_id}.\n\
         \n\
         Client languages: {languages}\n\
         Client frameworks: {frameworks}\n\
         \n\
         1. Inspect the repository for existing tokens (colors, spacing, typography, radii, shadows) and where they are defined.\n\
         2. List the reusable UI components, their location and naming conventions.\n\
         3. Describe how styles are applied (CSS modules, utility classes, styled components, theme objects).\n\
         4. Describe how icons and image assets are stored and referenced.\n\
         5. Write the rules as concise instructions that map Figma variables and components to the repository's tokens and components, \
         so generated code reuses them instead of hard-coding values.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_mentions_inputs() {
        let prompt = rules_prompt(&DesignSystemRulesArgs {
            node_id: "4-7".into(),
            client_languages: Some("typescript".into()),
            client_frameworks: None,
        });
        assert!(prompt.contains("node 4:7"));
        assert!(prompt.contains("Client languages: typescript"));
        assert!(prompt.contains("Client frameworks: unknown"));
    }
}
