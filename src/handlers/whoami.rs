use async_trait::async_trait;
use serde_json::Value;

use super::{api_key_schema, parse_args};
use crate::error::ToolError;
use crate::protocol::{ToolResult, WhoamiArgs};
use crate::registry::{ToolContext, ToolDefinition, ToolHandler};
use crate::upstream::{Credential, UpstreamRequest};

/// The user owning the supplied token.
pub struct Whoami;

#[async_trait]
impl ToolHandler for Whoami {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "whoami".into(),
            description: "Returns information about the user authenticated by the given API key.".into(),
            input_schema: api_key_schema(),
        }
    }

    async fn call(&self, args: &Value, ctx: &ToolContext) -> Result<ToolResult, ToolError> {
        let args: WhoamiArgs = parse_args("whoami", args)?;
        let credential = Credential::new(args.api_key);

        let user = ctx.fetch(UpstreamRequest::CurrentUser, &credential).await?;
        ToolResult::json(&user)
    }
}
