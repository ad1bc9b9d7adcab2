//! The closed catalog of tools.
//!
//! Built once at startup and read-only afterwards, so it can be shared
//! between concurrently dispatched requests without locking. Order of
//! registration is the order advertised by `tools/list`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::{RegistryError, ToolError, UpstreamError};
use crate::protocol::ToolResult;
use crate::retry::RetryPolicy;
use crate::schema::ArgumentValidator;
use crate::upstream::{Credential, Upstream, UpstreamRequest};

/// Tool metadata as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// What a handler needs to reach the design API.
#[derive(Clone)]
pub struct ToolContext {
    upstream: Arc<dyn Upstream>,
    retry: RetryPolicy,
}

impl ToolContext {
    pub fn new(upstream: Arc<dyn Upstream>, retry: RetryPolicy) -> Self {
        Self { upstream, retry }
    }

    pub fn from_config(upstream: Arc<dyn Upstream>, config: &ServerConfig) -> Self {
        Self::new(upstream, RetryPolicy::from_config(config))
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// One logical upstream fetch, retried per the policy.
    pub async fn fetch(
        &self,
        request: UpstreamRequest,
        credential: &Credential,
    ) -> Result<Value, UpstreamError> {
        debug!(operation = request.operation(), "Fetching from upstream");
        let upstream = self.upstream.as_ref();
        let request = &request;
        self.retry
            .execute(|| upstream.call(request, credential))
            .await
    }
}

/// A named operation.
///
/// Arguments reaching `call` have already passed the definition's
/// `inputSchema`; handlers still deserialize them into typed structs.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn call(&self, args: &Value, ctx: &ToolContext) -> Result<ToolResult, ToolError>;
}

struct RegisteredTool {
    definition: ToolDefinition,
    validator: ArgumentValidator,
    handler: Box<dyn ToolHandler>,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. Names must be unique and schemas must compile.
    pub fn register(&mut self, handler: Box<dyn ToolHandler>) -> Result<(), RegistryError> {
        let definition = handler.definition();
        if self.index.contains_key(&definition.name) {
            return Err(RegistryError::DuplicateTool(definition.name));
        }

        let validator = ArgumentValidator::compile(&definition.input_schema).map_err(|e| {
            RegistryError::InvalidSchema {
                name: definition.name.clone(),
                reason: e.to_string(),
            }
        })?;

        self.index.insert(definition.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            definition,
            validator,
            handler,
        });
        Ok(())
    }

    pub fn with(mut self, handler: Box<dyn ToolHandler>) -> Result<Self, RegistryError> {
        self.register(handler)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.definition.name.as_str()).collect()
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        self.tools.iter().map(|t| &t.definition).collect()
    }

    /// Validate `args` against the tool's schema, then run its handler.
    ///
    /// Unknown names surface as `InvalidParams`; the dispatcher checks
    /// membership first so it can list valid names.
    pub async fn call(
        &self,
        name: &str,
        args: &Value,
        ctx: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let tool = self
            .index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| ToolError::InvalidParams(format!("Unknown tool: {name}")))?;

        tool.validator
            .check(args)
            .map_err(|detail| ToolError::InvalidParams(format!("Invalid arguments for {name}: {detail}")))?;

        tool.handler.call(args, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::upstream::Outcome;

    struct Echo(&'static str);

    #[async_trait]
    impl ToolHandler for Echo {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.0.to_string(),
                description: "echo".into(),
                input_schema: json!({
                    "type": "object",
                    "required": ["text"],
                    "properties": { "text": { "type": "string" } }
                }),
            }
        }

        async fn call(&self, args: &Value, _ctx: &ToolContext) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::text(args["text"].as_str().unwrap_or_default()))
        }
    }

    struct NeverCalled;

    #[async_trait]
    impl Upstream for NeverCalled {
        async fn call(&self, _request: &UpstreamRequest, _credential: &Credential) -> Outcome {
            panic!("no upstream call expected");
        }
    }

    fn ctx() -> ToolContext {
        ToolContext::new(Arc::new(NeverCalled), RetryPolicy::default())
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = ToolRegistry::new()
            .with(Box::new(Echo("a")))
            .unwrap()
            .with(Box::new(Echo("a")))
            .err()
            .unwrap();
        assert!(matches!(err, RegistryError::DuplicateTool(name) if name == "a"));
    }

    #[test]
    fn order_is_registration_order() {
        let registry = ToolRegistry::new()
            .with(Box::new(Echo("zeta")))
            .unwrap()
            .with(Box::new(Echo("alpha")))
            .unwrap();
        assert_eq!(registry.names(), vec!["zeta", "alpha"]);
    }

    #[tokio::test]
    async fn schema_checked_before_handler() {
        let registry = ToolRegistry::new().with(Box::new(Echo("echo"))).unwrap();

        let err = registry.call("echo", &json!({}), &ctx()).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidParams(ref m) if m.contains("text")));

        let ok = registry.call("echo", &json!({"text": "hi"}), &ctx()).await.unwrap();
        assert_eq!(ok, ToolResult::text("hi"));
    }
}
