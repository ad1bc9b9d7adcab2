//! Shared fixtures: a scripted in-process upstream and request builders.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use figma_mcp_server::handlers::{figma_tools, ServerContext};
use figma_mcp_server::protocol::{JsonRpcRequest, RpcId};
use figma_mcp_server::registry::ToolContext;
use figma_mcp_server::retry::RetryPolicy;
use figma_mcp_server::upstream::{Credential, Outcome, Upstream, UpstreamRequest};

/// Replays scripted outcomes, then repeats `fallback`. Records every call.
pub struct FakeUpstream {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Outcome,
    requests: Mutex<Vec<UpstreamRequest>>,
    tokens: Mutex<Vec<String>>,
}

impl FakeUpstream {
    pub fn always(outcome: Outcome) -> Arc<Self> {
        Self::scripted(Vec::new(), outcome)
    }

    pub fn scripted(outcomes: Vec<Outcome>, fallback: Outcome) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(outcomes.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn call(&self, request: &UpstreamRequest, credential: &Credential) -> Outcome {
        self.requests.lock().unwrap().push(request.clone());
        self.tokens.lock().unwrap().push(credential.expose().to_string());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

pub fn success(payload: Value) -> Outcome {
    Outcome::Success(payload)
}

pub fn rate_limited() -> Outcome {
    Outcome::RateLimited {
        status: 429,
        retry_after: None,
    }
}

/// Dispatcher context with the full tool catalog and the default retry policy.
pub fn context(upstream: Arc<FakeUpstream>) -> ServerContext {
    context_with(upstream, RetryPolicy::default(), Duration::from_secs(120))
}

pub fn context_with(upstream: Arc<FakeUpstream>, policy: RetryPolicy, tool_timeout: Duration) -> ServerContext {
    let upstream: Arc<dyn Upstream> = upstream;
    ServerContext::new(
        figma_tools().unwrap(),
        ToolContext::new(upstream, policy),
        tool_timeout,
    )
}

pub fn request(id: i64, method: &str, params: Option<Value>) -> JsonRpcRequest {
    JsonRpcRequest {
        jsonrpc: "2.0".into(),
        id: Some(RpcId::from(id)),
        method: method.into(),
        params,
        notification: false,
    }
}

pub fn tool_call(id: i64, tool: &str, arguments: Value) -> JsonRpcRequest {
    request(
        id,
        "tools/call",
        Some(serde_json::json!({ "name": tool, "arguments": arguments })),
    )
}

/// A `GET /files/{key}/nodes` payload holding one node.
pub fn nodes_payload(node_id: &str, document: Value) -> Value {
    serde_json::json!({
        "name": "Design File",
        "nodes": {
            node_id: {
                "document": document,
                "components": {}
            }
        }
    })
}

/// Serialized form of a response, as a client would see it.
pub fn wire(resp: &figma_mcp_server::protocol::JsonRpcResponse) -> Value {
    serde_json::to_value(resp).unwrap()
}
