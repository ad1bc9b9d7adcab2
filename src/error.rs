//! Error types for the server.
//!
//! Upstream and tool errors never carry the caller's API key: messages are
//! built from status codes and response bodies only.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Errors raised while building the Figma HTTP client.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid API base URL `{url}`: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("cannot build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Terminal outcome of an upstream call after the retry policy gave up
/// or decided not to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("Figma API rate limit exhausted after {attempts} attempts (status {status}{})", retry_hint(.retry_after))]
    RateLimitExhausted {
        attempts: u32,
        status: u16,
        retry_after: Option<Duration>,
    },

    #[error("Figma API server error after {attempts} attempts (status {status}): {message}")]
    ServerErrorExhausted {
        attempts: u32,
        status: u16,
        message: String,
    },

    #[error("Figma API rejected the request (status {status}): {message}")]
    ClientError { status: u16, message: String },

    #[error("Figma API unreachable: {message}")]
    Transport { message: String },
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {}s", d.as_secs()),
        None => String::new(),
    }
}

/// Failure of a single tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    InvalidParams(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("{0}")]
    NotFound(String),

    #[error("Tool call timed out after {0} seconds")]
    Timeout(u64),

    #[error("{0}")]
    Internal(String),
}

impl ToolError {
    /// Map to the corresponding JSON-RPC 2.0 error code.
    ///
    /// Input validation failures → -32602 (Invalid params)
    /// Everything else          → -32603 (Internal error)
    pub fn json_rpc_code(&self) -> i32 {
        match self {
            Self::InvalidParams(_) => -32602,
            Self::Upstream(_) | Self::NotFound(_) | Self::Timeout(_) | Self::Internal(_) => -32603,
        }
    }
}

/// Errors raised while assembling the tool registry at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tool `{0}` is registered twice")]
    DuplicateTool(String),

    #[error("tool `{name}` has an invalid input schema: {reason}")]
    InvalidSchema { name: String, reason: String },
}
