//! Upstream client capability.
//!
//! An [`Upstream`] performs exactly one call to the design API per
//! invocation and classifies what happened into an [`Outcome`]. Whether to
//! call again is decided by [`crate::retry::RetryPolicy`], never here.

pub mod figma;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

pub use figma::FigmaClient;

/// Caller-supplied API token.
///
/// Passed through per call and never stored by the server. `Debug` is
/// redacted so the token cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Image formats accepted by the render endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpg,
    Svg,
    Pdf,
}

impl ImageFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpg),
            "svg" => Some(Self::Svg),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
        }
    }
}

/// One upstream operation with its resolved parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamRequest {
    /// `GET /images/{file_key}`
    RenderImages {
        file_key: String,
        node_ids: Vec<String>,
        format: ImageFormat,
        scale: f64,
    },
    /// `GET /files/{file_key}/nodes`
    FileNodes {
        file_key: String,
        node_ids: Vec<String>,
    },
    /// `GET /files/{file_key}/variables/local`
    LocalVariables { file_key: String },
    /// `GET /me`
    CurrentUser,
}

impl UpstreamRequest {
    /// Short operation name used in logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::RenderImages { .. } => "render_images",
            Self::FileNodes { .. } => "file_nodes",
            Self::LocalVariables { .. } => "local_variables",
            Self::CurrentUser => "current_user",
        }
    }

    /// Path segments relative to the API base URL, unescaped.
    ///
    /// The file key is one segment whatever it contains; the client
    /// percent-encodes it.
    pub fn path_segments(&self) -> Vec<&str> {
        match self {
            Self::RenderImages { file_key, .. } => vec!["images", file_key.as_str()],
            Self::FileNodes { file_key, .. } => vec!["files", file_key.as_str(), "nodes"],
            Self::LocalVariables { file_key } => vec!["files", file_key.as_str(), "variables", "local"],
            Self::CurrentUser => vec!["me"],
        }
    }

    /// Query string pairs.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::RenderImages {
                node_ids,
                format,
                scale,
                ..
            } => vec![
                ("ids", node_ids.join(",")),
                ("format", format.as_str().to_string()),
                ("scale", scale.to_string()),
            ],
            Self::FileNodes { node_ids, .. } => vec![("ids", node_ids.join(","))],
            Self::LocalVariables { .. } | Self::CurrentUser => Vec::new(),
        }
    }
}

/// Classified result of a single upstream call.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// 2xx with a decoded JSON payload.
    Success(Value),
    /// 429, with the parsed `Retry-After` hint when present.
    RateLimited {
        status: u16,
        retry_after: Option<Duration>,
    },
    /// 4xx other than 429.
    ClientError { status: u16, message: String },
    /// 5xx.
    ServerError { status: u16, message: String },
    /// Connection, timeout or body decoding failure.
    TransportError { message: String },
}

impl Outcome {
    /// Classify a non-success HTTP status.
    ///
    /// `retry_after` is only kept for 429 responses.
    pub fn from_status(status: u16, retry_after: Option<Duration>, body: &str) -> Self {
        match status {
            429 => Self::RateLimited {
                status,
                retry_after,
            },
            400..=499 => Self::ClientError {
                status,
                message: error_message(body),
            },
            500..=599 => Self::ServerError {
                status,
                message: error_message(body),
            },
            _ => Self::TransportError {
                message: format!("unexpected HTTP status {status}"),
            },
        }
    }
}

/// Parse a `Retry-After` header value given in whole seconds.
///
/// HTTP-date values and anything else unparseable yield `None`, which
/// makes the retry policy fall back to its exponential schedule.
pub fn parse_retry_after(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_secs)
}

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Reduce an error body to a human-readable message.
///
/// Figma error bodies look like `{"status":403,"err":"Invalid token"}`.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["err", "message", "error"] {
            if let Some(msg) = value.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

/// A single-shot call to the design API.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn call(&self, request: &UpstreamRequest, credential: &Credential) -> Outcome;
}
