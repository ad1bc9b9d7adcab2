use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client as HttpClient, Url};
use serde_json::Value;
use tracing::debug;

use super::{parse_retry_after, Credential, Outcome, Upstream, UpstreamRequest};
use crate::config::ServerConfig;
use crate::error::ClientBuildError;

/// Header carrying the personal access token.
const TOKEN_HEADER: &str = "X-Figma-Token";

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Figma REST API client.
///
/// Holds no credentials; the token is attached per call.
#[derive(Debug, Clone)]
pub struct FigmaClient {
    http: HttpClient,
    base_url: Url,
}

impl FigmaClient {
    /// Build a client against `base_url` with a per-request timeout.
    pub fn new(base_url: impl AsRef<str>, request_timeout: Duration) -> Result<Self, ClientBuildError> {
        let raw = base_url.as_ref();
        let base_url = Url::parse(raw).map_err(|e| ClientBuildError::BaseUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientBuildError::BaseUrl {
                url: raw.to_string(),
                reason: "expected an http(s) URL".into(),
            });
        }

        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .user_agent(concat!("figma-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, ClientBuildError> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Endpoint URL with every caller-supplied segment percent-encoded.
    fn endpoint(&self, request: &UpstreamRequest) -> Option<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(request.path_segments());
        Some(url)
    }
}

#[async_trait]
impl Upstream for FigmaClient {
    async fn call(&self, request: &UpstreamRequest, credential: &Credential) -> Outcome {
        let Some(url) = self.endpoint(request) else {
            return Outcome::TransportError {
                message: format!("cannot build URL for {}", request.operation()),
            };
        };
        debug!(operation = request.operation(), url = %url.path(), "Calling Figma API");

        let response = match self
            .http
            .get(url)
            .header(TOKEN_HEADER, credential.expose())
            .query(&request.query())
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                let message = if e.is_timeout() {
                    format!("request timed out: {}", e.without_url())
                } else if e.is_connect() {
                    format!("connection failed: {}", e.without_url())
                } else {
                    format!("request failed: {}", e.without_url())
                };
                return Outcome::TransportError { message };
            }
        };

        let status = response.status();
        debug!(operation = request.operation(), status = status.as_u16(), "Figma API responded");

        if status.is_success() {
            return match response.json::<Value>().await {
                Ok(payload) => Outcome::Success(payload),
                Err(e) if e.is_timeout() => Outcome::TransportError {
                    message: format!("response timed out: {}", e.without_url()),
                },
                Err(e) => Outcome::TransportError {
                    message: format!("invalid response body: {}", e.without_url()),
                },
            };
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => format!("error body unreadable: {}", e.without_url()),
        };

        Outcome::from_status(status.as_u16(), retry_after, &body)
    }
}
