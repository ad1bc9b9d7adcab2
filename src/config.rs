use std::time::Duration;

use crate::error::ConfigError;

/// Public Figma REST API.
pub const DEFAULT_API_BASE_URL: &str = "https://api.figma.com/v1";

/// Default timeout for a single HTTP call to Figma (30 seconds).
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default timeout for a whole tool call, retries included (120 seconds).
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 120;

/// Default number of upstream attempts per call (initial + 2 retries).
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default first backoff wait (2 seconds).
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 2000;

const DEFAULT_LOG_FILTER: &str = "info";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub tool_timeout: Duration,
    pub max_attempts: u32,
    pub retry_base_delay: Duration,
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment.
    ///
    /// - `FIGMA_API_BASE_URL` (optional, default `https://api.figma.com/v1`)
    /// - `FIGMA_REQUEST_TIMEOUT_SECS` (optional, default 30): max seconds per HTTP call
    /// - `FIGMA_TOOL_TIMEOUT_SECS` (optional, default 120): max seconds per tool call
    /// - `FIGMA_MAX_ATTEMPTS` (optional, default 3): upstream attempts per call
    /// - `FIGMA_RETRY_BASE_DELAY_MS` (optional, default 2000): first backoff wait
    /// - `FIGMA_MCP_LOG` (optional, default `info`): log filter when `RUST_LOG` is unset
    ///
    /// The Figma API key is not part of the configuration: callers pass it
    /// with every tool call.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = match lookup("FIGMA_API_BASE_URL") {
            Some(url) => {
                let url = url.trim().trim_end_matches('/').to_string();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::Invalid {
                        var: "FIGMA_API_BASE_URL",
                        reason: "must be an http(s) URL".to_string(),
                    });
                }
                url
            }
            None => defaults.api_base_url,
        };

        let request_timeout_secs =
            parse_positive(&lookup, "FIGMA_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let tool_timeout_secs =
            parse_positive(&lookup, "FIGMA_TOOL_TIMEOUT_SECS", DEFAULT_TOOL_TIMEOUT_SECS)?;
        let max_attempts = parse_positive(&lookup, "FIGMA_MAX_ATTEMPTS", u64::from(DEFAULT_MAX_ATTEMPTS))?;
        let max_attempts = u32::try_from(max_attempts).map_err(|_| ConfigError::Invalid {
            var: "FIGMA_MAX_ATTEMPTS",
            reason: "is too large".to_string(),
        })?;

        let retry_base_delay_ms = match lookup("FIGMA_RETRY_BASE_DELAY_MS") {
            Some(val) => val.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: "FIGMA_RETRY_BASE_DELAY_MS",
                reason: "must be a non-negative integer".to_string(),
            })?,
            None => DEFAULT_RETRY_BASE_DELAY_MS,
        };

        let log_filter = lookup("FIGMA_MCP_LOG")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.log_filter);

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
            tool_timeout: Duration::from_secs(tool_timeout_secs),
            max_attempts,
            retry_base_delay: Duration::from_millis(retry_base_delay_ms),
            log_filter,
        })
    }
}

fn parse_positive<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(val) => match val.trim().parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::Invalid {
                var,
                reason: "must be a positive integer".to_string(),
            }),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_base_delay, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn overrides_are_applied() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("FIGMA_API_BASE_URL", "http://127.0.0.1:9000/v1/"),
            ("FIGMA_MAX_ATTEMPTS", "5"),
            ("FIGMA_RETRY_BASE_DELAY_MS", "0"),
            ("FIGMA_TOOL_TIMEOUT_SECS", "10"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "http://127.0.0.1:9000/v1");
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.retry_base_delay, Duration::ZERO);
        assert_eq!(config.tool_timeout, Duration::from_secs(10));
    }

    #[test]
    fn zero_attempts_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[("FIGMA_MAX_ATTEMPTS", "0")])).unwrap_err();
        assert!(err.to_string().contains("FIGMA_MAX_ATTEMPTS"));
    }

    #[test]
    fn non_http_base_url_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[("FIGMA_API_BASE_URL", "ftp://x")])).unwrap_err();
        assert!(err.to_string().contains("FIGMA_API_BASE_URL"));
    }
}
