//! Client configuration.
//!
//! Settings are an explicit value handed to `WebflowClient`; nothing is read
//! from ambient state at request time. `from_env` is a convenience for
//! binaries that keep the token in the environment.

use std::fmt;

use serde::Deserialize;

use crate::error::{ApiError, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.webflow.com";
pub const DEFAULT_ACCEPT_VERSION: &str = "1.0.0";

pub const ENV_API_KEY: &str = "WEBFLOW_API_KEY";
pub const ENV_BASE_URL: &str = "WEBFLOW_BASE_URL";
pub const ENV_ACCEPT_VERSION: &str = "WEBFLOW_ACCEPT_VERSION";
pub const ENV_LOG_RESPONSES: &str = "WEBFLOW_LOG_RESPONSES";

/// Settings for a `WebflowClient`.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Bearer token sent on every request. Must not be empty.
    pub api_token: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the `Accept-Version` header.
    #[serde(default = "default_accept_version")]
    pub accept_version: String,

    /// Log every response body at `debug` level. Off by default.
    #[serde(default)]
    pub log_responses: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_accept_version() -> String {
    DEFAULT_ACCEPT_VERSION.to_string()
}

impl Config {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            base_url: default_base_url(),
            accept_version: default_accept_version(),
            log_responses: false,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_log_responses(mut self, enabled: bool) -> Self {
        self.log_responses = enabled;
        self
    }

    /// Load configuration from `WEBFLOW_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup(ENV_API_KEY)
            .ok_or_else(|| ApiError::Config(format!("{ENV_API_KEY} must be set")))?;

        let config = Self {
            api_token,
            base_url: lookup(ENV_BASE_URL).unwrap_or_else(default_base_url),
            accept_version: lookup(ENV_ACCEPT_VERSION).unwrap_or_else(default_accept_version),
            log_responses: lookup(ENV_LOG_RESPONSES)
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(ApiError::Config("API token is empty".to_string()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ApiError::Config("base URL is empty".to_string()));
        }
        if self.accept_version.trim().is_empty() {
            return Err(ApiError::Config("Accept-Version is empty".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("accept_version", &self.accept_version)
            .field("log_responses", &self.log_responses)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn new_applies_defaults() {
        let config = Config::new("token");
        assert_eq!(config.base_url, "https://api.webflow.com");
        assert_eq!(config.accept_version, "1.0.0");
        assert!(!config.log_responses);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_lookup_requires_token() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ApiError::Config(msg) if msg.contains("WEBFLOW_API_KEY")));
    }

    #[test]
    fn from_lookup_rejects_blank_token() {
        let err = Config::from_lookup(lookup(&[("WEBFLOW_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn from_lookup_reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("WEBFLOW_API_KEY", "abc"),
            ("WEBFLOW_BASE_URL", "http://localhost:3000"),
            ("WEBFLOW_ACCEPT_VERSION", "1.0.1"),
            ("WEBFLOW_LOG_RESPONSES", "TRUE"),
        ]))
        .unwrap();
        assert_eq!(config.api_token, "abc");
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.accept_version, "1.0.1");
        assert!(config.log_responses);
    }

    #[test]
    fn log_responses_stays_off_for_other_values() {
        let config =
            Config::from_lookup(lookup(&[("WEBFLOW_API_KEY", "abc"), ("WEBFLOW_LOG_RESPONSES", "0")]))
                .unwrap();
        assert!(!config.log_responses);
    }

    #[test]
    fn deserialize_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"api_token":"abc"}"#).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.accept_version, DEFAULT_ACCEPT_VERSION);
        assert!(!config.log_responses);
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", Config::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
