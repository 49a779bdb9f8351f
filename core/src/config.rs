//! Client configuration: API root, identity credentials and transport knobs.
//!
//! # Environment Variables
//! - `GROCERY_API_TOKEN` - secret client token (required)
//! - `GROCERY_API_USER_AGENT` - client identifier sent as `User-Agent` (required)
//! - `GROCERY_API_BASE_URL` - versioned API root (default: `https://kolonial.no/api/v1`)
//! - `GROCERY_API_TIMEOUT_SECS` - per-request timeout (default: transport default)

use std::fmt;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::endpoint::DiagnosticPolicy;
use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "https://kolonial.no/api/v1";

/// Identity sent on every request. Constant for the life of a client.
#[derive(Clone)]
pub struct ApiCredentials {
    pub user_agent: String,
    pub token: SecretString,
}

impl ApiCredentials {
    pub fn new(user_agent: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            token: SecretString::from(token.into()),
        }
    }

    pub(crate) fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("user_agent", &self.user_agent)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root without trailing slash.
    pub base_url: String,
    pub credentials: ApiCredentials,
    /// `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
    /// Diagnostics for `GET /productcategories/{id}/` failures. Silent by
    /// default.
    pub category_diagnostics: DiagnosticPolicy,
}

impl ClientConfig {
    pub fn new(base_url: &str, credentials: ApiCredentials) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            timeout: None,
            category_diagnostics: DiagnosticPolicy::Silent,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_category_diagnostics(mut self, policy: DiagnosticPolicy) -> Self {
        self.category_diagnostics = policy;
        self
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ClientError::Config(format!("missing environment variable: {key}")))
        };

        let token = required("GROCERY_API_TOKEN")?;
        let user_agent = required("GROCERY_API_USER_AGENT")?;
        let base_url = lookup("GROCERY_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        url::Url::parse(&base_url)
            .map_err(|e| ClientError::Config(format!("GROCERY_API_BASE_URL: {e}")))?;

        let mut config = Self::new(&base_url, ApiCredentials::new(user_agent, token));
        if let Some(raw) = lookup("GROCERY_API_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|e| ClientError::Config(format!("GROCERY_API_TIMEOUT_SECS: {e}")))?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::new(
            "http://localhost:3000/",
            ApiCredentials::new("ua", "token"),
        );
        assert_eq!(config.base_url, "http://localhost:3000");
    }

    #[test]
    fn from_lookup_uses_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("GROCERY_API_TOKEN", "t0k3n"),
            ("GROCERY_API_USER_AGENT", "shelf/1.0"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.credentials.user_agent, "shelf/1.0");
        assert_eq!(config.credentials.token(), "t0k3n");
        assert!(config.timeout.is_none());
        assert_eq!(config.category_diagnostics, DiagnosticPolicy::Silent);
    }

    #[test]
    fn from_lookup_reads_timeout_and_base_url() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("GROCERY_API_TOKEN", "t"),
            ("GROCERY_API_USER_AGENT", "ua"),
            ("GROCERY_API_BASE_URL", "http://127.0.0.1:9000/api/v1/"),
            ("GROCERY_API_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:9000/api/v1");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn missing_token_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[("GROCERY_API_USER_AGENT", "ua")])).unwrap_err();
        assert!(matches!(err, ClientError::Config(ref m) if m.contains("GROCERY_API_TOKEN")));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("GROCERY_API_TOKEN", "t"),
            ("GROCERY_API_USER_AGENT", "ua"),
            ("GROCERY_API_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn debug_redacts_token() {
        let creds = ApiCredentials::new("ua", "very-secret");
        let printed = format!("{creds:?}");
        assert!(!printed.contains("very-secret"));
        assert!(printed.contains("[REDACTED]"));
    }
}
