//! Configuration for the bibliographic provider and the REST collaborators

use std::time::Duration;

use crate::rate_limit::{NCBI_ANONYMOUS_RATE, NCBI_KEYED_RATE, RateLimiter};
use crate::retry::RetryConfig;

const NCBI_EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const DEFAULT_TOOL: &str = "pubmed-import-rs";
const DEFAULT_BACKEND_URL: &str = "http://localhost:3000/api";

/// Settings for talking to PubMed eUtils
///
/// # Example
///
/// ```
/// use pubmed_import_rs::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_api_key("your_api_key_here")
///     .with_email("researcher@hospital.org");
///
/// assert_eq!(config.effective_rate_limit(), 10.0);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// NCBI API key, raises the rate limit to 10 req/s
    pub api_key: Option<String>,
    /// Explicit requests per second, overrides the key-derived default
    pub rate_limit: Option<f64>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Contact email sent with every request, as NCBI asks
    pub email: Option<String>,
    /// Tool name sent with every request
    pub tool: Option<String>,
    pub user_agent: Option<String>,
    /// Override for the eUtils endpoint (mock servers in tests)
    pub base_url: Option<String>,
    pub retry_config: RetryConfig,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            api_key: None,
            rate_limit: None,
            timeout: Duration::from_secs(30),
            email: None,
            tool: None,
            user_agent: None,
            base_url: None,
            retry_config: RetryConfig::default(),
        }
    }

    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: f64) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_timeout_seconds(self, seconds: u64) -> Self {
        self.with_timeout(Duration::from_secs(seconds))
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_tool<S: Into<String>>(mut self, tool: S) -> Self {
        self.tool = Some(tool.into());
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Requests per second actually applied
    pub fn effective_rate_limit(&self) -> f64 {
        match (self.rate_limit, &self.api_key) {
            (Some(rate), _) => rate,
            (None, Some(_)) => NCBI_KEYED_RATE,
            (None, None) => NCBI_ANONYMOUS_RATE,
        }
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(NCBI_EUTILS_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn effective_user_agent(&self) -> String {
        match &self.user_agent {
            Some(agent) => agent.clone(),
            None => format!("{}/{}", DEFAULT_TOOL, env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn effective_tool(&self) -> &str {
        self.tool.as_deref().unwrap_or(DEFAULT_TOOL)
    }

    /// `api_key`, `email` and `tool` query parameters for eUtils requests
    pub fn build_api_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if let Some(api_key) = &self.api_key {
            params.push(("api_key".to_string(), api_key.clone()));
        }
        if let Some(email) = &self.email {
            params.push(("email".to_string(), email.clone()));
        }
        params.push(("tool".to_string(), self.effective_tool().to_string()));

        params
    }

    pub fn create_rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.effective_rate_limit())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings for the persistence, library and summarization endpoints
///
/// # Example
///
/// ```
/// use pubmed_import_rs::BackendConfig;
///
/// let config = BackendConfig::new("https://ris.example.org/api")
///     .with_auth_token("session-token");
///
/// assert_eq!(config.url("/publications"), "https://ris.example.org/api/publications");
/// ```
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    /// Opaque bearer token issued by the session provider
    pub auth_token: Option<String>,
    pub timeout: Duration,
    /// Summaries can take much longer than CRUD calls
    pub summary_timeout: Duration,
}

impl BackendConfig {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            timeout: Duration::from_secs(30),
            summary_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_auth_token<S: Into<String>>(mut self, token: S) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_summary_timeout(mut self, timeout: Duration) -> Self {
        self.summary_timeout = timeout;
        self
    }

    /// Absolute URL for an endpoint path such as `/library`
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BACKEND_URL)
    }
}
