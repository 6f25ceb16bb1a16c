//! Agent configuration
//!
//! Connection, pagination and retry settings. Every value has a default, can be
//! read from the environment with [`AgentConfig::from_env`], and can be
//! overridden through [`AgentConfigBuilder`].
//!
//! # Environment Variables
//!
//! | Variable | Default |
//! |----------|---------|
//! | `PATIENT_API_BASE_URL` | `http://localhost:8080` |
//! | `PATIENT_API_KEY` | *(none)* |
//! | `PATIENT_API_TIMEOUT_MS` | `10000` |
//! | `PATIENT_API_PAGE_SIZE` | `5` |
//! | `PATIENT_API_MAX_PAGES` | `15` |
//! | `PATIENT_API_PAGE_DELAY_MS` | `500` |
//! | `PATIENT_API_MAX_RETRIES` | `3` |
//! | `PATIENT_API_MAX_RATE_LIMIT_RETRIES` | `8` |

use std::str::FromStr;
use std::time::Duration;

use crate::client::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_PAGE_SIZE: u32 = 5;
pub const DEFAULT_MAX_PAGES: u32 = 15;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 500;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_MAX_RATE_LIMIT_RETRIES: u32 = 8;
pub const DEFAULT_RATE_LIMIT_BACKOFF_MS: u64 = 3_000;
pub const DEFAULT_SERVER_BACKOFF_MS: u64 = 1_000;

/// Remote patient API settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiClientConfig {
    /// Base URL of the patient API, without a trailing slash
    pub base_url: String,

    /// Static credential sent as `x-api-key`
    pub api_key: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Records requested per page
    pub page_size: u32,

    /// Highest page number that will be requested
    pub max_pages: u32,

    /// Pause between successful pages in milliseconds
    pub page_delay_ms: u64,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
        }
    }
}

impl ApiClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    /// Join `path` onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Retry budgets and backoff bases for a single logical request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// General retry budget (server errors, network errors, other statuses)
    pub max_retries: u32,

    /// Consecutive HTTP 429 responses tolerated before giving up
    pub max_rate_limit_retries: u32,

    /// Rate-limit wait is this base times the rate-limit attempt number
    pub rate_limit_backoff_ms: u64,

    /// General wait is this base times the general attempt number
    pub server_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            max_rate_limit_retries: DEFAULT_MAX_RATE_LIMIT_RETRIES,
            rate_limit_backoff_ms: DEFAULT_RATE_LIMIT_BACKOFF_MS,
            server_backoff_ms: DEFAULT_SERVER_BACKOFF_MS,
        }
    }
}

/// Complete agent configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentConfig {
    pub api: ApiClientConfig,
    pub retry: RetryConfig,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl AgentConfig {
    /// Create a new config builder
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::new()
    }

    /// Create config from environment variables.
    ///
    /// Missing or unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self {
            api: ApiClientConfig {
                base_url: env_or("PATIENT_API_BASE_URL", DEFAULT_BASE_URL.to_string()),
                api_key: env_or("PATIENT_API_KEY", String::new()),
                timeout_ms: env_or("PATIENT_API_TIMEOUT_MS", DEFAULT_TIMEOUT_MS),
                page_size: env_or("PATIENT_API_PAGE_SIZE", DEFAULT_PAGE_SIZE),
                max_pages: env_or("PATIENT_API_MAX_PAGES", DEFAULT_MAX_PAGES),
                page_delay_ms: env_or("PATIENT_API_PAGE_DELAY_MS", DEFAULT_PAGE_DELAY_MS),
            },
            retry: RetryConfig {
                max_retries: env_or("PATIENT_API_MAX_RETRIES", DEFAULT_MAX_RETRIES),
                max_rate_limit_retries: env_or(
                    "PATIENT_API_MAX_RATE_LIMIT_RETRIES",
                    DEFAULT_MAX_RATE_LIMIT_RETRIES,
                ),
                ..RetryConfig::default()
            },
        }
    }

    /// Reject settings the fetch loop cannot run with
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ClientError::Configuration("base URL must not be empty".to_string()));
        }
        if self.api.api_key.trim().is_empty() {
            return Err(ClientError::Configuration(
                "API key must not be empty (set PATIENT_API_KEY or --api-key)".to_string(),
            ));
        }
        if self.api.page_size == 0 {
            return Err(ClientError::Configuration("page size must be at least 1".to_string()));
        }
        if self.api.max_pages == 0 {
            return Err(ClientError::Configuration("page ceiling must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Builder for [`AgentConfig`]
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    config: AgentConfig,
}

impl AgentConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api.base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api.api_key = key.into();
        self
    }

    pub fn timeout_ms(mut self, timeout: u64) -> Self {
        self.config.api.timeout_ms = timeout;
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.config.api.page_size = size;
        self
    }

    pub fn max_pages(mut self, pages: u32) -> Self {
        self.config.api.max_pages = pages;
        self
    }

    pub fn page_delay_ms(mut self, delay: u64) -> Self {
        self.config.api.page_delay_ms = delay;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    pub fn max_rate_limit_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_rate_limit_retries = retries;
        self
    }

    pub fn rate_limit_backoff_ms(mut self, backoff: u64) -> Self {
        self.config.retry.rate_limit_backoff_ms = backoff;
        self
    }

    pub fn server_backoff_ms(mut self, backoff: u64) -> Self {
        self.config.retry.server_backoff_ms = backoff;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<AgentConfig, ClientError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl From<AgentConfig> for AgentConfigBuilder {
    fn from(config: AgentConfig) -> Self {
        Self { config }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.api.page_size, 5);
        assert_eq!(config.api.max_pages, 15);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.max_rate_limit_retries, 8);
        assert_eq!(config.retry.rate_limit_backoff_ms, 3000);
        assert_eq!(config.retry.server_backoff_ms, 1000);
    }

    #[test]
    fn test_builder() {
        let config = AgentConfig::builder()
            .base_url("http://api.example:9090/")
            .api_key("secret")
            .timeout_ms(2500)
            .page_size(10)
            .max_pages(3)
            .page_delay_ms(0)
            .max_retries(5)
            .max_rate_limit_retries(2)
            .rate_limit_backoff_ms(10)
            .server_backoff_ms(5)
            .build()
            .unwrap();

        assert_eq!(config.api.endpoint("/patients"), "http://api.example:9090/patients");
        assert_eq!(config.api.timeout(), Duration::from_millis(2500));
        assert_eq!(config.api.page_size, 10);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.max_rate_limit_retries, 2);
    }

    #[test]
    fn test_validation_rejects_missing_key() {
        let err = AgentConfig::builder().build().unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_validation_rejects_zero_page_size() {
        let err = AgentConfig::builder()
            .api_key("secret")
            .page_size(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("page size"));
    }

    #[test]
    fn test_builder_from_existing_config() {
        let base = AgentConfig::builder().api_key("secret").build().unwrap();
        let config = AgentConfigBuilder::from(base).max_pages(2).build().unwrap();
        assert_eq!(config.api.max_pages, 2);
        assert_eq!(config.api.api_key, "secret");
    }
}
