//! Configuration types for the requester.

use crate::errors::{GitHubError, GitHubErrorKind};
use std::time::Duration;

/// Default GitHub API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Default GitHub API version (date-based).
pub const DEFAULT_API_VERSION: &str = "2022-11-28";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default User-Agent header.
pub const DEFAULT_USER_AGENT: &str = "github-rest-core/0.1.0";

/// Default page size for paginated endpoints.
pub const DEFAULT_PER_PAGE: u32 = 30;

/// Connection pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum idle connections per host.
    pub max_idle_per_host: usize,
    /// Idle connection timeout.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: 20,
            idle_timeout: Duration::from_secs(90),
        }
    }
}

/// Requester configuration.
///
/// Pacing intervals are `None` by default, which disables the corresponding
/// check entirely; set them to throttle outgoing requests proactively.
#[derive(Debug, Clone)]
pub struct RequesterConfig {
    /// API base URL.
    pub base_url: String,
    /// API version header value.
    pub api_version: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Connect timeout.
    pub connect_timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
    /// Default page size for paginated endpoints.
    pub per_page: u32,
    /// Minimum interval between any two requests.
    pub seconds_between_requests: Option<Duration>,
    /// Minimum interval between any two write requests.
    pub seconds_between_writes: Option<Duration>,
    /// Follow redirects to a different scheme/host/port instead of failing.
    pub allow_cross_redirects: bool,
    /// Connection pool configuration.
    pub pool: PoolConfig,
}

impl Default for RequesterConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            per_page: DEFAULT_PER_PAGE,
            seconds_between_requests: None,
            seconds_between_writes: None,
            allow_cross_redirects: false,
            pool: PoolConfig::default(),
        }
    }
}

impl RequesterConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RequesterConfigBuilder {
        RequesterConfigBuilder::new()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), GitHubError> {
        if self.base_url.is_empty() {
            return Err(GitHubError::new(
                GitHubErrorKind::InvalidBaseUrl,
                "Base URL cannot be empty",
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(GitHubError::new(
                GitHubErrorKind::InvalidBaseUrl,
                "Base URL must start with http:// or https://",
            ));
        }

        if let Err(e) = url::Url::parse(&self.base_url) {
            return Err(GitHubError::new(
                GitHubErrorKind::InvalidBaseUrl,
                format!("Base URL is not a valid URL: {}", e),
            ));
        }

        if self.user_agent.is_empty() {
            return Err(GitHubError::configuration(
                "User-Agent is required by GitHub API",
            ));
        }

        if self.per_page == 0 {
            return Err(GitHubError::configuration("per_page must be at least 1"));
        }

        Ok(())
    }
}

/// Builder for RequesterConfig.
#[derive(Debug, Default)]
pub struct RequesterConfigBuilder {
    base_url: Option<String>,
    api_version: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
    per_page: Option<u32>,
    seconds_between_requests: Option<Duration>,
    seconds_between_writes: Option<Duration>,
    allow_cross_redirects: bool,
    pool: Option<PoolConfig>,
}

impl RequesterConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the API version.
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the default page size (clamped to the API maximum of 100).
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page.min(100));
        self
    }

    /// Sets the minimum interval between any two requests.
    pub fn seconds_between_requests(mut self, interval: Duration) -> Self {
        self.seconds_between_requests = Some(interval);
        self
    }

    /// Sets the minimum interval between any two write requests.
    pub fn seconds_between_writes(mut self, interval: Duration) -> Self {
        self.seconds_between_writes = Some(interval);
        self
    }

    /// Accepts cross-scheme/host/port redirects instead of failing on them.
    pub fn allow_cross_redirects(mut self) -> Self {
        self.allow_cross_redirects = true;
        self
    }

    /// Sets the connection pool configuration.
    pub fn pool(mut self, config: PoolConfig) -> Self {
        self.pool = Some(config);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Result<RequesterConfig, GitHubError> {
        let config = RequesterConfig {
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            connect_timeout: self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            user_agent: self
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            per_page: self.per_page.unwrap_or(DEFAULT_PER_PAGE),
            seconds_between_requests: self.seconds_between_requests,
            seconds_between_writes: self.seconds_between_writes,
            allow_cross_redirects: self.allow_cross_redirects,
            pool: self.pool.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RequesterConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.per_page, DEFAULT_PER_PAGE);
        assert!(config.seconds_between_requests.is_none());
        assert!(config.seconds_between_writes.is_none());
        assert!(!config.allow_cross_redirects);
    }

    #[test]
    fn config_builder() {
        let config = RequesterConfig::builder()
            .base_url("https://github.example.com/api/v3")
            .user_agent("test-client/1.0")
            .timeout(Duration::from_secs(60))
            .seconds_between_requests(Duration::from_secs(1))
            .seconds_between_writes(Duration::from_secs(3))
            .build()
            .unwrap();

        assert_eq!(config.base_url, "https://github.example.com/api/v3");
        assert_eq!(config.user_agent, "test-client/1.0");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.seconds_between_requests, Some(Duration::from_secs(1)));
        assert_eq!(config.seconds_between_writes, Some(Duration::from_secs(3)));
    }

    #[test]
    fn invalid_base_url() {
        let result = RequesterConfig::builder().base_url("invalid-url").build();
        assert!(result.is_err());
    }

    #[test]
    fn per_page_clamped() {
        let config = RequesterConfig::builder().per_page(250).build().unwrap();
        assert_eq!(config.per_page, 100);
    }
}
