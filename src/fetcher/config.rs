//! Configuration for the HTTP fetcher

use std::time::Duration;

/// Browser-like user agent; many sites reject obvious bot agents outright.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Configuration for fetching documents
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Hard timeout for a single request
    pub timeout: Duration,

    /// Maximum number of redirects to follow
    pub max_redirects: usize,

    /// User agent to send
    pub user_agent: String,

    /// Value of the `Accept` header
    pub accept: String,

    /// Value of the `Accept-Language` header
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_redirects: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
        }
    }
}

/// Builder for FetchConfig
#[derive(Debug, Default)]
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: FetchConfig::default(),
        }
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum number of redirects to follow
    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.config.max_redirects = max_redirects;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the `Accept-Language` header
    pub fn accept_language(mut self, accept_language: impl Into<String>) -> Self {
        self.config.accept_language = accept_language.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> FetchConfig {
        self.config
    }
}

impl FetchConfig {
    /// Create a new builder
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = FetchConfig::builder()
            .timeout(Duration::from_secs(3))
            .max_redirects(2)
            .user_agent("synopsis-test")
            .build();

        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.max_redirects, 2);
        assert_eq!(config.user_agent, "synopsis-test");
        assert_eq!(config.accept_language, "en-US,en;q=0.5");
    }
}
