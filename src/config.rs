//! Client configuration.

use std::time::Duration;

/// Production API host.
pub const DEFAULT_API_BASE: &str = "https://openapi.aliyundrive.com";

/// Per-request timeout applied by the transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Attempts added on top of the first one for connect/timeout failures.
pub const DEFAULT_RETRIES: u32 = 3;

/// Fixed upload part size (64 MiB).
pub const DEFAULT_PART_SIZE: u64 = 64 * 1024 * 1024;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36 Edg/108.0.1462.54";

/// Settings shared by the transport and the upload orchestrator.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retries: u32,
    pub user_agent: String,
    pub part_size: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            part_size: DEFAULT_PART_SIZE,
        }
    }
}

impl ClientConfig {
    /// Point the client at another host (a mock server in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_part_size(mut self, part_size: u64) -> Self {
        self.part_size = part_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_BASE);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retries, 3);
        assert_eq!(config.part_size, 64 * 1024 * 1024);
    }

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let config = ClientConfig::default().with_base_url("http://127.0.0.1:1234/");
        assert_eq!(config.base_url, "http://127.0.0.1:1234");
    }
}
