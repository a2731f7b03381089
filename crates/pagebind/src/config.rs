//! Page configuration: default strategy, timeouts and caching.
//!
//! Built in code with the `with_*` setters or loaded from YAML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::locator::{Strategy, DEFAULT_STRATEGY};
use crate::result::PageResult;

/// Default element timeout (10 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval for waits (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Configuration shared by a page context and the pages it transitions to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Strategy used when neither the field nor its container names one
    pub default_strategy: Strategy,
    /// Global element timeout in milliseconds (0 = fetch without waiting)
    pub timeout_ms: u64,
    /// Polling interval of the wait primitive in milliseconds
    pub poll_interval_ms: u64,
    /// Whether resolved elements are memoized
    pub cache_enabled: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            default_strategy: DEFAULT_STRATEGY,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            cache_enabled: true,
        }
    }
}

impl PageConfig {
    /// Create a config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global default strategy
    #[must_use]
    pub const fn with_default_strategy(mut self, strategy: Strategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    /// Set the global timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Enable or disable element caching
    #[must_use]
    pub const fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Global timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Parse from YAML; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> PageResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> PageResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PageConfig::default();
        assert_eq!(config.default_strategy, Strategy::Id);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert!(config.cache_enabled);
    }

    #[test]
    fn test_builder_setters() {
        let config = PageConfig::new()
            .with_default_strategy(Strategy::Css)
            .with_timeout(0)
            .with_poll_interval(5)
            .with_cache(false);
        assert_eq!(config.default_strategy, Strategy::Css);
        assert_eq!(config.timeout_ms, 0);
        assert_eq!(config.poll_interval_ms, 5);
        assert!(!config.cache_enabled);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = PageConfig::from_yaml_str("default_strategy: css\ntimeout_ms: 250\n").unwrap();
        assert_eq!(config.default_strategy, Strategy::Css);
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert!(config.cache_enabled);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = PageConfig::from_yaml_str("default_strategy: telepathy\n").unwrap_err();
        assert!(matches!(err, crate::result::PageError::Config(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache_enabled: false\npoll_interval_ms: 10").unwrap();
        let config = PageConfig::from_yaml_file(file.path()).unwrap();
        assert!(!config.cache_enabled);
        assert_eq!(config.poll_interval_ms, 10);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PageConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, crate::result::PageError::Io(_)));
    }
}
