// ============================================================================
// Engine Configuration
// ============================================================================

use crate::error::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_THREAD_PREFIX: &str = "venue-conn";
pub const DEFAULT_BOOK_CAPACITY: usize = 64;

/// Configuration for the connection harness and newly created books
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Upper bound on concurrently open sessions.
    /// None means unlimited (one thread per connection, no cap)
    pub max_connections: Option<usize>,

    /// Name prefix for connection threads; the session number is appended
    pub thread_name_prefix: String,

    /// Initial capacity of each side's heap and of the id table in a new book
    pub book_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_connections: None,
            thread_name_prefix: DEFAULT_THREAD_PREFIX.to_string(),
            book_capacity: DEFAULT_BOOK_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: Cap the number of open sessions
    pub fn with_max_connections(mut self, limit: usize) -> Self {
        self.max_connections = Some(limit);
        self
    }

    /// Builder method: Set the connection thread name prefix
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Builder method: Set the initial per-book capacity
    pub fn with_book_capacity(mut self, capacity: usize) -> Self {
        self.book_capacity = capacity;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == Some(0) {
            return Err(ConfigError::ZeroConnectionLimit);
        }

        if self.thread_name_prefix.is_empty() {
            return Err(ConfigError::EmptyThreadPrefix);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_connections, None);
        assert_eq!(config.thread_name_prefix, DEFAULT_THREAD_PREFIX);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::new()
            .with_max_connections(8)
            .with_thread_name_prefix("sim")
            .with_book_capacity(1024);

        assert_eq!(config.max_connections, Some(8));
        assert_eq!(config.thread_name_prefix, "sim");
        assert_eq!(config.book_capacity, 1024);
    }

    #[test]
    fn test_validation() {
        let zero = EngineConfig::new().with_max_connections(0);
        assert_eq!(zero.validate(), Err(ConfigError::ZeroConnectionLimit));

        let unnamed = EngineConfig::new().with_thread_name_prefix("");
        assert_eq!(unnamed.validate(), Err(ConfigError::EmptyThreadPrefix));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"max_connections": 3}"#).unwrap();
        assert_eq!(config.max_connections, Some(3));
        assert_eq!(config.book_capacity, DEFAULT_BOOK_CAPACITY);
    }
}
