// ============================================================================
// Engine Errors
// ============================================================================

use thiserror::Error;

/// Rejected engine configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_connections must be at least 1 when set")]
    ZeroConnectionLimit,

    #[error("thread name prefix cannot be empty")]
    EmptyThreadPrefix,
}

/// Errors raised by the connection harness
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("connection refused: {limit} sessions already open")]
    ConnectionLimit { limit: usize },

    #[error("failed to spawn connection thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
