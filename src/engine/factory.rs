// ============================================================================
// Engine Factory
// Creates matching engines with validated configuration
// ============================================================================

use crate::domain::EngineConfig;
use crate::engine::MatchingEngine;
use crate::error::EngineResult;
use crate::interfaces::{Clock, EventHandler, MonotonicClock, NoOpEventHandler};
use std::sync::Arc;

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates a matching engine from configuration
///
/// # Example
/// ```
/// use venue_engine::prelude::*;
/// use std::sync::Arc;
///
/// let engine = create_from_config(
///     EngineConfig::default(),
///     Arc::new(MonotonicClock::new()),
///     Arc::new(NoOpEventHandler),
/// )
/// .unwrap();
/// assert_eq!(engine.active_connections(), 0);
/// ```
pub fn create_from_config(
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    event_handler: Arc<dyn EventHandler>,
) -> EngineResult<MatchingEngine> {
    config.validate()?;
    Ok(MatchingEngine::new(config, clock, event_handler))
}

// ============================================================================
// Builder Pattern
// ============================================================================

/// Builder for creating matching engines with fluent API
///
/// # Example
/// ```
/// use venue_engine::prelude::*;
/// use std::sync::Arc;
///
/// let engine = MatchingEngineBuilder::new()
///     .max_connections(16)
///     .thread_name_prefix("gateway")
///     .with_event_handler(Arc::new(LoggingEventHandler))
///     .build()
///     .unwrap();
/// assert_eq!(engine.config().max_connections, Some(16));
/// ```
pub struct MatchingEngineBuilder {
    config: EngineConfig,
    clock: Option<Arc<dyn Clock>>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Default for MatchingEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchingEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            clock: None,
            event_handler: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Timestamp source; defaults to a monotonic clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Event sink; defaults to discarding events
    pub fn with_event_handler(mut self, event_handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(event_handler);
        self
    }

    // ========================================================================
    // Harness Configuration
    // ========================================================================

    pub fn max_connections(mut self, limit: usize) -> Self {
        self.config.max_connections = Some(limit);
        self
    }

    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn book_capacity(mut self, capacity: usize) -> Self {
        self.config.book_capacity = capacity;
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    pub fn build(self) -> EngineResult<MatchingEngine> {
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let event_handler = self
            .event_handler
            .unwrap_or_else(|| Arc::new(NoOpEventHandler));

        create_from_config(self.config, clock, event_handler)
    }

    /// Get the configuration without building (for inspection)
    pub fn get_config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Command, OrderId};
    use crate::error::{ConfigError, EngineError};
    use crate::interfaces::{ManualClock, RecordingEventHandler};

    #[test]
    fn test_builder_defaults() {
        let engine = MatchingEngineBuilder::new().build().unwrap();
        assert_eq!(engine.config(), &EngineConfig::default());
        assert!(engine.registry().is_empty());
    }

    #[test]
    fn test_builder_settings_reach_config() {
        let builder = MatchingEngineBuilder::new()
            .max_connections(3)
            .thread_name_prefix("fix")
            .book_capacity(1024);

        let config = builder.get_config();
        assert_eq!(config.max_connections, Some(3));
        assert_eq!(config.thread_name_prefix, "fix");
        assert_eq!(config.book_capacity, 1024);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = MatchingEngineBuilder::new().max_connections(0).build();
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::ZeroConnectionLimit))
        ));

        let result = create_from_config(
            EngineConfig::default().with_thread_name_prefix(""),
            Arc::new(MonotonicClock::new()),
            Arc::new(NoOpEventHandler),
        );
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::EmptyThreadPrefix))
        ));
    }

    #[test]
    fn test_builder_wires_clock_and_handler() {
        let events = Arc::new(RecordingEventHandler::new());
        let engine = MatchingEngineBuilder::new()
            .with_clock(Arc::new(ManualClock::new(500, 10)))
            .with_event_handler(events.clone())
            .build()
            .unwrap();

        engine.dispatcher().dispatch(&Command::buy(1, "X", 100, 1));

        let recorded = events.events();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].timestamp(), 500);
        assert_eq!(
            engine.registry().lookup_instrument(OrderId(1)).as_deref(),
            Some("X")
        );
    }
}
