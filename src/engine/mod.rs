// ============================================================================
// Engine Module
// Per-instrument matching, the book registry and the connection harness
// ============================================================================

mod dispatcher;
mod instrument_book;
mod matching_engine;
mod registry;

pub mod factory;

pub use dispatcher::CommandDispatcher;
pub use factory::{create_from_config, MatchingEngineBuilder};
pub use instrument_book::{EventBatch, InstrumentBook};
pub use matching_engine::{MatchingEngine, SessionHandle};
pub use registry::BookRegistry;
