// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod clock;
mod connection;
mod event_handler;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use connection::{ChannelConnection, Connection, ConnectionError};
pub use event_handler::{
    EventFormat, EventHandler, LoggingEventHandler, NoOpEventHandler, OrderEvent,
    RecordingEventHandler, WriterEventHandler,
};
