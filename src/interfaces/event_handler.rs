// ============================================================================
// Event Handler Interface
// Defines the contract for handling book-mutation events
// ============================================================================

use crate::domain::{OrderId, Price, Quantity, Timestamp};
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Events emitted by the matching core
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum OrderEvent {
    /// Residual quantity of an incoming order now rests in the book
    OrderAdded {
        order_id: OrderId,
        instrument: Arc<str>,
        price: Price,
        count: Quantity,
        is_sell: bool,
        timestamp: Timestamp,
    },

    /// A resting order traded against an incoming one
    OrderExecuted {
        resting_order_id: OrderId,
        incoming_order_id: OrderId,
        execution_id: u32,
        price: Price,
        count: Quantity,
        timestamp: Timestamp,
    },

    /// Outcome of a cancel request
    OrderDeleted {
        order_id: OrderId,
        accepted: bool,
        timestamp: Timestamp,
    },
}

impl OrderEvent {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            OrderEvent::OrderAdded { timestamp, .. }
            | OrderEvent::OrderExecuted { timestamp, .. }
            | OrderEvent::OrderDeleted { timestamp, .. } => *timestamp,
        }
    }
}

/// One-line text rendering used on the output stream.
impl fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderEvent::OrderAdded {
                order_id,
                instrument,
                price,
                count,
                is_sell,
                timestamp,
            } => write!(
                f,
                "{} {} {} {} {} {}",
                if *is_sell { 'S' } else { 'B' },
                order_id,
                instrument,
                price,
                count,
                timestamp
            ),
            OrderEvent::OrderExecuted {
                resting_order_id,
                incoming_order_id,
                execution_id,
                price,
                count,
                timestamp,
            } => write!(
                f,
                "E {} {} {} {} {} {}",
                resting_order_id, incoming_order_id, execution_id, price, count, timestamp
            ),
            OrderEvent::OrderDeleted {
                order_id,
                accepted,
                timestamp,
            } => write!(
                f,
                "X {} {} {}",
                order_id,
                if *accepted { 'A' } else { 'R' },
                timestamp
            ),
        }
    }
}

/// Event handler trait for processing matching core events.
/// Called with the instrument's book lock held, so events for one instrument
/// arrive in the order they happened.
pub trait EventHandler: Send + Sync {
    /// Handle an order event
    fn on_event(&self, event: &OrderEvent);

    /// Batch event handler (optional optimization)
    fn on_events(&self, events: &[OrderEvent]) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op event handler for testing
pub struct NoOpEventHandler;

impl EventHandler for NoOpEventHandler {
    fn on_event(&self, _event: &OrderEvent) {
        // Do nothing
    }
}

/// Logging event handler
pub struct LoggingEventHandler;

impl EventHandler for LoggingEventHandler {
    fn on_event(&self, event: &OrderEvent) {
        tracing::debug!("Matching engine event: {:?}", event);
    }
}

/// Keeps every event in memory, in emission order
#[derive(Default)]
pub struct RecordingEventHandler {
    events: Mutex<Vec<OrderEvent>>,
}

impl RecordingEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<OrderEvent> {
        self.events.lock().clone()
    }

    /// Drain the recorded events
    pub fn take(&self) -> Vec<OrderEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventHandler for RecordingEventHandler {
    fn on_event(&self, event: &OrderEvent) {
        self.events.lock().push(event.clone());
    }

    fn on_events(&self, events: &[OrderEvent]) {
        self.events.lock().extend_from_slice(events);
    }
}

/// Line format used by [`WriterEventHandler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFormat {
    #[default]
    Text,
    #[cfg(feature = "serde")]
    Json,
}

/// Writes one line per event to a shared writer.
///
/// The writer sits behind a mutex so concurrent books never interleave the
/// fields of two events. Write failures are logged and dropped.
pub struct WriterEventHandler<W: Write + Send> {
    writer: Mutex<W>,
    format: EventFormat,
}

impl<W: Write + Send> WriterEventHandler<W> {
    pub fn new(writer: W) -> Self {
        Self::with_format(writer, EventFormat::Text)
    }

    pub fn with_format(writer: W, format: EventFormat) -> Self {
        Self {
            writer: Mutex::new(writer),
            format,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_event(writer: &mut W, format: EventFormat, event: &OrderEvent) -> std::io::Result<()> {
        match format {
            EventFormat::Text => writeln!(writer, "{}", event),
            #[cfg(feature = "serde")]
            EventFormat::Json => {
                serde_json::to_writer(&mut *writer, event)?;
                writer.write_all(b"\n")
            },
        }
    }
}

impl<W: Write + Send> EventHandler for WriterEventHandler<W> {
    fn on_event(&self, event: &OrderEvent) {
        self.on_events(std::slice::from_ref(event));
    }

    fn on_events(&self, events: &[OrderEvent]) {
        let mut writer = self.writer.lock();
        let result = events
            .iter()
            .try_for_each(|event| Self::write_event(&mut writer, self.format, event))
            .and_then(|_| writer.flush());

        if let Err(e) = result {
            tracing::warn!(error = %e, dropped = events.len(), "failed to write events");
        }
    }
}
