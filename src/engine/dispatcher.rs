// ============================================================================
// Command Dispatcher
// Per-connection control flow: routes decoded commands to books
// ============================================================================

use crate::domain::{Command, OrderId, SessionId, Side};
use crate::engine::{BookRegistry, EventBatch};
use crate::interfaces::{Connection, OrderEvent};
use std::sync::Arc;

/// Drives one client session against the shared registry
pub struct CommandDispatcher {
    registry: Arc<BookRegistry>,
    session: SessionId,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<BookRegistry>, session: SessionId) -> Self {
        Self { registry, session }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Process commands until the stream ends or the transport fails.
    ///
    /// Returns the number of commands dispatched.
    pub fn run<C: Connection + ?Sized>(&self, connection: &mut C) -> u64 {
        let mut processed = 0;
        loop {
            match connection.read_next_command() {
                Ok(Some(command)) => {
                    self.dispatch(&command);
                    processed += 1;
                },
                Ok(None) => {
                    tracing::debug!(session = %self.session, processed, "connection closed");
                    return processed;
                },
                Err(e) if e.is_terminal() => {
                    tracing::error!(session = %self.session, error = %e, "error reading input");
                    return processed;
                },
                Err(e) => {
                    tracing::warn!(session = %self.session, error = %e, "skipping command");
                },
            }
        }
    }

    /// Route a single command; returns the events it produced
    pub fn dispatch(&self, command: &Command) -> EventBatch {
        tracing::debug!(session = %self.session, ?command, "dispatching");

        match command.kind.side() {
            Some(side) => self.submit(side, command),
            None => self.cancel(command.order_id),
        }
    }

    fn submit(&self, side: Side, command: &Command) -> EventBatch {
        let book = self
            .registry
            .resolve_or_create(&command.instrument, command.order_id, true);

        book.match_order(
            side,
            command.price,
            command.count,
            command.order_id,
            self.session,
        )
    }

    fn cancel(&self, order_id: OrderId) -> EventBatch {
        let clock = self.registry.clock();

        let Some(instrument) = self.registry.lookup_instrument(order_id) else {
            let event = OrderEvent::OrderDeleted {
                order_id,
                accepted: false,
                timestamp: clock.now(),
            };
            self.registry.event_handler().on_event(&event);
            return EventBatch::from_elem(event, 1);
        };

        let request_time = clock.now();
        let book = self.registry.resolve_or_create(&instrument, order_id, false);
        EventBatch::from_elem(book.cancel_order(order_id, self.session, request_time), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::{ConnectionError, ManualClock, RecordingEventHandler};
    use crate::protocol::LineConnection;
    use std::io::{self, BufRead, Cursor, Read};

    fn setup() -> (Arc<BookRegistry>, Arc<RecordingEventHandler>) {
        let events = Arc::new(RecordingEventHandler::new());
        let registry = Arc::new(BookRegistry::new(
            Arc::new(ManualClock::new(1, 1)),
            events.clone(),
        ));
        (registry, events)
    }

    fn deleted(events: &[OrderEvent]) -> Vec<(u32, bool)> {
        events
            .iter()
            .filter_map(|e| match e {
                OrderEvent::OrderDeleted {
                    order_id, accepted, ..
                } => Some((order_id.0, *accepted)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_cancel_unknown_id_touches_no_book() {
        let (registry, events) = setup();
        let dispatcher = CommandDispatcher::new(registry.clone(), SessionId(1));

        let batch = dispatcher.dispatch(&Command::cancel(999));
        assert_eq!(deleted(&batch), vec![(999, false)]);
        assert_eq!(deleted(&events.events()), vec![(999, false)]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_only_owning_session_may_cancel() {
        let (registry, events) = setup();
        let alice = CommandDispatcher::new(registry.clone(), SessionId(1));
        let bob = CommandDispatcher::new(registry.clone(), SessionId(2));

        alice.dispatch(&Command::buy(1, "X", 100, 10));
        bob.dispatch(&Command::cancel(1));
        alice.dispatch(&Command::cancel(1));
        alice.dispatch(&Command::cancel(1));

        assert_eq!(
            deleted(&events.events()),
            vec![(1, false), (1, true), (1, false)]
        );
    }

    #[test]
    fn test_cancel_after_full_fill_is_rejected() {
        let (registry, _) = setup();
        let alice = CommandDispatcher::new(registry.clone(), SessionId(1));

        alice.dispatch(&Command::sell(1, "X", 100, 5));
        alice.dispatch(&Command::buy(2, "X", 100, 5));

        // Order 2 never rested, order 1 is gone.
        assert_eq!(deleted(&alice.dispatch(&Command::cancel(2))), vec![(2, false)]);
        assert_eq!(deleted(&alice.dispatch(&Command::cancel(1))), vec![(1, false)]);
    }

    #[test]
    fn test_run_skips_malformed_lines() {
        let (registry, events) = setup();
        let dispatcher = CommandDispatcher::new(registry.clone(), SessionId(1));
        let mut conn = LineConnection::new(Cursor::new("B 1 X 100 10\nZ 9\nS 2 X 100 4\n"));

        assert_eq!(dispatcher.run(&mut conn), 2);
        assert_eq!(events.len(), 2);
        assert_eq!(registry.book("X").unwrap().order(OrderId(1)).unwrap().count(), 6);
    }

    #[test]
    fn test_run_continues_past_invalid_utf8() {
        let (registry, events) = setup();
        let dispatcher = CommandDispatcher::new(registry.clone(), SessionId(1));
        let input: &[u8] = b"B 1 X 100 10\nB 2 \xff 100 1\nB 3 X 90 5\n";
        let mut conn = LineConnection::new(Cursor::new(input));

        assert_eq!(dispatcher.run(&mut conn), 2);
        assert_eq!(events.len(), 2);
        assert!(registry.book("X").unwrap().order(OrderId(3)).is_some());
    }

    /// Yields one good line, then fails
    struct FailingReader {
        inner: Cursor<&'static str>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl BufRead for FailingReader {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            if self.inner.position() as usize >= self.inner.get_ref().len() {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.inner.fill_buf()
        }

        fn consume(&mut self, amt: usize) {
            self.inner.consume(amt)
        }
    }

    #[test]
    fn test_run_stops_on_transport_error() {
        let (registry, events) = setup();
        let dispatcher = CommandDispatcher::new(registry, SessionId(1));
        let mut conn = LineConnection::new(FailingReader {
            inner: Cursor::new("B 1 X 100 10\n"),
        });

        assert_eq!(dispatcher.run(&mut conn), 1);
        assert_eq!(events.len(), 1);

        let err = LineConnection::new(FailingReader {
            inner: Cursor::new(""),
        })
        .read_next_command()
        .unwrap_err();
        assert!(matches!(err, ConnectionError::Io(_)));
    }
}
