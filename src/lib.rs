// ============================================================================
// Venue Engine Library
// Multi-instrument limit order matching core with a thread-per-connection
// front end
// ============================================================================

//! # Venue Engine
//!
//! A concurrent matching core for a trading venue.
//!
//! ## Features
//!
//! - **Price-time priority** limit order matching, one book per instrument
//! - **Per-book locking**: instruments match in parallel, commands on one
//!   instrument are serialized
//! - **Owner-checked cancels** keyed by the submitting session
//! - **Thread-per-connection harness** with an optional session cap
//! - **Pluggable event sinks and clocks** for output and deterministic tests
//!
//! ## Example
//!
//! ```rust
//! use venue_engine::prelude::*;
//! use std::sync::Arc;
//!
//! let events = Arc::new(RecordingEventHandler::new());
//! let engine = MatchingEngineBuilder::new()
//!     .with_clock(Arc::new(ManualClock::default()))
//!     .with_event_handler(events.clone())
//!     .build()
//!     .unwrap();
//!
//! let session = engine.dispatcher();
//! session.dispatch(&Command::buy(1, "BTC-USD", 50_000, 10));
//! session.dispatch(&Command::sell(2, "BTC-USD", 49_900, 4));
//!
//! let snapshot = engine.snapshot("BTC-USD").unwrap();
//! assert_eq!(snapshot.best_bid(), Some(50_000));
//! assert_eq!(snapshot.total_bid_quantity(), 6);
//! assert_eq!(events.len(), 2);
//! ```

pub mod domain;
pub mod engine;
pub mod error;
pub mod interfaces;
pub mod protocol;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        BookSnapshot, Command, CommandKind, EngineConfig, Order, OrderId, Price, Quantity,
        SessionId, Side, Timestamp,
    };
    pub use crate::engine::{
        create_from_config, BookRegistry, CommandDispatcher, EventBatch, InstrumentBook,
        MatchingEngine, MatchingEngineBuilder, SessionHandle,
    };
    pub use crate::error::{ConfigError, EngineError, EngineResult};
    pub use crate::interfaces::{
        ChannelConnection, Clock, Connection, ConnectionError, EventFormat, EventHandler,
        LoggingEventHandler, ManualClock, MonotonicClock, NoOpEventHandler, OrderEvent,
        RecordingEventHandler, WriterEventHandler,
    };
    pub use crate::protocol::{format_command, parse_command, LineConnection, ParseError};
}

#[cfg(test)]
mod integration_tests {
    use super::prelude::*;
    use crossbeam::channel;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn deterministic_engine() -> (MatchingEngine, Arc<RecordingEventHandler>) {
        let events = Arc::new(RecordingEventHandler::new());
        let engine = MatchingEngineBuilder::new()
            .with_clock(Arc::new(ManualClock::new(1, 1)))
            .with_event_handler(events.clone())
            .build()
            .unwrap();
        (engine, events)
    }

    #[test]
    fn test_end_to_end_session_walkthrough() {
        let (engine, events) = deterministic_engine();
        let session = engine.dispatcher();

        session.dispatch(&Command::buy(1, "X", 100, 10));
        session.dispatch(&Command::sell(2, "X", 90, 4));

        let resting = engine.registry().book("X").unwrap().order(OrderId(1)).unwrap();
        assert_eq!(resting.count(), 6);
        assert_eq!(resting.execution_id(), 2);

        session.dispatch(&Command::cancel(1));
        session.dispatch(&Command::sell(5, "X", 100, 3));
        session.dispatch(&Command::cancel(999));
        session.dispatch(&Command::buy(3, "X", 50, 5));
        session.dispatch(&Command::sell(4, "X", 60, 5));

        assert_eq!(
            events.events(),
            vec![
                OrderEvent::OrderAdded {
                    order_id: OrderId(1),
                    instrument: Arc::from("X"),
                    price: 100,
                    count: 10,
                    is_sell: false,
                    timestamp: 1,
                },
                OrderEvent::OrderExecuted {
                    resting_order_id: OrderId(1),
                    incoming_order_id: OrderId(2),
                    execution_id: 1,
                    price: 100,
                    count: 4,
                    timestamp: 2,
                },
                OrderEvent::OrderDeleted {
                    order_id: OrderId(1),
                    accepted: true,
                    timestamp: 4,
                },
                OrderEvent::OrderAdded {
                    order_id: OrderId(5),
                    instrument: Arc::from("X"),
                    price: 100,
                    count: 3,
                    is_sell: true,
                    timestamp: 5,
                },
                OrderEvent::OrderDeleted {
                    order_id: OrderId(999),
                    accepted: false,
                    timestamp: 6,
                },
                OrderEvent::OrderAdded {
                    order_id: OrderId(3),
                    instrument: Arc::from("X"),
                    price: 50,
                    count: 5,
                    is_sell: false,
                    timestamp: 7,
                },
                OrderEvent::OrderAdded {
                    order_id: OrderId(4),
                    instrument: Arc::from("X"),
                    price: 60,
                    count: 5,
                    is_sell: true,
                    timestamp: 8,
                },
            ]
        );

        let snapshot = engine.snapshot("X").unwrap();
        assert_eq!(snapshot.bids, vec![(50, 5)]);
        assert_eq!(snapshot.asks, vec![(60, 5), (100, 3)]);
        assert_eq!(snapshot.spread(), Some(10));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let (engine, events) = deterministic_engine();
        let session = engine.dispatcher();

        session.dispatch(&Command::sell(1, "X", 100, 5));
        for _ in 0..3 {
            session.dispatch(&Command::cancel(1));
        }

        let verdicts: Vec<bool> = events
            .events()
            .iter()
            .filter_map(|e| match e {
                OrderEvent::OrderDeleted { accepted, .. } => Some(*accepted),
                _ => None,
            })
            .collect();
        assert_eq!(verdicts, vec![true, false, false]);
        assert!(engine.snapshot("X").unwrap().is_empty());
    }

    #[test]
    fn test_line_protocol_round_trip_through_threads() {
        let output = Arc::new(WriterEventHandler::new(Vec::new()));
        let engine = MatchingEngineBuilder::new()
            .with_clock(Arc::new(ManualClock::new(1, 1)))
            .with_event_handler(output.clone())
            .build()
            .unwrap();

        let input = "B 1 X 100 10\n\nS 2 X 90 4\nbogus line\nC 1\nC 999\n";
        let handle = engine.accept(LineConnection::new(Cursor::new(input))).unwrap();
        assert_eq!(handle.join().unwrap(), 4);

        drop(engine);
        let written = Arc::try_unwrap(output).ok().unwrap().into_inner();
        assert_eq!(
            String::from_utf8(written).unwrap(),
            "B 1 X 100 10 1\nE 1 2 1 100 4 2\nX 1 A 4\nX 999 R 5\n"
        );
    }

    #[test]
    fn test_cross_session_cancel_is_rejected_across_threads() {
        let (engine, events) = deterministic_engine();
        let (owner_tx, owner_rx) = channel::unbounded();
        let (other_tx, other_rx) = channel::unbounded();

        owner_tx.send(Command::buy(1, "X", 100, 10)).unwrap();
        drop(owner_tx);
        engine.accept(ChannelConnection::new(owner_rx)).unwrap().join().unwrap();

        other_tx.send(Command::cancel(1)).unwrap();
        drop(other_tx);
        engine.accept(ChannelConnection::new(other_rx)).unwrap().join().unwrap();

        assert!(events.events().iter().any(|e| matches!(
            e,
            OrderEvent::OrderDeleted {
                order_id: OrderId(1),
                accepted: false,
                ..
            }
        )));
        assert_eq!(engine.snapshot("X").unwrap().total_bid_quantity(), 10);
    }

    #[test]
    fn test_concurrent_traders_conserve_quantity() {
        let engine = Arc::new(
            MatchingEngineBuilder::new()
                .with_event_handler(Arc::new(RecordingEventHandler::new()))
                .build()
                .unwrap(),
        );

        // Four buyers and four sellers hammer one instrument at a single price.
        let handles: Vec<_> = (0..8u32)
            .map(|t| {
                let (tx, rx) = channel::unbounded();
                for i in 0..250 {
                    let id = t * 1000 + i + 1;
                    let command = if t % 2 == 0 {
                        Command::buy(id, "X", 100, 2)
                    } else {
                        Command::sell(id, "X", 100, 2)
                    };
                    tx.send(command).unwrap();
                }
                engine.accept(ChannelConnection::new(rx)).unwrap()
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // Equal buy and sell volume at one price must fully cross.
        let snapshot = engine.snapshot("X").unwrap();
        assert!(snapshot.is_empty(), "left over: {:?}", snapshot);
    }

    /// Parks the emitting thread on the first event for `held` until released
    struct GateHandler {
        held: &'static str,
        entered: channel::Sender<()>,
        release: channel::Receiver<()>,
    }

    impl EventHandler for GateHandler {
        fn on_event(&self, event: &OrderEvent) {
            if let OrderEvent::OrderAdded { instrument, .. } = event {
                if &**instrument == self.held {
                    let _ = self.entered.send(());
                    let _ = self.release.recv();
                }
            }
        }
    }

    #[test]
    fn test_busy_book_does_not_stall_other_instruments() {
        let (entered_tx, entered_rx) = channel::bounded(1);
        let (release_tx, release_rx) = channel::bounded(1);
        let engine = MatchingEngineBuilder::new()
            .with_event_handler(Arc::new(GateHandler {
                held: "A",
                entered: entered_tx,
                release: release_rx,
            }))
            .build()
            .unwrap();

        // Session on A stops inside its match call with A's lock held.
        let (a_tx, a_rx) = channel::unbounded();
        a_tx.send(Command::buy(1, "A", 100, 1)).unwrap();
        drop(a_tx);
        let busy = engine.accept(ChannelConnection::new(a_rx)).unwrap();
        entered_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("session on A never reached its book");

        let (b_tx, b_rx) = channel::unbounded();
        b_tx.send(Command::sell(2, "B", 100, 3)).unwrap();
        b_tx.send(Command::buy(3, "B", 100, 1)).unwrap();
        drop(b_tx);
        let other = engine.accept(ChannelConnection::new(b_rx)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !other.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(other.is_finished(), "session on B blocked behind A");
        assert!(!busy.is_finished());
        assert_eq!(other.join().unwrap(), 2);
        assert_eq!(engine.snapshot("B").unwrap().asks, vec![(100, 2)]);

        release_tx.send(()).unwrap();
        assert_eq!(busy.join().unwrap(), 1);
        assert_eq!(engine.snapshot("A").unwrap().bids, vec![(100, 1)]);
    }
}
