// ============================================================================
// Instrument Book
// Price/time matching and cancellation for a single instrument
// ============================================================================

use crate::domain::{
    BookSnapshot, Order, OrderBookSide, OrderId, Price, Quantity, SessionId, Side, Timestamp,
};
use crate::interfaces::{Clock, EventHandler, OrderEvent};
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// Events produced by one match or cancel call, in emission order
pub type EventBatch = SmallVec<[OrderEvent; 4]>;

/// Everything guarded by the book lock
struct BookState {
    bids: OrderBookSide,
    asks: OrderBookSide,
    /// Id table; mirrors the live entries of both heaps
    orders: HashMap<OrderId, Arc<Order>>,
    next_sequence: u64,
}

/// One instrument's order book.
///
/// A single mutex covers both heaps and the id table for the whole of a match
/// or cancel call, events included, so every instrument sees a total order of
/// operations while different instruments never contend.
pub struct InstrumentBook {
    instrument: Arc<str>,
    state: Mutex<BookState>,
    clock: Arc<dyn Clock>,
    event_handler: Arc<dyn EventHandler>,
}

impl InstrumentBook {
    pub fn new(
        instrument: Arc<str>,
        clock: Arc<dyn Clock>,
        event_handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self::with_capacity(instrument, clock, event_handler, 0)
    }

    pub fn with_capacity(
        instrument: Arc<str>,
        clock: Arc<dyn Clock>,
        event_handler: Arc<dyn EventHandler>,
        capacity: usize,
    ) -> Self {
        Self {
            instrument,
            state: Mutex::new(BookState {
                bids: OrderBookSide::with_capacity(Side::Buy, capacity),
                asks: OrderBookSide::with_capacity(Side::Sell, capacity),
                orders: HashMap::with_capacity(capacity),
                next_sequence: 0,
            }),
            clock,
            event_handler,
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn instrument_symbol(&self) -> Arc<str> {
        Arc::clone(&self.instrument)
    }

    /// Match an incoming limit order, resting whatever is left.
    ///
    /// Emits one `OrderExecuted` per fill, then `OrderAdded` if residual
    /// quantity rests. The events are also returned.
    pub fn match_order(
        &self,
        side: Side,
        price: Price,
        count: Quantity,
        order_id: OrderId,
        owner: SessionId,
    ) -> EventBatch {
        let mut events = EventBatch::new();
        let mut state = self.state.lock();
        let BookState {
            bids,
            asks,
            orders,
            next_sequence,
        } = &mut *state;

        let (opposing, own) = match side {
            Side::Buy => (asks, bids),
            Side::Sell => (bids, asks),
        };

        let mut remaining = count;
        while remaining > 0 {
            let Some(resting) = opposing.best_live(|dead| release(orders, &dead)) else {
                break;
            };

            if !side.crosses(price, resting.price) {
                break;
            }

            let traded = remaining.min(resting.count());
            let filled = if traded == 0 { None } else { resting.fill(traded) };
            let Some(left) = filled else {
                tracing::warn!(
                    instrument = %self.instrument,
                    %order_id,
                    resting_order_id = %resting.id,
                    "zero-size trade computed, abandoning match"
                );
                self.event_handler.on_events(&events);
                return events;
            };
            remaining -= traded;

            events.push(OrderEvent::OrderExecuted {
                resting_order_id: resting.id,
                incoming_order_id: order_id,
                execution_id: resting.execution_id(),
                price: resting.price,
                count: traded,
                timestamp: self.clock.now(),
            });

            if left == 0 {
                opposing.pop();
                release(orders, &resting);
            } else {
                resting.bump_execution_id();
            }
        }

        if remaining > 0 {
            let timestamp = self.clock.now();
            let sequence = *next_sequence;
            *next_sequence += 1;

            let order = Arc::new(Order::new(
                order_id, side, price, remaining, owner, timestamp, sequence,
            ));
            own.push(Arc::clone(&order));
            orders.insert(order_id, order);

            events.push(OrderEvent::OrderAdded {
                order_id,
                instrument: Arc::clone(&self.instrument),
                price,
                count: remaining,
                is_sell: side.is_sell(),
                timestamp,
            });
        }

        self.event_handler.on_events(&events);
        events
    }

    /// Cancel a resting order on behalf of `requester`.
    ///
    /// Succeeds only for a live order that rested no later than
    /// `request_time` and belongs to the requesting session. Always emits
    /// exactly one `OrderDeleted`.
    pub fn cancel(&self, order_id: OrderId, requester: SessionId, request_time: Timestamp) -> bool {
        matches!(
            self.cancel_order(order_id, requester, request_time),
            OrderEvent::OrderDeleted { accepted: true, .. }
        )
    }

    /// Same as [`cancel`](Self::cancel), returning the emitted event
    pub fn cancel_order(
        &self,
        order_id: OrderId,
        requester: SessionId,
        request_time: Timestamp,
    ) -> OrderEvent {
        let state = self.state.lock();

        let accepted = state.orders.get(&order_id).is_some_and(|order| {
            order.is_live()
                && order.timestamp <= request_time
                && order.owner == requester
                && order.kill()
        });

        tracing::debug!(
            instrument = %self.instrument,
            %order_id,
            session = %requester,
            accepted,
            "cancel processed"
        );

        let event = OrderEvent::OrderDeleted {
            order_id,
            accepted,
            timestamp: self.clock.now(),
        };
        self.event_handler.on_event(&event);
        event
    }

    /// Live resting order by id
    pub fn order(&self, order_id: OrderId) -> Option<Arc<Order>> {
        self.state
            .lock()
            .orders
            .get(&order_id)
            .filter(|order| order.is_live())
            .cloned()
    }

    /// Number of live resting orders
    pub fn live_orders(&self) -> usize {
        self.state
            .lock()
            .orders
            .values()
            .filter(|order| order.is_live())
            .count()
    }

    /// Aggregated live depth on both sides
    pub fn snapshot(&self) -> BookSnapshot {
        let state = self.state.lock();
        BookSnapshot {
            instrument: self.instrument.to_string(),
            bids: state.bids.get_depth(),
            asks: state.asks.get_depth(),
        }
    }
}

/// Drop the id-table entry for `order`, unless the id has since been reused
/// by a different resting order.
fn release(orders: &mut HashMap<OrderId, Arc<Order>>, order: &Arc<Order>) {
    if orders
        .get(&order.id)
        .is_some_and(|indexed| Arc::ptr_eq(indexed, order))
    {
        orders.remove(&order.id);
    }
}
