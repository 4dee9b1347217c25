// ============================================================================
// Order Book Domain Model
// Price/time priority heaps with lazy deletion
// ============================================================================

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use std::sync::Arc;

use super::order::{Order, Price, Side};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Heap Entry
// ============================================================================

/// Heap entry ordering resting orders by price/time priority.
///
/// `BinaryHeap` is a max-heap, so "greater" means "matches first": the better
/// price for the entry's side, then the earlier timestamp, then the lower
/// arrival sequence. Both entries compared always share a side.
#[derive(Debug, Clone)]
struct Ranked(Arc<Order>);

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (&self.0, &other.0);
        let by_price = match a.side {
            Side::Buy => a.price.cmp(&b.price),
            Side::Sell => b.price.cmp(&a.price),
        };
        by_price
            .then_with(|| b.timestamp.cmp(&a.timestamp))
            .then_with(|| b.sequence.cmp(&a.sequence))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

// ============================================================================
// Order Book Side
// ============================================================================

/// One side (bids or asks) of an instrument's book.
///
/// Filled and cancelled orders stay in the heap with a zero count until they
/// surface at the head, where [`best_live`](Self::best_live) discards them.
/// The purge cost is amortized over later peeks.
#[derive(Debug)]
pub struct OrderBookSide {
    pub side: Side,
    heap: BinaryHeap<Ranked>,
}

impl OrderBookSide {
    pub fn new(side: Side) -> Self {
        Self::with_capacity(side, 0)
    }

    pub fn with_capacity(side: Side, capacity: usize) -> Self {
        Self {
            side,
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, order: Arc<Order>) {
        debug_assert_eq!(order.side, self.side);
        self.heap.push(Ranked(order));
    }

    /// Best live order, popping dead entries off the head on the way.
    ///
    /// Every discarded order is handed to `on_purge` so the caller can drop
    /// its other references.
    pub fn best_live(&mut self, mut on_purge: impl FnMut(Arc<Order>)) -> Option<Arc<Order>> {
        loop {
            let head = self.heap.peek()?;
            if head.0.is_live() {
                return Some(Arc::clone(&head.0));
            }
            if let Some(Ranked(dead)) = self.heap.pop() {
                tracing::trace!(order_id = %dead.id, "purging dead order from book head");
                on_purge(dead);
            }
        }
    }

    /// Remove the head entry.
    pub fn pop(&mut self) -> Option<Arc<Order>> {
        self.heap.pop().map(|Ranked(order)| order)
    }

    /// Number of entries, dead ones included.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Aggregated live quantity per price, best price first.
    /// Levels are summed as `u64`; several orders at one price can exceed
    /// a single order's `u32` count.
    pub fn get_depth(&self) -> Vec<(Price, u64)> {
        let mut levels: BTreeMap<Price, u64> = BTreeMap::new();
        for Ranked(order) in self.heap.iter() {
            let count = order.count();
            if count > 0 {
                *levels.entry(order.price).or_insert(0) += u64::from(count);
            }
        }

        match self.side {
            Side::Buy => levels.into_iter().rev().collect(),
            Side::Sell => levels.into_iter().collect(),
        }
    }
}

// ============================================================================
// Order Book Snapshot
// ============================================================================

/// Immutable snapshot of one instrument's live resting liquidity
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BookSnapshot {
    pub instrument: String,
    /// Bid levels (price, quantity), highest first
    pub bids: Vec<(Price, u64)>,
    /// Ask levels (price, quantity), lowest first
    pub asks: Vec<(Price, u64)>,
}

impl BookSnapshot {
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().map(|(price, _)| *price)
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().map(|(price, _)| *price)
    }

    /// Ask minus bid; `None` when either side is empty or the book is crossed.
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => ask.checked_sub(bid),
            _ => None,
        }
    }

    pub fn total_bid_quantity(&self) -> u64 {
        self.bids.iter().map(|(_, qty)| qty).sum()
    }

    pub fn total_ask_quantity(&self) -> u64 {
        self.asks.iter().map(|(_, qty)| qty).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
