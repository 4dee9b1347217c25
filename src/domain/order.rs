// ============================================================================
// Order Domain Model
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

/// Client-assigned order identifier, unique across the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderId(pub u32);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for OrderId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Identity of the connection that submitted an order.
///
/// Only the session that created a resting order may cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Limit price in integer ticks.
pub type Price = u32;

/// Quantity in whole units.
pub type Quantity = u32;

/// Nanoseconds read from the engine's monotonic clock.
pub type Timestamp = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn is_sell(&self) -> bool {
        matches!(self, Side::Sell)
    }

    /// Whether an incoming order on this side at `incoming` trades against a
    /// resting order priced at `resting`.
    pub fn crosses(&self, incoming: Price, resting: Price) -> bool {
        match self {
            Side::Buy => incoming >= resting,
            Side::Sell => incoming <= resting,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "B"),
            Side::Sell => write!(f, "S"),
        }
    }
}

// ============================================================================
// Resting Order Entity
// ============================================================================

/// A resting order.
///
/// Shared by an instrument book's priority heap and its id table. The mutable
/// fields are atomics so the record is `Sync`, but every mutation happens
/// while the owning book's lock is held.
#[derive(Debug)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub price: Price,
    pub owner: SessionId,
    /// Clock reading taken when the order started resting.
    pub timestamp: Timestamp,
    /// Arrival sequence within the book; breaks timestamp ties.
    pub sequence: u64,

    count: AtomicU32,
    execution_id: AtomicU32,
}

impl Order {
    pub fn new(
        id: OrderId,
        side: Side,
        price: Price,
        count: Quantity,
        owner: SessionId,
        timestamp: Timestamp,
        sequence: u64,
    ) -> Self {
        Self {
            id,
            side,
            price,
            owner,
            timestamp,
            sequence,
            count: AtomicU32::new(count),
            execution_id: AtomicU32::new(1),
        }
    }

    // ========================================================================
    // Getters
    // ========================================================================

    pub fn count(&self) -> Quantity {
        self.count.load(Ordering::Acquire)
    }

    pub fn execution_id(&self) -> u32 {
        self.execution_id.load(Ordering::Acquire)
    }

    /// A zero count is the tombstone for filled and cancelled orders.
    pub fn is_live(&self) -> bool {
        self.count() > 0
    }

    // ========================================================================
    // Mutations (book lock held)
    // ========================================================================

    /// Take `quantity` off the remaining count.
    ///
    /// Returns the count left afterwards, or `None` if the order does not
    /// hold that much; the count is untouched in that case.
    pub(crate) fn fill(&self, quantity: Quantity) -> Option<Quantity> {
        let current = self.count.load(Ordering::Acquire);
        let remaining = current.checked_sub(quantity)?;
        self.count.store(remaining, Ordering::Release);
        Some(remaining)
    }

    /// Advance the execution id after a partial fill.
    pub(crate) fn bump_execution_id(&self) {
        self.execution_id.fetch_add(1, Ordering::AcqRel);
    }

    /// Mark the order dead. Returns false if it already was.
    pub(crate) fn kill(&self) -> bool {
        self.count.swap(0, Ordering::AcqRel) > 0
    }
}
