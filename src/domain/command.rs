// ============================================================================
// Inbound Commands
// ============================================================================

use std::sync::Arc;

use super::order::{OrderId, Price, Quantity, Side};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CommandKind {
    Buy,
    Sell,
    Cancel,
}

impl CommandKind {
    /// Book side for new orders; `None` for cancels.
    pub fn side(&self) -> Option<Side> {
        match self {
            CommandKind::Buy => Some(Side::Buy),
            CommandKind::Sell => Some(Side::Sell),
            CommandKind::Cancel => None,
        }
    }
}

/// A decoded client command.
///
/// `instrument`, `price` and `count` carry no meaning for cancels.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Command {
    pub kind: CommandKind,
    pub order_id: OrderId,
    pub instrument: Arc<str>,
    pub price: Price,
    pub count: Quantity,
}

impl Command {
    pub fn buy(order_id: u32, instrument: &str, price: Price, count: Quantity) -> Self {
        Self::new_order(CommandKind::Buy, order_id, instrument, price, count)
    }

    pub fn sell(order_id: u32, instrument: &str, price: Price, count: Quantity) -> Self {
        Self::new_order(CommandKind::Sell, order_id, instrument, price, count)
    }

    pub fn cancel(order_id: u32) -> Self {
        Self {
            kind: CommandKind::Cancel,
            order_id: OrderId(order_id),
            instrument: Arc::from(""),
            price: 0,
            count: 0,
        }
    }

    fn new_order(
        kind: CommandKind,
        order_id: u32,
        instrument: &str,
        price: Price,
        count: Quantity,
    ) -> Self {
        Self {
            kind,
            order_id: OrderId(order_id),
            instrument: Arc::from(instrument),
            price,
            count,
        }
    }
}
