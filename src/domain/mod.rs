// ============================================================================
// Domain Models Module
// Contains all core domain entities and value objects
// ============================================================================

pub mod command;
pub mod config;
pub mod order;
pub mod order_book;

pub use command::{Command, CommandKind};
pub use config::EngineConfig;
pub use order::{Order, OrderId, Price, Quantity, SessionId, Side, Timestamp};
pub use order_book::{BookSnapshot, OrderBookSide};
