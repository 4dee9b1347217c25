// ============================================================================
// Book Registry
// Process-wide directory of instrument books and order ownership
// ============================================================================

use crate::domain::OrderId;
use crate::engine::InstrumentBook;
use crate::interfaces::{Clock, EventHandler};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
struct Directory {
    books: HashMap<Arc<str>, Arc<InstrumentBook>>,
    order_instruments: HashMap<OrderId, Arc<str>>,
}

/// Maps symbols to books and order ids to symbols.
///
/// The registry lock covers the two maps only. It is released before any
/// book is touched, so matching on one instrument never waits on another.
pub struct BookRegistry {
    directory: RwLock<Directory>,
    clock: Arc<dyn Clock>,
    event_handler: Arc<dyn EventHandler>,
    book_capacity: usize,
}

impl BookRegistry {
    pub fn new(clock: Arc<dyn Clock>, event_handler: Arc<dyn EventHandler>) -> Self {
        Self::with_book_capacity(clock, event_handler, 0)
    }

    pub fn with_book_capacity(
        clock: Arc<dyn Clock>,
        event_handler: Arc<dyn EventHandler>,
        book_capacity: usize,
    ) -> Self {
        Self {
            directory: RwLock::new(Directory::default()),
            clock,
            event_handler,
            book_capacity,
        }
    }

    /// Book for `instrument`, created on first use.
    ///
    /// With `record_mapping` set, `order_id` is also associated with the
    /// instrument; an id keeps the first instrument it was submitted for.
    pub fn resolve_or_create(
        &self,
        instrument: &str,
        order_id: OrderId,
        record_mapping: bool,
    ) -> Arc<InstrumentBook> {
        if !record_mapping {
            if let Some(book) = self.directory.read().books.get(instrument) {
                return Arc::clone(book);
            }
        }

        let mut directory = self.directory.write();
        let existing = directory.books.get(instrument).cloned();
        let book = match existing {
            Some(book) => book,
            None => {
                let symbol: Arc<str> = Arc::from(instrument);
                let book = Arc::new(InstrumentBook::with_capacity(
                    Arc::clone(&symbol),
                    Arc::clone(&self.clock),
                    Arc::clone(&self.event_handler),
                    self.book_capacity,
                ));
                directory.books.insert(symbol, Arc::clone(&book));
                tracing::debug!(instrument, "created instrument book");
                book
            },
        };

        if record_mapping {
            let symbol = book.instrument_symbol();
            directory.order_instruments.entry(order_id).or_insert(symbol);
        }

        book
    }

    /// Instrument an order id was submitted for
    pub fn lookup_instrument(&self, order_id: OrderId) -> Option<Arc<str>> {
        self.directory
            .read()
            .order_instruments
            .get(&order_id)
            .cloned()
    }

    /// Existing book for `instrument`, without creating one
    pub fn book(&self, instrument: &str) -> Option<Arc<InstrumentBook>> {
        self.directory.read().books.get(instrument).cloned()
    }

    /// All known instruments, sorted
    pub fn instruments(&self) -> Vec<Arc<str>> {
        let mut symbols: Vec<_> = self.directory.read().books.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    pub fn len(&self) -> usize {
        self.directory.read().books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.read().books.is_empty()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn event_handler(&self) -> &Arc<dyn EventHandler> {
        &self.event_handler
    }
}
