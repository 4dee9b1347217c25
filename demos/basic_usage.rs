// ============================================================================
// Basic Usage Example
// ============================================================================

use crossbeam::channel;
use std::sync::Arc;
use venue_engine::prelude::*;

fn main() {
    println!("=== Venue Engine Example ===\n");

    let events = Arc::new(RecordingEventHandler::new());
    let engine = MatchingEngineBuilder::new()
        .with_clock(Arc::new(ManualClock::default()))
        .with_event_handler(events.clone())
        .thread_name_prefix("demo")
        .build()
        .expect("default configuration is valid");

    // Two clients, each served by its own thread
    let (seller_tx, seller_rx) = channel::unbounded();
    let (buyer_tx, buyer_rx) = channel::unbounded();

    println!("Adding sell orders...");
    for i in 0..5u32 {
        seller_tx
            .send(Command::sell(100 + i, "BTC-USD", 50_000 + i * 100, 1))
            .unwrap();
    }
    drop(seller_tx);
    let seller = engine.accept(ChannelConnection::new(seller_rx)).unwrap();
    seller.join().unwrap();

    println!("Adding buy orders...");
    for i in 0..5u32 {
        buyer_tx
            .send(Command::buy(200 + i, "BTC-USD", 49_500 + i * 100, 1))
            .unwrap();
    }
    // Crosses the two cheapest asks
    buyer_tx.send(Command::buy(300, "BTC-USD", 50_100, 2)).unwrap();
    // Not the seller's order to cancel
    buyer_tx.send(Command::cancel(104)).unwrap();
    drop(buyer_tx);
    let buyer = engine.accept(ChannelConnection::new(buyer_rx)).unwrap();
    buyer.join().unwrap();

    println!("\n=== Events ===");
    for event in events.events() {
        println!("{}", event);
    }

    let snapshot = engine.snapshot("BTC-USD").unwrap();
    println!("\n=== Order Book Snapshot ===");
    println!("Best bid: {:?}", snapshot.best_bid());
    println!("Best ask: {:?}", snapshot.best_ask());
    println!("Spread: {:?}", snapshot.spread());
    println!("Bid levels: {:?}", snapshot.bids);
    println!("Ask levels: {:?}", snapshot.asks);
}
