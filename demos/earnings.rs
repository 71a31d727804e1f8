//! # Demo: earnings
//!
//! Replays a fixed shift of offers through the dispatcher, resolves each one the
//! way a driver would, and prints the live list and earnings as JSON.
//!
//! Shows how to:
//! - Attach an [`EarningsLedger`] subscriber.
//! - Push offers by hand with [`Dispatcher::offer`](orderfeed::Dispatcher::offer).
//! - Export snapshots with `serde_json`.
//!
//! ## Run
//! ```bash
//! cargo run --example earnings
//! ```

use std::sync::Arc;
use std::time::Duration;

use orderfeed::{
    DispatchConfig, DispatcherBuilder, EarningsLedger, MockSource, OrderSort, Platform, Subscribe,
    SwipeGesture,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cfg = DispatchConfig {
        advance_gap: Duration::from_millis(50),
        ..DispatchConfig::default()
    };
    let ledger = Arc::new(EarningsLedger::new());
    let subs: Vec<Arc<dyn Subscribe>> = vec![ledger.clone()];
    let dispatcher = DispatcherBuilder::new(cfg).with_subscribers(subs).build();

    for order in MockSource::catalog() {
        dispatcher.offer(order);
    }

    // Accept everything paying at least 60, swipe the rest away.
    loop {
        let Some(order) = dispatcher.notification_state().current else {
            break;
        };
        if order.pay_amount >= 60.0 {
            dispatcher.accept(&order);
        } else {
            dispatcher.swipe(SwipeGesture::new(140.0, 0.0, 250));
        }
        tokio::time::sleep(Duration::from_millis(60)).await;
    }

    let orders = dispatcher.sorted_orders(OrderSort::HighestPay);
    println!("{}", serde_json::to_string_pretty(&orders)?);

    dispatcher.shutdown().await?;

    let snapshot = ledger.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    for platform in Platform::ALL {
        println!("{platform:>8}: {:5.1}%", snapshot.share(platform));
    }
    println!("acceptance rate: {:.0}%", snapshot.acceptance_rate() * 100.0);
    Ok(())
}
