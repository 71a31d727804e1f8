//! # Demo: driver_feed
//!
//! Runs the live offer feed with shortened timings and a scripted "driver" that
//! reacts to every card on screen.
//!
//! Shows how to:
//! - Install `tracing-subscriber` and attach the built-in [`LogWriter`].
//! - Watch [`NotificationState`] and drive accept / swipe from it.
//! - Run the [`Dispatcher`] until Ctrl-C.
//!
//! ## Flow
//! ```text
//! MockSource::randomized ──► Emitter (every 2–3 s) ──► NotificationQueue
//!                                                          │ watch()
//!                                                          ▼
//!                                        driver task: pay >= 60 → accept
//!                                                     pay <  40 → swipe away
//!                                                     otherwise → let it time out
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=orderfeed=info cargo run --example driver_feed --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use orderfeed::{
    DispatchConfig, Dispatcher, DispatcherBuilder, LogWriter, MockSource, NotificationState,
    OrderSort, Subscribe, SwipeGesture,
};
use tracing_subscriber::EnvFilter;

/// Reacts to each new card after a short "reading" delay.
async fn drive(dispatcher: Arc<Dispatcher>) {
    let mut rx = dispatcher.watch_notifications();
    while rx.changed().await.is_ok() {
        let NotificationState { current, .. } = rx.borrow_and_update().clone();
        let Some(order) = current else { continue };

        tokio::time::sleep(Duration::from_millis(800)).await;
        if order.pay_amount >= 60.0 {
            if dispatcher.accept(&order) {
                println!("accepted {} ({} ₹{:.0})", order.id, order.platform, order.pay_amount);
            }
        } else if order.pay_amount < 40.0 {
            let outcome = dispatcher.swipe(SwipeGesture::new(-160.0, 6.0, 220));
            println!("swiped {} -> {outcome:?}", order.id);
        }

        let list = dispatcher.sorted_orders(OrderSort::HighestPay);
        let summary = dispatcher.summary();
        println!(
            "live orders: {} (₹{:.0}, ₹{:.1}/km) top={:?}",
            summary.count,
            summary.total_pay,
            summary.pay_per_km(),
            list.first().map(|o| o.id.to_string())
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orderfeed=info")),
        )
        .with_target(true)
        .init();

    let cfg = DispatchConfig {
        emission_min: Duration::from_secs(2),
        emission_max: Duration::from_secs(3),
        auto_dismiss: Duration::from_secs(5),
        eviction: Duration::from_secs(20),
        ..DispatchConfig::default()
    };

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let dispatcher = DispatcherBuilder::new(cfg)
        .with_source(Arc::new(MockSource::randomized()))
        .with_subscribers(subs)
        .build();

    tokio::spawn(drive(Arc::clone(&dispatcher)));

    println!("offer feed running, press Ctrl-C to stop");
    dispatcher.run().await?;
    Ok(())
}
