//! # Example: poll_with_backoff
//!
//! Polls a flaky upstream with a [`BackoffTimer`]. Every failed poll lets the
//! interval grow (100ms, 200ms, 400ms, ...); the first success resets it.
//!
//! ## Flow
//! ```text
//! start()
//!   ├─► tick #1 (100ms) → poll() → Err  → SubscriberFailed event
//!   ├─► tick #2 (200ms) → poll() → Err  → SubscriberFailed event
//!   ├─► tick #3 (400ms) → poll() → Ok   → reset() → next wait 100ms
//!   └─► ...
//! dispose_async()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example poll_with_backoff --features logging
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tickguard::{
    BackoffTimer, JitterPolicy, LogWriter, SafeDisposable, Tick, TickFn, TimerConfig,
};

static POLLS: AtomicU64 = AtomicU64::new(0);

fn poll() -> Result<(), &'static str> {
    let n = POLLS.fetch_add(1, Ordering::Relaxed) + 1;
    if n % 3 == 0 { Ok(()) } else { Err("upstream unavailable") }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    // 1. Configure: 100ms doubling, capped at 2s, no jitter
    let cfg = TimerConfig::new(Duration::from_millis(100), 2.0)
        .with_max(Duration::from_secs(2))
        .with_jitter(JitterPolicy::None);
    let timer = Arc::new(BackoffTimer::with_config(cfg)?);

    // 2. Log every event (started / fired / subscriber-failed / reset / disposed)
    let logger = LogWriter.spawn(timer.events());

    // 3. Poll on every tick; reset on success
    let weak: Weak<BackoffTimer> = Arc::downgrade(&timer);
    timer.subscribe(TickFn::arc("poller", move |tick: &Tick| {
        poll()?;
        println!("[poller] success on tick #{}", tick.fired);
        if let Some(t) = weak.upgrade() {
            t.reset()?;
        }
        Ok(())
    }))?;

    // 4. Run for a while, then tear down
    timer.start()?;
    tokio::time::sleep(Duration::from_secs(3)).await;
    timer.dispose_async().await?;

    drop(timer);
    let _ = logger.await;
    println!("[main] done.");
    Ok(())
}
