//! Backoff timer: handle, driver and tick subscribers.
//!
//! The only public types from this module are [`BackoffTimer`], the tick
//! payload [`Tick`], and the subscriber contract ([`OnTick`], [`TickFn`],
//! [`SubscriptionId`]).
//!
//! Internal modules:
//! - [`backoff_timer`]: public handle, control methods, disposal;
//! - [`driver`]: the tokio task that sleeps, grows the interval and fires;
//! - [`subscribers`]: ordered subscriber list with failure isolation;
//! - [`tick`]: payload and subscriber trait.
//!
//! ## Wiring
//! ```text
//! owner ──start/stop/reset──► BackoffTimer ──spawn──► driver::run(token)
//!                                   │                       │
//!                                   │ (fire lock)◄──────────┤ fire()
//!                                   ▼                       ▼
//!                               Schedule {current}    TickSubscribers::notify
//!                                                           │
//!                                               Err/panic ──┴──► Bus (SubscriberFailed)
//! ```

mod backoff_timer;
mod driver;
mod subscribers;
mod tick;

pub use backoff_timer::BackoffTimer;
pub use tick::{OnTick, SubscriptionId, Tick, TickFn};

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Weak};
    use std::time::Duration;

    use tokio::sync::{broadcast, mpsc};
    use tokio::time::{self, Instant};

    use super::*;
    use crate::config::TimerConfig;
    use crate::dispose::SafeDisposable;
    use crate::error::Error;
    use crate::events::{Event, EventKind};
    use crate::policies::JitterPolicy;

    fn probe(timer: &BackoffTimer) -> mpsc::UnboundedReceiver<(Instant, Tick)> {
        let (tx, rx) = mpsc::unbounded_channel();
        timer
            .subscribe(TickFn::arc("probe", move |tick: &Tick| {
                let _ = tx.send((Instant::now(), *tick));
                Ok(())
            }))
            .unwrap();
        rx
    }

    /// Timer wheel resolution is 1ms; deadlines may round up by one tick.
    fn assert_waited(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual <= expected + Duration::from_millis(1),
            "waited {actual:?}, expected {expected:?}"
        );
    }

    /// Collects the kinds currently buffered on an event receiver.
    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        kinds
    }

    #[test]
    fn rejects_invalid_arguments() {
        assert!(matches!(
            BackoffTimer::new(Duration::ZERO, 2.0),
            Err(Error::InvalidArgument { param: "initial", .. })
        ));
        assert!(matches!(
            BackoffTimer::new(Duration::from_secs(1), 0.5),
            Err(Error::InvalidArgument { param: "factor", .. })
        ));
    }

    #[test]
    fn new_timer_is_stopped_at_initial_interval() {
        let timer = BackoffTimer::new(Duration::from_secs(1), 2.0).unwrap();
        assert!(!timer.is_running());
        assert_eq!(timer.current_interval(), Duration::from_secs(1));
        assert_eq!(timer.initial_interval(), Duration::from_secs(1));
        assert_eq!(timer.factor(), 2.0);
        assert_eq!(timer.fired(), 0);
    }

    #[test]
    fn start_without_runtime_fails() {
        let timer = BackoffTimer::new(Duration::from_secs(1), 2.0).unwrap();
        assert_eq!(timer.start(), Err(Error::NoRuntime));
        assert!(!timer.is_running());
    }

    #[test]
    fn start_on_pinned_runtime() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let timer = BackoffTimer::new(Duration::from_secs(1), 2.0)
            .unwrap()
            .with_runtime(rt.handle().clone());

        timer.start().unwrap();
        assert!(timer.is_running());
        timer.stop().unwrap();
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn intervals_grow_geometrically() {
        let timer = BackoffTimer::new(Duration::from_secs(1), 2.0).unwrap();
        let mut ticks = probe(&timer);

        let mut last = Instant::now();
        timer.start().unwrap();

        for (n, expected) in [1u64, 2, 4, 8, 16].into_iter().enumerate() {
            let (at, tick) = ticks.recv().await.unwrap();
            assert_waited(at - last, Duration::from_secs(expected));
            assert_eq!(tick.fired, n as u64 + 1);
            assert_eq!(tick.interval, Duration::from_secs(expected));
            assert_eq!(tick.next, Duration::from_secs(expected * 2));
            last = at;
        }
        assert_eq!(timer.current_interval(), Duration::from_secs(32));
        assert_eq!(timer.fired(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_saturates_at_max() {
        let timer = BackoffTimer::with_config(
            TimerConfig::new(Duration::from_secs(1), 2.0).with_max(Duration::from_secs(3)),
        )
        .unwrap();
        let mut ticks = probe(&timer);
        timer.start().unwrap();

        let waits: Vec<Duration> = {
            let mut out = Vec::new();
            for _ in 0..4 {
                out.push(ticks.recv().await.unwrap().1.interval);
            }
            out
        };
        assert_eq!(
            waits,
            [1, 2, 3, 3].map(Duration::from_secs).to_vec()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restores_initial_sequence() {
        let timer = BackoffTimer::new(Duration::from_secs(1), 2.0).unwrap();
        let mut ticks = probe(&timer);
        timer.start().unwrap();

        for _ in 0..2 {
            ticks.recv().await.unwrap();
        }
        let (at, _) = ticks.recv().await.unwrap();
        assert_eq!(timer.current_interval(), Duration::from_secs(8));

        timer.reset().unwrap();
        assert_eq!(timer.current_interval(), Duration::from_secs(1));

        let (after_reset, tick) = ticks.recv().await.unwrap();
        assert_waited(after_reset - at, Duration::from_secs(1));
        assert_eq!(tick.fired, 4);

        let (next, _) = ticks.recv().await.unwrap();
        assert_waited(next - after_reset, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restarts_a_stopped_timer() {
        let timer = BackoffTimer::new(Duration::from_secs(1), 3.0).unwrap();
        let mut ticks = probe(&timer);

        timer.reset().unwrap();
        assert!(timer.is_running());
        let begin = Instant::now();
        let (at, _) = ticks.recv().await.unwrap();
        assert_waited(at - begin, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_pending_firing() {
        let timer = BackoffTimer::new(Duration::from_secs(1), 2.0).unwrap();
        let mut ticks = probe(&timer);

        timer.start().unwrap();
        time::sleep(Duration::from_millis(500)).await;
        timer.stop().unwrap();
        assert!(!timer.is_running());

        time::sleep(Duration::from_secs(10)).await;
        assert!(ticks.try_recv().is_err());
        assert_eq!(timer.fired(), 0);

        // stopped before any firing: the interval did not grow
        let restart = Instant::now();
        timer.start().unwrap();
        let (at, tick) = ticks.recv().await.unwrap();
        assert_waited(at - restart, Duration::from_secs(1));
        assert_eq!(tick.fired, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_and_stop_are_idempotent() {
        let timer = BackoffTimer::new(Duration::from_secs(1), 1.0).unwrap();
        let mut events = timer.events();
        let mut ticks = probe(&timer);

        timer.start().unwrap();
        timer.start().unwrap();
        time::sleep(Duration::from_millis(1500)).await;

        assert!(ticks.try_recv().is_ok());
        assert!(ticks.try_recv().is_err(), "a second driver fired");

        timer.stop().unwrap();
        timer.stop().unwrap();
        assert_eq!(
            drain(&mut events),
            vec![EventKind::Started, EventKind::Fired, EventKind::Stopped]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failing_subscribers_do_not_stop_the_timer() {
        let timer = BackoffTimer::new(Duration::from_secs(1), 2.0).unwrap();
        let mut events = timer.events();
        timer
            .subscribe(TickFn::arc("flaky", |_: &Tick| Err("upstream down".into())))
            .unwrap();
        timer
            .subscribe(TickFn::arc("crashy", |tick: &Tick| {
                if tick.fired == 1 {
                    panic!("first tick panic");
                }
                Ok(())
            }))
            .unwrap();
        let mut ticks = probe(&timer);

        timer.start().unwrap();
        assert_eq!(ticks.recv().await.unwrap().1.fired, 1);
        assert_eq!(ticks.recv().await.unwrap().1.fired, 2);

        let failures: Vec<Event> = std::iter::from_fn(|| events.try_recv().ok())
            .filter(Event::is_subscriber_failure)
            .collect();
        assert_eq!(failures.len(), 3);
        assert_eq!(failures[0].kind, EventKind::SubscriberFailed);
        assert_eq!(
            failures[0].error,
            Some(Error::SubscriberCallbackFailed {
                subscriber: "flaky".into(),
                reason: "upstream down".into(),
            })
        );
        assert_eq!(failures[1].kind, EventKind::SubscriberPanicked);
        assert_eq!(failures[1].subscriber.as_deref(), Some("crashy"));
        assert_eq!(failures[2].fired, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn unsubscribe_stops_delivery() {
        let timer = BackoffTimer::new(Duration::from_secs(1), 1.0).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = timer
            .subscribe(TickFn::arc("once", move |tick: &Tick| {
                let _ = tx.send(tick.fired);
                Ok(())
            }))
            .unwrap();
        let mut ticks = probe(&timer);
        assert_eq!(timer.subscriber_count(), 2);

        timer.start().unwrap();
        ticks.recv().await.unwrap();
        assert!(timer.unsubscribe(id));
        assert!(!timer.unsubscribe(id));
        ticks.recv().await.unwrap();

        assert_eq!(rx.try_recv(), Ok(1));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn callbacks_may_control_their_own_timer() {
        let timer = Arc::new(BackoffTimer::new(Duration::from_secs(1), 2.0).unwrap());
        let weak: Weak<BackoffTimer> = Arc::downgrade(&timer);
        timer
            .subscribe(TickFn::arc("self-stop", move |tick: &Tick| {
                if let Some(t) = weak.upgrade() {
                    if tick.fired == 2 {
                        t.reset()?;
                    }
                    if tick.fired == 3 {
                        t.stop()?;
                    }
                }
                Ok(())
            }))
            .unwrap();
        let mut ticks = probe(&timer);

        let begin = Instant::now();
        timer.start().unwrap();
        let (t1, _) = ticks.recv().await.unwrap();
        let (t2, _) = ticks.recv().await.unwrap();
        let (t3, _) = ticks.recv().await.unwrap();
        assert_waited(t1 - begin, Duration::from_secs(1));
        assert_waited(t2 - t1, Duration::from_secs(2));
        // reset inside firing #2 rewound the interval
        assert_waited(t3 - t2, Duration::from_secs(1));

        time::sleep(Duration::from_secs(60)).await;
        assert!(ticks.try_recv().is_err());
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_stops_and_guards_everything() {
        let timer = BackoffTimer::new(Duration::from_secs(1), 2.0).unwrap();
        let mut events = timer.events();
        let mut ticks = probe(&timer);
        timer.start().unwrap();
        ticks.recv().await.unwrap();

        timer.dispose_async().await.unwrap();
        assert!(timer.is_disposed());
        assert!(!timer.is_running());
        assert_eq!(timer.subscriber_count(), 0);

        let disposed = Error::ObjectDisposed {
            object: "BackoffTimer",
        };
        assert_eq!(timer.start(), Err(disposed.clone()));
        assert_eq!(timer.stop(), Err(disposed.clone()));
        assert_eq!(timer.reset(), Err(disposed.clone()));
        assert!(
            timer
                .subscribe(TickFn::arc("late", |_: &Tick| Ok(())))
                .is_err()
        );

        time::sleep(Duration::from_secs(60)).await;
        assert!(ticks.recv().await.is_none(), "probe dropped with subscribers");

        let kinds = drain(&mut events);
        assert_eq!(kinds.last(), Some(&EventKind::Disposed));
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::Disposed).count(),
            1
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_dispose_tears_down_once() {
        let timer = Arc::new(
            BackoffTimer::with_config(
                TimerConfig::new(Duration::from_millis(5), 1.0).with_bus_capacity(4096),
            )
            .unwrap(),
        );
        let mut events = timer.events();
        timer.start().unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let t = Arc::clone(&timer);
            if i % 2 == 0 {
                handles.push(tokio::task::spawn_blocking(move || t.dispose()));
            } else {
                handles.push(tokio::spawn(async move { t.dispose_async().await }));
            }
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert!(timer.is_disposed());
        assert!(!timer.is_running());
        let disposed = std::iter::from_fn(|| events.try_recv().ok())
            .filter(|ev| ev.kind == EventKind::Disposed)
            .count();
        assert_eq!(disposed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn jitter_never_fires_early() {
        for _ in 0..20 {
            let timer = BackoffTimer::with_config(
                TimerConfig::new(Duration::from_secs(1), 2.0).with_jitter(JitterPolicy::Full),
            )
            .unwrap();
            let mut ticks = probe(&timer);

            let begin = Instant::now();
            timer.start().unwrap();
            let (t1, first) = ticks.recv().await.unwrap();
            let (t2, second) = ticks.recv().await.unwrap();

            assert!(t1 - begin >= Duration::from_secs(1), "first firing came early");
            assert!(t1 - begin <= Duration::from_millis(2001));
            assert!(t2 - t1 >= Duration::from_secs(2), "second firing came early");
            assert_eq!(first.interval, Duration::from_secs(1));
            assert_eq!(second.interval, Duration::from_secs(2));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_waits_for_an_in_flight_callback() {
        let timer = Arc::new(BackoffTimer::new(Duration::from_millis(10), 1.0).unwrap());
        let exited = Arc::new(AtomicBool::new(false));
        let (entered_tx, mut entered_rx) = mpsc::unbounded_channel();

        let flag = Arc::clone(&exited);
        timer
            .subscribe(TickFn::arc("slow", move |_: &Tick| {
                flag.store(false, Ordering::SeqCst);
                let _ = entered_tx.send(());
                std::thread::sleep(Duration::from_millis(200));
                flag.store(true, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();

        timer.start().unwrap();
        entered_rx.recv().await.unwrap();

        let t = Arc::clone(&timer);
        let flag = Arc::clone(&exited);
        let exited_when_stopped = tokio::task::spawn_blocking(move || {
            t.stop().unwrap();
            flag.load(Ordering::SeqCst)
        })
        .await
        .unwrap();

        assert!(exited_when_stopped, "stop returned while a callback was running");
        assert!(!timer.is_running());
    }

    #[test]
    fn subscribe_racing_dispose_leaves_no_subscriber() {
        for _ in 0..50 {
            let timer = BackoffTimer::new(Duration::from_secs(1), 2.0).unwrap();
            std::thread::scope(|s| {
                for _ in 0..4 {
                    s.spawn(|| {
                        let _ = timer.subscribe(TickFn::arc("late", |_: &Tick| Ok(())));
                    });
                }
                s.spawn(|| timer.dispose().unwrap());
            });

            assert!(timer.is_disposed());
            assert_eq!(timer.subscriber_count(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels_the_driver() {
        let timer = BackoffTimer::new(Duration::from_secs(1), 2.0).unwrap();
        let mut events = timer.events();
        let mut ticks = probe(&timer);
        timer.start().unwrap();
        drop(timer);

        time::sleep(Duration::from_secs(5)).await;
        assert!(ticks.recv().await.is_none());
        assert_eq!(
            drain(&mut events),
            vec![EventKind::Started, EventKind::Disposed]
        );
    }
}
