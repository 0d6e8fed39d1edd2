use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Result;
use subpub::{Bus, BusError, Message, OverflowPolicy, QueueConfig};
use tokio::time::{sleep, timeout, Instant};

fn counting(
    counter: &Arc<AtomicUsize>,
    delay: Duration,
) -> impl Fn(Message) -> futures::future::BoxFuture<'static, ()> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move |_msg: Message| {
        let counter = Arc::clone(&counter);
        Box::pin(async move {
            sleep(delay).await;
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// Close on an empty bus succeeds even with a zero deadline.
#[tokio::test(flavor = "current_thread")]
async fn close_empty_bus_with_zero_deadline() -> Result<()> {
    let bus = Bus::new();
    bus.close(Duration::ZERO).await?;
    assert!(bus.is_closed());
    Ok(())
}

/// Close waits for every subscriber of every subject.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn close_waits_for_all_subjects() -> Result<()> {
    let bus = Bus::new();
    let counter = Arc::new(AtomicUsize::new(0));
    for subject in ["a", "b", "c"] {
        bus.subscribe(subject, counting(&counter, Duration::from_millis(20)))?;
        bus.subscribe(subject, counting(&counter, Duration::from_millis(20)))?;
    }
    for subject in ["a", "b", "c"] {
        bus.publish(subject, "x")?;
        bus.publish(subject, "y")?;
    }

    bus.close(Duration::from_secs(2)).await?;

    assert_eq!(counter.load(Ordering::SeqCst), 12);
    assert_eq!(bus.stats().delivered, 12);
    Ok(())
}

/// `DeadlineExceeded` counts only the subscribers that were still draining.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deadline_error_counts_pending_subscribers() -> Result<()> {
    let bus = Bus::new();
    let counter = Arc::new(AtomicUsize::new(0));
    bus.subscribe("s", counting(&counter, Duration::from_millis(400)))?;
    bus.subscribe("s", counting(&counter, Duration::ZERO))?;
    bus.subscribe("idle", counting(&counter, Duration::ZERO))?;
    bus.publish("s", "x")?;
    sleep(Duration::from_millis(20)).await;

    let err = bus
        .close(Duration::from_millis(50))
        .await
        .expect_err("slow subscriber should exceed the deadline");

    match err {
        BusError::DeadlineExceeded { pending, total, .. } => {
            assert_eq!(pending, 1);
            assert_eq!(total, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

/// Close returns close to the deadline, not when the handler finishes.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn close_returns_at_deadline() -> Result<()> {
    let bus = Bus::new();
    let finished = Arc::new(AtomicBool::new(false));
    let finished_c = Arc::clone(&finished);
    bus.subscribe("slow", move |_m: Message| {
        let finished = Arc::clone(&finished_c);
        async move {
            sleep(Duration::from_millis(600)).await;
            finished.store(true, Ordering::SeqCst);
        }
    })?;
    bus.publish("slow", "x")?;

    let started = Instant::now();
    let deadline = started + Duration::from_millis(100);
    assert!(bus.close_by(deadline).await.is_err());
    assert!(started.elapsed() < Duration::from_millis(300));
    assert!(!finished.load(Ordering::SeqCst));

    // Handlers are never aborted.
    sleep(Duration::from_millis(700)).await;
    assert!(finished.load(Ordering::SeqCst));
    Ok(())
}

/// A second close after a deadline overrun returns `Ok` right away.
#[tokio::test]
async fn second_close_after_overrun_is_ok() -> Result<()> {
    let bus = Bus::new();
    let counter = Arc::new(AtomicUsize::new(0));
    bus.subscribe("s", counting(&counter, Duration::from_millis(300)))?;
    bus.publish("s", "x")?;

    assert!(bus.close(Duration::from_millis(10)).await.is_err());
    timeout(Duration::from_millis(50), bus.close(Duration::from_secs(10)))
        .await
        .expect("second close must not wait")?;
    Ok(())
}

/// Concurrent closers all return; only the first one does the work.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_close_calls() -> Result<()> {
    let bus = Bus::new();
    let counter = Arc::new(AtomicUsize::new(0));
    bus.subscribe("s", counting(&counter, Duration::from_millis(50)))?;
    bus.publish("s", "x")?;

    let closers: Vec<_> = (0..4)
        .map(|_| {
            let bus = bus.clone();
            tokio::spawn(async move { bus.close(Duration::from_secs(2)).await })
        })
        .collect();
    for closer in closers {
        closer.await??;
    }

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    Ok(())
}

/// Publishers racing with close either succeed or get `Closed`; every
/// accepted message is delivered.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn publish_racing_close() -> Result<()> {
    let bus = Bus::new();
    let counter = Arc::new(AtomicUsize::new(0));
    bus.subscribe("race", counting(&counter, Duration::ZERO))?;

    let publisher = {
        let bus = bus.clone();
        tokio::spawn(async move {
            let mut accepted = 0usize;
            for i in 0..10_000 {
                match bus.publish("race", format!("{i}")) {
                    Ok(()) => accepted += 1,
                    Err(BusError::Closed) => break,
                    Err(e) => panic!("unexpected error: {e}"),
                }
                if i % 100 == 0 {
                    tokio::task::yield_now().await;
                }
            }
            accepted
        })
    };

    sleep(Duration::from_millis(5)).await;
    bus.close(Duration::from_secs(5)).await?;
    let accepted = publisher.await?;

    assert_eq!(counter.load(Ordering::SeqCst), accepted);
    Ok(())
}

/// A bounded drop-oldest queue keeps the newest messages through close.
#[tokio::test]
async fn bounded_drop_oldest_keeps_latest() -> Result<()> {
    let bus = Bus::builder()
        .queue(QueueConfig::bounded(2, OverflowPolicy::DropOldest))
        .build()?;
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen_c = Arc::clone(&seen);
    let (gate_tx, gate_rx) = tokio::sync::watch::channel(false);
    bus.subscribe("q", move |msg: Message| {
        let seen = Arc::clone(&seen_c);
        let mut gate = gate_rx.clone();
        async move {
            let _ = gate.wait_for(|open| *open).await;
            seen.lock().push(msg.as_str().unwrap_or_default().to_string());
        }
    })?;

    bus.publish("q", "0")?;
    sleep(Duration::from_millis(20)).await;
    for i in 1..=5 {
        bus.publish("q", format!("{i}"))?;
    }
    gate_tx.send_replace(true);
    bus.close(Duration::from_secs(1)).await?;

    assert_eq!(*seen.lock(), vec!["0", "4", "5"]);
    assert_eq!(bus.stats().dropped, 3);
    Ok(())
}

/// Shutdown on a bus configured with a generous deadline succeeds.
#[tokio::test]
async fn shutdown_with_config_deadline() -> Result<()> {
    let bus = Bus::builder()
        .shutdown_timeout(Duration::from_secs(1))
        .build()?;
    let counter = Arc::new(AtomicUsize::new(0));
    bus.subscribe("s", counting(&counter, Duration::from_millis(10)))?;
    bus.publish("s", "x")?;

    bus.shutdown().await?;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    Ok(())
}
