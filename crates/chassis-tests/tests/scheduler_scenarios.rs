//! End-to-end scheduler scenario: a counter job accumulates across ticks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chassis_scheduler::Scheduler;

#[tokio::test]
async fn counter_job_accumulates_to_at_least_elapsed_seconds() {
    // day-of-week wildcarded so the test is not locked to Monday
    let scheduler = Scheduler::new();
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();

    scheduler
        .create_job(
            "counter",
            "*,*-*-*,*:*:*",
            Arc::new(move || {
                let counter = counter_clone.clone();
                Box::pin(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            }),
        )
        .unwrap();

    scheduler.start();
    tokio::time::sleep(Duration::from_millis(3200)).await;

    assert!(counter.load(Ordering::SeqCst) >= 3);
}
