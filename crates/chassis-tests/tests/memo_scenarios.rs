//! End-to-end in-memory memo TTL scenario.

use std::time::Duration;

use chassis_memo::{MemoDriver, MemoOptions, MemoryMemo};

#[tokio::test]
async fn ttl_expiry_is_observed_after_sleep() {
    let memo = MemoryMemo::with_janitor_interval(Duration::from_secs(3600));
    memo.set_raw("k", b"v".to_vec(), MemoOptions::new().ttl(Duration::from_millis(50))).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(memo.get_raw("k", MemoOptions::default()).await.unwrap().is_none());
}
