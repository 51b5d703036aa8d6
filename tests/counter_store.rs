use std::collections::BTreeSet;

use counter_backend::error::AppError;
use counter_backend::features::counter::CounterStore;

async fn fresh_store(path: &str) -> CounterStore {
    if std::fs::metadata(path).is_ok() {
        let _ = std::fs::remove_file(path);
    }
    let store = CounterStore::connect_sqlite(path, false).await.unwrap();
    store.init_schema().await.unwrap();
    store
}

#[tokio::test]
async fn read_unknown_id_returns_zero() {
    let store = fresh_store("./resources/test_store_read.db").await;
    assert_eq!(store.read("never-seen-id").await, 0);
}

#[tokio::test]
async fn sequential_increments_are_strictly_monotonic() {
    let store = fresh_store("./resources/test_store_seq.db").await;
    for expected in 1..=5u64 {
        let num = store.increment("seq").await.unwrap();
        assert_eq!(num, expected);
    }
    assert_eq!(store.read("seq").await, 5);
}

#[tokio::test]
async fn increments_are_isolated_per_id() {
    let store = fresh_store("./resources/test_store_iso.db").await;
    store.increment("a").await.unwrap();
    store.increment("a").await.unwrap();
    store.increment("b").await.unwrap();
    assert_eq!(store.read("a").await, 2);
    assert_eq!(store.read("b").await, 1);
}

#[tokio::test]
async fn concurrent_increments_hand_out_distinct_values() {
    const N: usize = 32;
    let store = fresh_store("./resources/test_store_concurrent.db").await;

    let mut handles = Vec::with_capacity(N);
    for _ in 0..N {
        let s = store.clone();
        handles.push(tokio::spawn(
            async move { s.increment("concurrent").await },
        ));
    }

    let mut seen = BTreeSet::new();
    for h in handles {
        let num = h.await.unwrap().unwrap();
        // 任何两个并发调用都不能拿到同一个后继值
        assert!(seen.insert(num), "duplicate post-increment value: {num}");
    }

    // N 个值恰好是 {1, ..., N}，无空洞
    let expected: BTreeSet<u64> = (1..=N as u64).collect();
    assert_eq!(seen, expected);
    assert_eq!(store.read("concurrent").await, N as u64);
}

#[tokio::test]
async fn read_degrades_to_zero_when_store_is_down() {
    let store = fresh_store("./resources/test_store_down_read.db").await;
    store.increment("x").await.unwrap();
    store.pool.close().await;
    // 故障期间读降级为 0，而不是向调用方抛错
    assert_eq!(store.read("x").await, 0);
}

#[tokio::test]
async fn increment_fails_hard_when_store_is_down() {
    let store = fresh_store("./resources/test_store_down_write.db").await;
    store.pool.close().await;
    let err = store.increment("x").await.unwrap_err();
    assert!(matches!(err, AppError::StoreUnavailable(_)));
}
