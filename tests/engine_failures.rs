use counter_backend::error::AppError;
use counter_backend::features::counter::{CounterEngine, CounterStore};
use counter_backend::features::theme::ThemeRegistry;

async fn engine_with_store(path: &str) -> (CounterEngine, CounterStore) {
    if std::fs::metadata(path).is_ok() {
        let _ = std::fs::remove_file(path);
    }
    let store = CounterStore::connect_sqlite(path, false).await.unwrap();
    store.init_schema().await.unwrap();
    let themes = ThemeRegistry::load(None, "segment").unwrap();
    (CounterEngine::new(store.clone(), themes, 7), store)
}

#[tokio::test]
async fn increment_fault_propagates_and_renders_no_image() {
    let (engine, store) = engine_with_store("./resources/test_engine_inc_fault.db").await;
    store.pool.close().await;

    // 存储不可用时不允许渲染臆造的自增值
    let err = engine
        .render_and_increment("some-id", None, 7)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StoreUnavailable(_)));
}

#[tokio::test]
async fn read_fault_degrades_to_zero_render() {
    let (engine, store) = engine_with_store("./resources/test_engine_read_fault.db").await;
    store.increment("some-id").await.unwrap();
    store.pool.close().await;

    // 只读路径降级为渲染 0，而不是失败
    let svg = engine.render_current("some-id", None, 7).await.unwrap();
    assert!(svg.starts_with("<svg"));
    assert_eq!(engine.record("some-id").await.num, 0);
}

#[tokio::test]
async fn demo_render_skips_the_store_entirely() {
    let (engine, store) = engine_with_store("./resources/test_engine_demo.db").await;
    store.pool.close().await;

    // 演示 ID 是常量输入的纯函数，存储宕机也照常渲染
    let svg = engine.render_current("demo", None, 7).await.unwrap();
    assert!(svg.starts_with("<svg"));
}
