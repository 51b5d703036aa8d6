use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Html;
use axum::{Router, response::Json, routing::get};
use counter_backend::features::counter::handler::create_counter_router;
use counter_backend::features::counter::{CounterEngine, CounterStore};
use counter_backend::features::theme::ThemeRegistry;
use counter_backend::startup::run_startup_checks;
use counter_backend::state::AppState;
use counter_backend::{AppConfig, ShutdownManager, cors::build_cors_layer};
use serde_json::json;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    // 主要响应体是 SVG 文本，压缩收益很高；
    // IMAGES 谓词会排除位图但放行 image/svg+xml。
    // 仍保留默认的最小大小阈值（默认 32B）。
    SizeAbove::default()
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::const_new("application/octet-stream"))
}

#[cfg(test)]
mod compression_predicate_tests {
    use super::compression_predicate;
    use axum::body::Body;
    use axum::http::{Response as HttpResponse, header};
    use tower_http::compression::predicate::Predicate;

    fn should_compress_for(ct: &str) -> bool {
        // 命中 SizeAbove（默认 32B），避免因为 body 太小导致测试不稳定。
        let body_bytes = vec![b'x'; 2048];
        let resp = HttpResponse::builder()
            .header(header::CONTENT_TYPE, ct)
            .body(Body::from(body_bytes))
            .unwrap();
        compression_predicate().should_compress(&resp)
    }

    #[test]
    fn compression_predicate_disables_bitmaps_but_allows_svg() {
        assert!(!should_compress_for("image/png"));
        assert!(should_compress_for("image/svg+xml"));
        assert!(should_compress_for("image/svg+xml; charset=utf-8"));
    }

    #[test]
    fn compression_predicate_allows_json() {
        assert!(should_compress_for("application/json"));
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        counter_backend::features::counter::handler::render_counter,
        counter_backend::features::counter::handler::get_record,
        health_check,
    ),
    components(
        schemas(
            counter_backend::AppError,
            counter_backend::error::ProblemDetails,
            counter_backend::features::counter::CounterRecord,
        )
    ),
    tags(
        (name = "Counter", description = "Counter APIs"),
        (name = "Health", description = "Health APIs"),
    ),
    info(
        title = "Counter Backend API",
        version = "0.1.0",
        description = "Hit-counter image service (Axum)"
    )
)]
pub struct ApiDoc;

const INDEX_HTML: &str = include_str!("../static/index.html");
const ROBOTS_TXT: &str = include_str!("../static/robots.txt");

#[utoipa::path(
    get,
    path = "/health",
    summary = "健康检查",
    description = "用于探活的健康检查端点，返回服务状态与版本信息。",
    responses((status = 200, description = "服务健康", body = serde_json::Value)),
    tag = "Health"
)]
async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "counter-backend",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// 根路由：内嵌的使用说明页
async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn robots_txt() -> ([(header::HeaderName, HeaderValue); 1], &'static str) {
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )],
        ROBOTS_TXT,
    )
}

/// favicon 不存在；显式 404，避免 `favicon.ico` 被当成计数器 ID
async fn favicon() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// 心跳检查（保留给外部拨测，禁止任何缓存）
async fn heart_beat() -> ([(header::HeaderName, HeaderValue); 1], &'static str) {
    (
        [(
            header::CACHE_CONTROL,
            HeaderValue::from_static("max-age=0, no-cache, no-store, must-revalidate"),
        )],
        "alive",
    )
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counter_backend=info,tower_http=info".into()),
        )
        .init();

    // 创建优雅退出管理器
    let shutdown_manager = ShutdownManager::new();

    // Load config
    if let Err(e) = AppConfig::init_global() {
        tracing::error!("Config init failed: {}", e);
        std::process::exit(1);
    }
    let config = AppConfig::global();

    // 启动信号处理器
    if let Err(e) = shutdown_manager.start_signal_handler().await {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    // Run startup checks
    if let Err(e) = run_startup_checks(config).await {
        tracing::error!("Startup checks failed: {}", e);
        std::process::exit(1);
    }

    // 计数存储
    let store = match CounterStore::connect_sqlite(
        &config.counter.sqlite_path,
        config.counter.sqlite_wal,
    )
    .await
    {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("SQLite 连接失败: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = store.init_schema().await {
        tracing::error!("初始化表结构失败: {}", e);
        std::process::exit(1);
    }

    // 主题注册表：字形缺失/定义非法属于配置错误，启动期直接失败
    let themes = match ThemeRegistry::load(
        config.themes_dir().as_deref(),
        &config.counter.default_theme,
    ) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("主题加载失败: {}", e);
            std::process::exit(1);
        }
    };

    let pool_for_cleanup = store.pool.clone();
    let engine = CounterEngine::new(store, themes, config.counter.default_length);
    let app_state = AppState {
        engine: Arc::new(engine),
    };

    // Routes：静态路由在前，`/:id` 兜底匹配计数器 ID
    let mut app = Router::<AppState>::new()
        .route("/", get(index_page))
        .route("/robots.txt", get(robots_txt))
        .route("/favicon.ico", get(favicon))
        .route("/heart-beat", get(heart_beat))
        .route("/health", get(health_check))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(create_counter_router())
        .with_state(app_state);

    if let Some(cors) = build_cors_layer(&config.cors) {
        app = app.layer(cors);
    }

    // 应用内响应压缩：SVG/JSON/文本走 gzip/brotli，位图不压
    app = app.layer(CompressionLayer::new().compress_when(compression_predicate()));

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Demo: http://{}/demo", addr);

    // 运行服务器直到收到退出信号
    let shutdown_manager_for_signal = shutdown_manager.clone();
    let graceful = axum::serve(listener, app).with_graceful_shutdown(async move {
        let reason = shutdown_manager_for_signal.wait_for_shutdown().await;
        tracing::info!("接收到退出信号: {:?}，开始优雅关闭HTTP服务器...", reason);
    });

    if let Err(e) = graceful.await {
        tracing::error!("服务器运行错误: {}", e);
        std::process::exit(1);
    }

    // 关闭连接池：等待在途的计数写入落盘后再退出，
    // 保证"请求被放弃也不回滚已持久化的自增"。
    let shutdown_config = &config.shutdown;
    match tokio::time::timeout(shutdown_config.timeout_duration(), pool_for_cleanup.close()).await
    {
        Ok(_) => tracing::info!("连接池已关闭，优雅退出完成"),
        Err(_) => {
            tracing::warn!("优雅退出超时");
            if shutdown_config.force_quit {
                tracing::warn!("强制退出");
                std::process::exit(1);
            }
        }
    }

    tracing::info!("服务器已优雅关闭");
}
