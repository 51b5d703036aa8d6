use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, header},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use crate::{error::AppError, state::AppState};

use super::engine::CounterEngine;
use super::models::CounterRecord;

/// 演示 ID 的输出是常量输入的纯函数，可长期缓存
const CACHE_FOREVER: &str = "public, max-age=31536000";
/// 普通 ID 每次请求都会自增，必须禁止缓存
const CACHE_NONE: &str = "max-age=0, no-cache, no-store, must-revalidate";

/// 计数路由的 Query 参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CounterQuery {
    /// 主题名（可选；为空或未知时回退默认主题）
    #[serde(default)]
    pub theme: Option<String>,
}

/// 校验计数器 ID：`[A-Za-z0-9:.@_-]{1,256}`
///
/// 通过校验的 id 之后只作为不透明存储键使用。
fn is_valid_counter_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 256
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b':' | b'.' | b'@' | b'_' | b'-'))
}

#[utoipa::path(
    get,
    path = "/{id}",
    summary = "计数并返回 SVG 计数图",
    description = "原子自增命名计数器并渲染自增后的值。保留 ID `demo` 渲染固定示例值且不改动任何计数。",
    params(
        ("id" = String, Path, description = "计数器 ID（[A-Za-z0-9:.@_-]{1,256}）"),
        ("theme" = Option<String>, Query, description = "主题名；为空或未知时回退默认主题")
    ),
    responses(
        (status = 200, description = "SVG 计数图", body = String, content_type = "image/svg+xml"),
        (status = 400, description = "非法计数器 ID", body = AppError),
        (status = 503, description = "存储不可用", body = AppError)
    ),
    tag = "Counter"
)]
pub async fn render_counter(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(q): Query<CounterQuery>,
) -> Result<impl IntoResponse, AppError> {
    if !is_valid_counter_id(&id) {
        return Err(AppError::Validation("Invalid Counter ID".to_string()));
    }

    let theme = q.theme.as_deref();
    let length = state.engine.default_length();

    let (svg, cache_control) = if CounterEngine::is_demo(&id) {
        let svg = state.engine.render_current(&id, theme, length).await?;
        (svg, CACHE_FOREVER)
    } else {
        let svg = state.engine.render_and_increment(&id, theme, length).await?;
        (svg, CACHE_NONE)
    };

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("image/svg+xml; charset=utf-8"),
            ),
            (header::CACHE_CONTROL, HeaderValue::from_static(cache_control)),
        ],
        svg,
    ))
}

#[utoipa::path(
    get,
    path = "/record/{id}",
    summary = "查询计数记录",
    description = "只读查询当前计数值，不产生自增。未知 id 返回 0。",
    params(
        ("id" = String, Path, description = "计数器 ID（[A-Za-z0-9:.@_-]{1,256}）")
    ),
    responses(
        (status = 200, description = "当前计数记录", body = CounterRecord),
        (status = 400, description = "非法计数器 ID", body = AppError)
    ),
    tag = "Counter"
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CounterRecord>, AppError> {
    if !is_valid_counter_id(&id) {
        return Err(AppError::Validation("Invalid Counter ID".to_string()));
    }
    Ok(Json(state.engine.record(&id).await))
}

/// 计数功能路由
pub fn create_counter_router() -> Router<AppState> {
    Router::new()
        .route("/record/:id", get(get_record))
        .route("/:id", get(render_counter))
}

#[cfg(test)]
mod tests {
    use super::is_valid_counter_id;

    #[test]
    fn accepts_documented_id_charset() {
        assert!(is_valid_counter_id("my-blog"));
        assert!(is_valid_counter_id("user@example.com"));
        assert!(is_valid_counter_id("ns:page.home_1"));
        assert!(is_valid_counter_id("A"));
    }

    #[test]
    fn rejects_empty_overlong_and_bad_chars() {
        assert!(!is_valid_counter_id(""));
        assert!(!is_valid_counter_id(&"a".repeat(257)));
        assert!(is_valid_counter_id(&"a".repeat(256)));
        assert!(!is_valid_counter_id("has space"));
        assert!(!is_valid_counter_id("slash/id"));
        assert!(!is_valid_counter_id("中文"));
    }
}
