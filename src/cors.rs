use axum::http::HeaderValue;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::config::CorsConfig;

/// 根据配置构建 CORS 中间件。
///
/// 计数图通常由 `<img>` 标签引用，不受同源策略限制；CORS 只在
/// `/record/:id` 被前端脚本跨域消费时才需要，默认关闭。
pub fn build_cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    if !cors.enabled {
        return None;
    }

    let (any_origin, origins) = parse_allowed_origins(&cors.allowed_origins);
    if !any_origin && origins.is_empty() {
        tracing::warn!("CORS 已启用但 allowed_origins 为空，已跳过启用");
        return None;
    }

    if cors.allow_credentials && any_origin {
        tracing::error!("CORS 配置无效：allow_credentials=true 不能与 \"*\" 同时使用，已跳过启用");
        return None;
    }

    // tower-http 禁止 credentials 与通配值组合（运行期 panic），
    // 所以带凭证时一律使用显式 origin 与显式方法列表。
    let mut layer = CorsLayer::new();
    if any_origin {
        layer = layer.allow_origin(Any).allow_methods(Any);
    } else {
        layer = layer
            .allow_origin(origins)
            .allow_methods([axum::http::Method::GET]);
    }

    if cors.allow_credentials {
        layer = layer.allow_credentials(true);
    }

    if let Some(secs) = cors.max_age_secs
        && secs > 0
    {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    Some(layer)
}

fn parse_allowed_origins(values: &[String]) -> (bool, Vec<HeaderValue>) {
    let mut any = false;
    let mut origins = Vec::new();
    for raw in values {
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }
        if value == "*" {
            any = true;
            continue;
        }
        match HeaderValue::from_str(value) {
            Ok(v) => origins.push(v),
            Err(_) => tracing::warn!("CORS allowed_origins 含无效值: {}", value),
        }
    }
    (any, origins)
}

#[cfg(test)]
mod tests {
    use super::build_cors_layer;
    use crate::config::CorsConfig;

    #[test]
    fn build_cors_layer_skips_when_disabled() {
        let layer = build_cors_layer(&CorsConfig::default());
        assert!(layer.is_none());
    }

    #[test]
    fn build_cors_layer_skips_when_origins_empty() {
        let cors = CorsConfig {
            enabled: true,
            ..CorsConfig::default()
        };
        assert!(build_cors_layer(&cors).is_none());
    }

    #[test]
    fn build_cors_layer_rejects_credentials_with_wildcard() {
        let cors = CorsConfig {
            enabled: true,
            allow_credentials: true,
            allowed_origins: vec!["*".to_string()],
            ..CorsConfig::default()
        };
        assert!(build_cors_layer(&cors).is_none());
    }

    #[test]
    fn build_cors_layer_accepts_explicit_origin() {
        let cors = CorsConfig {
            enabled: true,
            allowed_origins: vec!["https://example.com".to_string()],
            ..CorsConfig::default()
        };
        assert!(build_cors_layer(&cors).is_some());
    }
}
