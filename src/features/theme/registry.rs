use std::collections::HashMap;
use std::path::Path;

use super::models::{Theme, ThemeError, ThemeSpec};

/// 内置主题（随二进制发布，无需外部资源即可启动）
const BUILTIN_THEMES: &[(&str, &str)] = &[
    (
        "segment.toml",
        include_str!("../../../resources/themes/segment.toml"),
    ),
    (
        "mono.toml",
        include_str!("../../../resources/themes/mono.toml"),
    ),
];

/// 不可变主题注册表
///
/// 启动时构建一次：先装入内置主题，再用可选主题目录下的
/// `*.toml` 覆盖/追加（同名覆盖内置）。默认主题名在此处校验，
/// 之后 `resolve` 永不失败。
#[derive(Debug)]
pub struct ThemeRegistry {
    themes: HashMap<String, Theme>,
    default_name: String,
}

impl ThemeRegistry {
    /// 加载注册表。任何解析/校验失败都是启动期致命错误。
    pub fn load(themes_dir: Option<&Path>, default_name: &str) -> Result<Self, ThemeError> {
        let mut themes = HashMap::new();

        for (origin, raw) in BUILTIN_THEMES {
            let theme = ThemeSpec::parse(origin, raw)?.build()?;
            themes.insert(theme.name.clone(), theme);
        }

        if let Some(dir) = themes_dir {
            Self::load_dir(&mut themes, dir)?;
        }

        if !themes.contains_key(default_name) {
            return Err(ThemeError::UnknownDefault(default_name.to_string()));
        }

        tracing::info!(
            "主题注册表已加载: {} 个主题, 默认 {}",
            themes.len(),
            default_name
        );

        Ok(Self {
            themes,
            default_name: default_name.to_string(),
        })
    }

    fn load_dir(themes: &mut HashMap<String, Theme>, dir: &Path) -> Result<(), ThemeError> {
        let entries = std::fs::read_dir(dir).map_err(|e| ThemeError::Dir {
            path: dir.display().to_string(),
            detail: e.to_string(),
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| ThemeError::Dir {
                path: dir.display().to_string(),
                detail: e.to_string(),
            })?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                continue;
            }
            let raw = std::fs::read_to_string(&path).map_err(|e| ThemeError::Dir {
                path: path.display().to_string(),
                detail: e.to_string(),
            })?;
            let origin = path.display().to_string();
            let theme = ThemeSpec::parse(&origin, &raw)?.build()?;
            if themes.insert(theme.name.clone(), theme).is_some() {
                tracing::info!("主题目录覆盖了同名主题: {}", origin);
            }
        }
        Ok(())
    }

    /// 解析主题名（大小写敏感）。
    ///
    /// 主题名是不受信任的用户输入：为空、缺省或未注册都回退到
    /// 默认主题，永不报错。
    pub fn resolve(&self, name: Option<&str>) -> &Theme {
        name.filter(|n| !n.is_empty())
            .and_then(|n| self.themes.get(n))
            .unwrap_or_else(|| self.default_theme())
    }

    /// 默认主题
    pub fn default_theme(&self) -> &Theme {
        // load() 已校验默认主题存在
        &self.themes[&self.default_name]
    }

    /// 已注册主题名（排序后，便于展示）
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.themes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::ThemeRegistry;
    use crate::features::theme::models::ThemeError;

    #[test]
    fn builtin_themes_load_and_validate() {
        let registry = ThemeRegistry::load(None, "segment").unwrap();
        assert!(registry.names().contains(&"segment"));
        assert!(registry.names().contains(&"mono"));
    }

    #[test]
    fn unknown_default_theme_is_fatal() {
        let err = ThemeRegistry::load(None, "no-such-theme").unwrap_err();
        assert!(matches!(err, ThemeError::UnknownDefault(_)));
    }

    #[test]
    fn resolve_falls_back_to_default() {
        let registry = ThemeRegistry::load(None, "segment").unwrap();
        let default_name = registry.default_theme().name.clone();

        assert_eq!(registry.resolve(None).name, default_name);
        assert_eq!(registry.resolve(Some("")).name, default_name);
        assert_eq!(registry.resolve(Some("nonexistent-theme")).name, default_name);
        assert_eq!(registry.resolve(Some("segment")).name, "segment");
        // 大小写敏感：大写不命中，回退默认
        assert_eq!(registry.resolve(Some("Mono")).name, default_name);
        assert_eq!(registry.resolve(Some("mono")).name, "mono");
    }
}
