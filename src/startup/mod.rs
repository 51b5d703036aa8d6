//! 启动检查模块
//!
//! 在对外提供服务之前验证运行环境：数据目录可写、
//! 配置的主题目录存在。配置类错误一律快速失败。

use std::path::Path;

use crate::{config::AppConfig, error::AppError};

/// 运行启动检查
pub async fn run_startup_checks(config: &AppConfig) -> Result<(), AppError> {
    // SQLite 数据目录：不存在则创建（connect 时 create_if_missing 只管文件本身）
    let db_path = Path::new(&config.counter.sqlite_path);
    if let Some(dir) = db_path.parent()
        && !dir.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            AppError::Internal(format!("创建数据目录失败 {}: {}", dir.display(), e))
        })?;
    }

    // 额外主题目录为可选配置，但配置了就必须存在
    if let Some(dir) = config.themes_dir()
        && !dir.is_dir()
    {
        return Err(AppError::Internal(format!(
            "配置的主题目录不存在: {}",
            dir.display()
        )));
    }

    tracing::info!(
        "启动检查通过: sqlite={}, default_theme={}, default_length={}",
        config.counter.sqlite_path,
        config.counter.default_theme,
        config.counter.default_length
    );
    Ok(())
}
