use std::path::Path;
use std::time::Duration;

use sqlx::{ConnectOptions, Row, SqlitePool, sqlite::SqliteConnectOptions};

use crate::error::AppError;

/// 计数存储：key → 非负整数 的持久化抽象
///
/// 只有两种查询形态：按键点读、原子 upsert 自增。
/// 自增是单条 SQL 语句，原子性由 SQLite 保证，进程内无需额外锁。
#[derive(Clone)]
pub struct CounterStore {
    pub pool: SqlitePool,
}

impl CounterStore {
    pub async fn connect_sqlite(path: &str, wal: bool) -> Result<Self, AppError> {
        let opt = SqliteConnectOptions::new()
            .filename(Path::new(path))
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(tracing::log::LevelFilter::Off);
        let pool = SqlitePool::connect_with(opt)
            .await
            .map_err(|e| AppError::Internal(format!("sqlite connect: {e}")))?;
        if wal {
            sqlx::query("PRAGMA journal_mode=WAL;")
                .execute(&pool)
                .await
                .ok();
        }
        sqlx::query("PRAGMA synchronous=NORMAL;")
            .execute(&pool)
            .await
            .ok();
        Ok(Self { pool })
    }

    pub async fn init_schema(&self) -> Result<(), AppError> {
        let ddl = r#"
        CREATE TABLE IF NOT EXISTS counters (
            id TEXT PRIMARY KEY,
            num INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#;
        sqlx::query(ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("init schema: {e}")))?;
        Ok(())
    }

    /// 读取计数值。
    ///
    /// 未知 id 返回 0；持久层故障也降级为 0（可用性优先，
    /// 故障期间计数可能少报），同时记一条 warn 日志。
    pub async fn read(&self, id: &str) -> u64 {
        match sqlx::query("SELECT num FROM counters WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(Some(row)) => row.try_get::<i64, _>("num").unwrap_or(0).max(0) as u64,
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!("读取计数失败（降级为 0）: id={}, err={}", id, e);
                0
            }
        }
    }

    /// 原子自增并返回自增后的值。
    ///
    /// 单条 `INSERT ... ON CONFLICT DO UPDATE ... RETURNING` 语句：
    /// 首次出现的 id 落为 1，已有 id 加 1。N 个并发调用最终恰好
    /// 加 N，且各自拿到互不相同的后继值。
    ///
    /// 持久层故障是硬错误：绝不静默成功，也绝不返回臆造的值。
    pub async fn increment(&self, id: &str) -> Result<u64, AppError> {
        let now = chrono::Utc::now().to_rfc3339();
        let row = sqlx::query(
            "INSERT INTO counters(id, num, created_at, updated_at) VALUES(?, 1, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
               num = counters.num + 1,
               updated_at = excluded.updated_at
             RETURNING num",
        )
        .bind(id)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::StoreUnavailable(format!("increment counter: {e}")))?;

        let num: i64 = row
            .try_get("num")
            .map_err(|e| AppError::StoreUnavailable(format!("read incremented value: {e}")))?;
        Ok(num.max(0) as u64)
    }
}
