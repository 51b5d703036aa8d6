use std::sync::Arc;

use crate::features::counter::engine::CounterEngine;

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 计数引擎：存储 + 主题 + 合成器的编排入口
    pub engine: Arc<CounterEngine>,
}
