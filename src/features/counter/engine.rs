use crate::error::AppError;
use crate::features::image::composer;
use crate::features::theme::ThemeRegistry;

use super::models::CounterRecord;
use super::store::CounterStore;

/// 保留的演示计数器 ID：渲染固定示例值，不读写存储
pub const DEMO_ID: &str = "demo";

/// 演示计数器展示的固定值与位数
const DEMO_VALUE: u64 = 123_456_789;
const DEMO_LENGTH: u32 = 10;

/// 计数引擎：存储 + 主题注册表 + 合成器的编排入口
///
/// 路由层只和它打交道。主题名是不受信任输入，在这里静默回退；
/// 存储故障按操作区分：读降级为 0，写是硬错误。
pub struct CounterEngine {
    store: CounterStore,
    themes: ThemeRegistry,
    default_length: u32,
}

impl CounterEngine {
    pub fn new(store: CounterStore, themes: ThemeRegistry, default_length: u32) -> Self {
        Self {
            store,
            themes,
            default_length: default_length.max(1),
        }
    }

    /// 默认展示位数（来自配置）
    pub fn default_length(&self) -> u32 {
        self.default_length
    }

    /// 是否为保留的演示 ID
    pub fn is_demo(id: &str) -> bool {
        id == DEMO_ID
    }

    /// 自增后渲染：原子自增，再合成**自增后**的值。
    ///
    /// 存储不可用时错误向上传播，绝不渲染未确认落库的值。
    pub async fn render_and_increment(
        &self,
        id: &str,
        theme_name: Option<&str>,
        length: u32,
    ) -> Result<String, AppError> {
        let num = self.store.increment(id).await?;
        let theme = self.themes.resolve(theme_name);
        composer::compose(num, theme, length, true)
    }

    /// 只读渲染，不做任何变更。
    ///
    /// 演示 ID 渲染固定示例值（输出是常量输入的纯函数，可长期缓存）；
    /// 其余 id 渲染当前持久化的值。
    pub async fn render_current(
        &self,
        id: &str,
        theme_name: Option<&str>,
        length: u32,
    ) -> Result<String, AppError> {
        let (num, length) = if Self::is_demo(id) {
            (DEMO_VALUE, DEMO_LENGTH)
        } else {
            (self.store.read(id).await, length)
        };
        let theme = self.themes.resolve(theme_name);
        composer::compose(num, theme, length, true)
    }

    /// 只读查询当前记录（`/record/:id` 的薄封装）
    pub async fn record(&self, id: &str) -> CounterRecord {
        CounterRecord {
            id: id.to_string(),
            num: self.store.read(id).await,
        }
    }
}
