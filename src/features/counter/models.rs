use serde::Serialize;

/// 计数器记录：命名计数器的当前值
///
/// 未知 id 不是错误，等价于值为 0 的新计数器。
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CounterRecord {
    /// 计数器 ID（调用方提供的不透明键）
    #[schema(example = "my-blog")]
    pub id: String,
    /// 当前计数值
    #[schema(example = 42)]
    pub num: u64,
}
