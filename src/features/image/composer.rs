//! 计数图合成器
//!
//! 纯数据变换：整数 + 主题 + 目标位数 → 单个自包含 SVG 文档。
//! 不做任何 I/O，不感知存储，相同输入产出逐字节相同的输出。

use std::sync::OnceLock;

use minijinja::{Environment, context};
use serde::Serialize;

use crate::error::AppError;
use crate::features::theme::Theme;

/// SVG 合成模板（内嵌，启动后只编译一次）。
///
/// Rust 负责位数/补齐/偏移的计算，模板只负责文档结构；
/// 字形片段经主题加载期校验，按 `safe` 原样嵌入。
static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

const COUNTER_TEMPLATE: &str = include_str!("counter.svg.jinja");

fn template_env() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(|| {
        let mut env = Environment::new();
        env.add_template("counter.svg", COUNTER_TEMPLATE)
            .expect("内置 SVG 模板不合法");
        env
    })
}

/// 单个字形在输出文档中的放置
#[derive(Serialize)]
struct GlyphPlacement<'a> {
    x: u32,
    content: &'a str,
}

/// 把非负整数合成为一张 SVG 计数图。
///
/// - `value` 十进制展开后不足 `length` 位时左侧补齐：
///   `pad_with_zero=true` 用 "0" 字形，否则用主题空白字形；
/// - 超出 `length` 位时完整渲染，绝不截断；
/// - 字形自左向右按累计宽度放置，输出宽度为放置宽度之和，
///   高度为主题高度。
pub fn compose(
    value: u64,
    theme: &Theme,
    length: u32,
    pad_with_zero: bool,
) -> Result<String, AppError> {
    let digits = value.to_string();
    // length 是最小位数而非上限；0 视同 1
    let length = (length.max(1)) as usize;
    let pad = length.saturating_sub(digits.len());

    let mut glyphs = Vec::with_capacity(pad + digits.len());
    let mut x: u32 = 0;

    for _ in 0..pad {
        let g = if pad_with_zero {
            theme.digit(0)
        } else {
            theme.blank()
        };
        glyphs.push(GlyphPlacement {
            x,
            content: &g.content,
        });
        x += g.width;
    }

    for b in digits.bytes() {
        // to_string() 对 u64 只产出 ASCII 数字
        let g = theme.digit(b - b'0');
        glyphs.push(GlyphPlacement {
            x,
            content: &g.content,
        });
        x += g.width;
    }

    let tpl = template_env()
        .get_template("counter.svg")
        .map_err(|e| AppError::ImageRenderer(format!("加载 SVG 模板失败: {e}")))?;
    tpl.render(context! {
        width => x,
        height => theme.height,
        title => digits,
        glyphs => glyphs,
    })
    .map_err(|e| AppError::ImageRenderer(format!("渲染 SVG 模板失败: {e}")))
}
