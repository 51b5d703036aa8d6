use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

/// 主题加载/校验错误（启动期致命，不在渲染期出现）
#[derive(Error, Debug)]
pub enum ThemeError {
    /// 主题定义文件解析失败
    #[error("主题定义解析失败（{name}）: {source}")]
    Parse {
        name: String,
        #[source]
        source: toml::de::Error,
    },

    /// 缺少数字字形
    #[error("主题 {theme} 缺少数字 {digit} 的字形")]
    MissingDigit { theme: String, digit: u8 },

    /// 数字键不合法（只允许 "0" 到 "9"）
    #[error("主题 {theme} 含非法数字键: {key}")]
    InvalidDigitKey { theme: String, key: String },

    /// 尺寸不合法
    #[error("主题 {theme} 的字形尺寸不合法: {detail}")]
    InvalidDimension { theme: String, detail: String },

    /// 主题目录读取失败
    #[error("读取主题目录失败 {path}: {detail}")]
    Dir { path: String, detail: String },

    /// 默认主题未注册
    #[error("默认主题未注册: {0}")]
    UnknownDefault(String),
}

/// 主题定义文件（TOML）中的单个字形
#[derive(Debug, Clone, Deserialize)]
pub struct GlyphSpec {
    /// 字形固有宽度（像素）
    pub width: u32,
    /// 内嵌 SVG 片段（在合成时以 translate 偏移放置）
    pub content: String,
}

/// 主题定义文件（TOML）反序列化结构
///
/// 示例见 `resources/themes/segment.toml`。`height` 为主题级属性，
/// 因此"同一主题内字形高度一致"这一不变量在结构上即成立；
/// 各字形宽度允许不同（比例宽度主题）。
#[derive(Debug, Deserialize)]
pub struct ThemeSpec {
    /// 主题名（注册表键，大小写敏感）
    pub name: String,
    /// 主题统一高度（像素）
    pub height: u32,
    /// 空白字形（pad_with_zero=false 时的左侧填充；缺省为 "0" 等宽的空片段）
    #[serde(default)]
    pub blank: Option<GlyphSpec>,
    /// 数字字形，键为 "0" 到 "9"，必须齐全
    pub digits: BTreeMap<String, GlyphSpec>,
}

/// 运行期字形：一段内嵌 SVG 片段与固有宽度
#[derive(Debug, Clone)]
pub struct Glyph {
    pub width: u32,
    pub content: String,
}

/// 运行期主题：十个数字字形 + 空白字形，启动后不可变
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub height: u32,
    digits: [Glyph; 10],
    blank: Glyph,
}

impl Theme {
    /// 取数字字形。`d` 超出 0-9 属于编程缺陷（上游已保证十进制位）。
    pub fn digit(&self, d: u8) -> &Glyph {
        &self.digits[usize::from(d) % 10]
    }

    /// 空白填充字形
    pub fn blank(&self) -> &Glyph {
        &self.blank
    }
}

impl ThemeSpec {
    /// 解析一份 TOML 主题定义。`origin` 只用于报错定位。
    pub fn parse(origin: &str, raw: &str) -> Result<Self, ThemeError> {
        toml::from_str(raw).map_err(|source| ThemeError::Parse {
            name: origin.to_string(),
            source,
        })
    }

    /// 校验并固化为运行期主题。
    ///
    /// 校验项：数字键只允许 "0"-"9" 且十个齐全、宽高为正。
    /// 任一校验失败都是启动期致命错误。
    pub fn build(self) -> Result<Theme, ThemeError> {
        if self.height == 0 {
            return Err(ThemeError::InvalidDimension {
                theme: self.name.clone(),
                detail: "height 必须为正".to_string(),
            });
        }

        let mut digits: [Option<Glyph>; 10] = Default::default();
        for (key, spec) in &self.digits {
            let d = match key.parse::<u8>() {
                Ok(d) if d <= 9 && key.len() == 1 => d,
                _ => {
                    return Err(ThemeError::InvalidDigitKey {
                        theme: self.name.clone(),
                        key: key.clone(),
                    });
                }
            };
            if spec.width == 0 {
                return Err(ThemeError::InvalidDimension {
                    theme: self.name.clone(),
                    detail: format!("数字 {d} 的 width 必须为正"),
                });
            }
            digits[usize::from(d)] = Some(Glyph {
                width: spec.width,
                content: spec.content.clone(),
            });
        }

        for (d, slot) in digits.iter().enumerate() {
            if slot.is_none() {
                return Err(ThemeError::MissingDigit {
                    theme: self.name.clone(),
                    digit: d as u8,
                });
            }
        }
        let digits = digits.map(|g| g.expect("checked above"));

        let blank = match self.blank {
            Some(spec) => {
                if spec.width == 0 {
                    return Err(ThemeError::InvalidDimension {
                        theme: self.name.clone(),
                        detail: "blank 的 width 必须为正".to_string(),
                    });
                }
                Glyph {
                    width: spec.width,
                    content: spec.content,
                }
            }
            // 缺省空白字形：与 "0" 等宽的空片段
            None => Glyph {
                width: digits[0].width,
                content: String::new(),
            },
        };

        Ok(Theme {
            name: self.name,
            height: self.height,
            digits,
            blank,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ThemeError, ThemeSpec};

    fn spec_with_digits(digits: &str) -> String {
        format!("name = \"t\"\nheight = 10\n{digits}")
    }

    fn full_digits() -> String {
        (0..10)
            .map(|d| format!("[digits.{d}]\nwidth = 5\ncontent = \"<!--{d}-->\"\n"))
            .collect()
    }

    #[test]
    fn builds_complete_theme() {
        let spec = ThemeSpec::parse("test", &spec_with_digits(&full_digits())).unwrap();
        let theme = spec.build().unwrap();
        assert_eq!(theme.height, 10);
        assert_eq!(theme.digit(7).content, "<!--7-->");
        // 缺省空白字形与 "0" 等宽
        assert_eq!(theme.blank().width, theme.digit(0).width);
        assert!(theme.blank().content.is_empty());
    }

    #[test]
    fn missing_digit_is_fatal() {
        // 去掉数字 9
        let digits: String = (0..9)
            .map(|d| format!("[digits.{d}]\nwidth = 5\ncontent = \"\"\n"))
            .collect();
        let spec = ThemeSpec::parse("test", &spec_with_digits(&digits)).unwrap();
        let err = spec.build().unwrap_err();
        assert!(matches!(err, ThemeError::MissingDigit { digit: 9, .. }));
    }

    #[test]
    fn non_digit_key_is_rejected() {
        let mut digits = full_digits();
        digits.push_str("[digits.x]\nwidth = 5\ncontent = \"\"\n");
        let spec = ThemeSpec::parse("test", &spec_with_digits(&digits)).unwrap();
        let err = spec.build().unwrap_err();
        assert!(matches!(err, ThemeError::InvalidDigitKey { .. }));
    }

    #[test]
    fn zero_width_is_rejected() {
        let mut digits: String = (1..10)
            .map(|d| format!("[digits.{d}]\nwidth = 5\ncontent = \"\"\n"))
            .collect();
        digits.push_str("[digits.0]\nwidth = 0\ncontent = \"\"\n");
        let spec = ThemeSpec::parse("test", &spec_with_digits(&digits)).unwrap();
        assert!(matches!(
            spec.build().unwrap_err(),
            ThemeError::InvalidDimension { .. }
        ));
    }
}
