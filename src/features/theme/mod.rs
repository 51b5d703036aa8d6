pub mod models;
pub mod registry;

pub use models::{Glyph, Theme, ThemeError};
pub use registry::ThemeRegistry;
