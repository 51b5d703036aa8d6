pub mod counter;
pub mod image;
pub mod theme;
