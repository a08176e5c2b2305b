//! Color values shared by renderers and demos.

mod color;

pub use color::Color;
