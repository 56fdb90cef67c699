pub mod glyph;
pub mod parser;
