pub mod bdf;
pub mod tft;
