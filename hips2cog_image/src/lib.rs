//! Pixel-level work of the HiPS → COG conversion on top of [`image::DynamicImage`]: tile and
//! block codecs, the 2×2 reduction kernel, region copies and the placeholder fill.

pub mod color;
pub mod fill;
pub mod format;
pub mod traits;

pub use fill::TileFill;
pub use traits::*;
