//! Extension traits on [`image::DynamicImage`]:
//!
//! - [`DynamicImageTraitConvert`]: construction from closures and raw buffers, pixel iteration.
//! - [`DynamicImageTraitInfo`]: channel layout, transparency and comparison helpers.
//! - [`DynamicImageTraitOperation`]: layout normalization, flattening, padded extraction and
//!   the 2×2 reduction used to build every coarser pyramid level.

mod convert;
mod info;
mod operation;

pub use convert::*;
pub use info::*;
pub use operation::*;
#[cfg(any(test, feature = "test"))]
pub use test::*;
