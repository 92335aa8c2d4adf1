//! The reading side: HiPS tile naming, the `properties` file and tile retrieval.

mod locator;
mod properties;
mod source;

pub use locator::HipsLocator;
pub use properties::HipsProperties;
pub use source::{SourceTile, TileSource};
