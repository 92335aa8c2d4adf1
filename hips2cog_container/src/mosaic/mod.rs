//! Full-sky rasters: the finest one assembled from tiles, each coarser one reduced from its predecessor.

mod builder;
mod level;
mod reducer;

pub use builder::MosaicBuilder;
pub use level::{JpegBlock, ResolutionLevel};
pub use reducer::PyramidReducer;
