//! HiPS → COG: turns a HEALPix tile pyramid into one Cloud-Optimized TIFF.
//!
//! The conversion runs in three stages that hand their data on by value:
//! - [`MosaicBuilder`] fetches every tile of the requested order through a [`TileSource`] and
//!   places it in a [`ResolutionLevel`],
//! - [`PyramidReducer`] derives each coarser level from the previous one, down to order 0,
//! - [`CogWriter`] compresses the blocks of every level as soon as it exists and finally lays out
//!   the file with all directories and the coarse overviews first.
//!
//! [`convert_hips_to_cog`] wires these stages together; [`CogReader`] reads the result back.
//!
//! # Quick start
//! ```no_run
//! use hips2cog_container::*;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConvertConfig::new(3).with_output("3.tif");
//!     let report = convert_hips_to_cog("https://alasky.cds.unistra.fr/DSS/DSSColor", &config, CancellationToken::new()).await?;
//!     println!("{}", report.summary(10));
//!     Ok(())
//! }
//! ```
//!
//! # Features
//! - `cli`: derives `clap::ValueEnum` for the compression and tile format enums of `hips2cog_core`.
//! - `test`: synthetic HiPS trees for integration tests in downstream crates.

mod container;
pub use container::*;

mod mosaic;
pub use mosaic::*;

mod types;
pub use types::*;

#[cfg(any(test, feature = "test"))]
pub mod testing;
