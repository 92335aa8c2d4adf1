//! Converts HiPS all-sky tile pyramids into a single Cloud-Optimized TIFF.
//!
//! This crate bundles the workspace:
//! - [`core`]: HEALPix addressing, errors and I/O,
//! - [`image`]: the pixel operations,
//! - [`container`]: the HiPS reader, the pyramid and the COG writer and reader.
//!
//! ```no_run
//! use hips2cog::container::{ConvertConfig, convert_hips_to_cog};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConvertConfig::new(2).with_output("sky.tif");
//!     convert_hips_to_cog("./hips", &config, CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```

pub use hips2cog_container as container;
pub use hips2cog_core as core;
pub use hips2cog_image as image;
