//! Parameters of one conversion.
//!
//! ```rust
//! use hips2cog_container::{ConvertConfig, MissingTilePolicy, TiffVariant};
//! use hips2cog_core::TiffCompression;
//!
//! let config = ConvertConfig::new(3)
//! 	.with_missing_tiles(MissingTilePolicy::Fail)
//! 	.with_compression(TiffCompression::None)
//! 	.with_variant(TiffVariant::Classic);
//! assert_eq!(config.output_path().to_str(), Some("3.tif"));
//! assert!(config.validate().is_ok());
//! ```

use anyhow::{Result, ensure};
use hips2cog_core::{ConcurrencyLimits, HipsTileFormat, MAX_ORDER, TiffCompression};
use hips2cog_image::TileFill;
use std::path::PathBuf;

/// What the mosaic builder does with a tile it cannot retrieve or decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingTilePolicy {
	/// Paint the tile's region with the placeholder and record it in the report.
	#[default]
	Fill,
	/// Abort the conversion.
	Fail,
}

/// Width of the offsets inside the TIFF container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TiffVariant {
	/// 32-bit offsets, limited to 4 GiB.
	Classic,
	#[default]
	BigTiff,
}

impl TiffVariant {
	pub fn as_str(&self) -> &str {
		match self {
			TiffVariant::Classic => "TIFF",
			TiffVariant::BigTiff => "BigTIFF",
		}
	}
}

/// Physical order of the image directories. The chain itself always runs finest → coarsest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IfdPlacement {
	#[default]
	CoarsestFirst,
	ChainOrder,
}

/// Layout of the output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CogConfig {
	pub block_size: u32,
	pub compression: TiffCompression,
	pub quality: u8,
	pub variant: TiffVariant,
	pub placement: IfdPlacement,
}

impl Default for CogConfig {
	fn default() -> Self {
		CogConfig {
			block_size: 256,
			compression: TiffCompression::Deflate,
			quality: 90,
			variant: TiffVariant::BigTiff,
			placement: IfdPlacement::CoarsestFirst,
		}
	}
}

impl CogConfig {
	pub fn validate(&self) -> Result<()> {
		ensure!(
			self.block_size.is_power_of_two() && (16..=4096).contains(&self.block_size),
			"block size must be a power of two between 16 and 4096, got {}",
			self.block_size
		);
		ensure!(
			(1..=99).contains(&self.quality),
			"JPEG quality must be between 1 and 99, got {}",
			self.quality
		);
		Ok(())
	}
}

#[derive(Clone, Debug)]
pub struct ConvertConfig {
	pub max_order: u8,
	/// Defaults to `<max_order>.tif` in the working directory.
	pub output: Option<PathBuf>,
	pub fill: TileFill,
	pub missing_tiles: MissingTilePolicy,
	/// Taken from `properties` (or JPEG) when unset.
	pub tile_format: Option<HipsTileFormat>,
	/// Taken from `properties` (or the first tile found) when unset.
	pub tile_size: Option<u32>,
	pub cog: CogConfig,
	/// Encode JPEG tiles again even when their streams could be copied into the output.
	pub reencode: bool,
	pub concurrency: ConcurrencyLimits,
	pub silent: bool,
}

impl Default for ConvertConfig {
	fn default() -> Self {
		ConvertConfig {
			max_order: 0,
			output: None,
			fill: TileFill::Transparent,
			missing_tiles: MissingTilePolicy::Fill,
			tile_format: None,
			tile_size: None,
			cog: CogConfig::default(),
			reencode: false,
			concurrency: ConcurrencyLimits::default(),
			silent: false,
		}
	}
}

impl ConvertConfig {
	pub fn new(max_order: u8) -> ConvertConfig {
		ConvertConfig {
			max_order,
			..Default::default()
		}
	}

	pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
		self.output = Some(output.into());
		self
	}

	pub fn with_fill(mut self, fill: TileFill) -> Self {
		self.fill = fill;
		self
	}

	pub fn with_missing_tiles(mut self, policy: MissingTilePolicy) -> Self {
		self.missing_tiles = policy;
		self
	}

	pub fn with_tile_format(mut self, format: HipsTileFormat) -> Self {
		self.tile_format = Some(format);
		self
	}

	pub fn with_tile_size(mut self, size: u32) -> Self {
		self.tile_size = Some(size);
		self
	}

	pub fn with_block_size(mut self, size: u32) -> Self {
		self.cog.block_size = size;
		self
	}

	pub fn with_compression(mut self, compression: TiffCompression) -> Self {
		self.cog.compression = compression;
		self
	}

	pub fn with_quality(mut self, quality: u8) -> Self {
		self.cog.quality = quality;
		self
	}

	pub fn with_variant(mut self, variant: TiffVariant) -> Self {
		self.cog.variant = variant;
		self
	}

	pub fn with_placement(mut self, placement: IfdPlacement) -> Self {
		self.cog.placement = placement;
		self
	}

	pub fn with_reencode(mut self, reencode: bool) -> Self {
		self.reencode = reencode;
		self
	}

	/// Sets the number of concurrent tile fetches; CPU-bound work keeps its default limit.
	pub fn with_fetch_concurrency(mut self, fetch: usize) -> Self {
		self.concurrency = ConcurrencyLimits::new(fetch, self.concurrency.compute);
		self
	}

	pub fn with_silent(mut self, silent: bool) -> Self {
		self.silent = silent;
		self
	}

	pub fn output_path(&self) -> PathBuf {
		self
			.output
			.clone()
			.unwrap_or_else(|| PathBuf::from(format!("{}.tif", self.max_order)))
	}

	pub fn validate(&self) -> Result<()> {
		ensure!(
			self.max_order <= MAX_ORDER,
			"order {} exceeds the HEALPix limit of {MAX_ORDER}",
			self.max_order
		);
		if let Some(size) = self.tile_size {
			ensure!(
				size.is_power_of_two() && size >= 2,
				"tile size must be a power of two, got {size}"
			);
		}
		ensure!(
			!(self.fill.has_alpha() && !self.cog.compression.supports_alpha()),
			"{} blocks cannot carry transparency, choose an opaque --fill",
			self.cog.compression
		);
		self.cog.validate()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn defaults() {
		let config = ConvertConfig::default();
		assert_eq!(config.fill, TileFill::Transparent);
		assert_eq!(config.missing_tiles, MissingTilePolicy::Fill);
		assert_eq!(config.cog.block_size, 256);
		assert_eq!(config.cog.compression, TiffCompression::Deflate);
		assert_eq!(config.cog.variant, TiffVariant::BigTiff);
		assert_eq!(config.cog.placement, IfdPlacement::CoarsestFirst);
		assert_eq!(config.concurrency.fetch, ConcurrencyLimits::default().fetch);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn output_path() {
		assert_eq!(ConvertConfig::new(7).output_path(), PathBuf::from("7.tif"));
		assert_eq!(
			ConvertConfig::new(7).with_output("/data/sky.tif").output_path(),
			PathBuf::from("/data/sky.tif")
		);
	}

	#[test]
	fn fetch_concurrency() {
		let config = ConvertConfig::new(1).with_fetch_concurrency(0);
		assert_eq!(config.concurrency.fetch, 1);
		assert_eq!(config.concurrency.compute, ConcurrencyLimits::default().compute);
	}

	#[rstest]
	#[case(8, false)]
	#[case(16, true)]
	#[case(100, false)]
	#[case(512, true)]
	#[case(4096, true)]
	#[case(8192, false)]
	fn block_size(#[case] size: u32, #[case] valid: bool) {
		assert_eq!(ConvertConfig::new(0).with_block_size(size).validate().is_ok(), valid);
	}

	#[rstest]
	#[case(0, false)]
	#[case(1, true)]
	#[case(99, true)]
	#[case(100, false)]
	fn quality(#[case] value: u8, #[case] valid: bool) {
		assert_eq!(ConvertConfig::new(0).with_quality(value).validate().is_ok(), valid);
	}

	#[test]
	fn jpeg_needs_opaque_fill() {
		let config = ConvertConfig::new(0).with_compression(TiffCompression::Jpeg);
		assert_eq!(
			config.validate().unwrap_err().to_string(),
			"jpeg blocks cannot carry transparency, choose an opaque --fill"
		);
		assert!(config.with_fill(TileFill::black()).validate().is_ok());
	}

	#[test]
	fn rejects_bad_order_and_tile_size() {
		assert!(ConvertConfig::new(30).validate().is_err());
		assert!(ConvertConfig::new(3).with_tile_size(300).validate().is_err());
		assert!(ConvertConfig::new(3).with_tile_size(512).validate().is_ok());
	}
}
