//! Fetching and decoding single tiles of a HiPS tree.
//!
//! A [`TileSource`] owns the fetcher of one root and the parameters every tile has to satisfy:
//! format, edge length and the pixel layout given by the placeholder fill. It keeps no state
//! between calls, so any number of fetches may run against it at the same time.
//!
//! With JPEG passthrough enabled, a JPEG tile whose stream TIFF can hold unchanged is returned
//! together with that stream, so the writer can copy it instead of encoding the pixels again.

use super::{HipsLocator, HipsProperties};
use crate::{ConvertConfig, JpegBlock};
use anyhow::{Context, Result, bail};
use hips2cog_core::{
	Blob, HealpixAddress, HipsError, HipsTileFormat, TiffCompression,
	io::{TileFetcher, open_tile_fetcher},
};
use hips2cog_image::{
	DynamicImageTraitOperation, TileFill,
	format::{self, jpeg},
};
use image::{DynamicImage, GenericImageView};

/// A decoded tile and, when it may be copied as a block, its original JPEG stream.
#[derive(Debug)]
pub struct SourceTile {
	pub image: DynamicImage,
	pub jpeg: Option<JpegBlock>,
}

#[derive(Debug)]
pub struct TileSource {
	fetcher: TileFetcher,
	locator: HipsLocator,
	tile_size: u32,
	fill: TileFill,
	keep_jpeg: bool,
}

impl TileSource {
	pub fn new(fetcher: TileFetcher, format: HipsTileFormat, tile_size: u32, fill: TileFill) -> TileSource {
		TileSource {
			fetcher,
			locator: HipsLocator::new(format),
			tile_size,
			fill,
			keep_jpeg: false,
		}
	}

	/// Keeps the streams of JPEG tiles that TIFF can store unchanged. Has no effect on other formats.
	pub fn with_jpeg_passthrough(mut self, keep: bool) -> Self {
		self.keep_jpeg = keep && self.format() == HipsTileFormat::Jpeg;
		self
	}

	/// Opens the HiPS tree at `root` (directory or `http(s)://` URL).
	///
	/// Format and tile size come from the configuration, then from the `properties` file, and
	/// finally from the tree itself: JPEG, and the size of the first tile found at the requested
	/// order.
	pub async fn open(root: &str, config: &ConvertConfig) -> Result<TileSource> {
		let fetcher = open_tile_fetcher(root).with_context(|| format!("opening HiPS root '{root}'"))?;
		let properties = match fetcher.fetch_optional("properties").await? {
			Some(blob) => HipsProperties::from_blob(&blob),
			None => {
				log::debug!("no properties file below '{}'", fetcher.get_name());
				HipsProperties::default()
			}
		};

		if let Some(max_order) = properties.max_order()?
			&& config.max_order > max_order
		{
			log::warn!(
				"requested order {} exceeds hips_order {max_order} of '{}', expect missing tiles",
				config.max_order,
				fetcher.get_name()
			);
		}

		let format = match config.tile_format {
			Some(format) => format,
			None => properties.tile_format()?.unwrap_or_default(),
		};

		let tile_size = match (config.tile_size, properties.tile_width()?) {
			(Some(size), _) | (None, Some(size)) => size,
			(None, None) => detect_tile_size(&fetcher, HipsLocator::new(format), config.max_order).await?,
		};
		if !tile_size.is_power_of_two() || tile_size < 2 {
			bail!("tile size must be a power of two, got {tile_size}");
		}

		log::info!(
			"reading {format} tiles of {tile_size}×{tile_size} px from '{}'",
			fetcher.get_name()
		);
		let passthrough = !config.reencode
			&& format == HipsTileFormat::Jpeg
			&& config.cog.compression == TiffCompression::Jpeg
			&& config.cog.block_size == tile_size;
		if passthrough {
			log::info!("JPEG tiles of order {} are copied without re-encoding where possible", config.max_order);
		}
		Ok(TileSource::new(fetcher, format, tile_size, config.fill).with_jpeg_passthrough(passthrough))
	}

	pub fn tile_size(&self) -> u32 {
		self.tile_size
	}

	pub fn fill(&self) -> TileFill {
		self.fill
	}

	pub fn format(&self) -> HipsTileFormat {
		self.locator.format()
	}

	pub fn get_name(&self) -> &str {
		self.fetcher.get_name()
	}

	pub fn keeps_jpeg(&self) -> bool {
		self.keep_jpeg
	}

	/// Retrieves and decodes one tile, converted to the layout of the fill.
	///
	/// Fails with [`HipsError::TileUnavailable`] when the tile cannot be retrieved and with
	/// [`HipsError::TileCorrupt`] when it does not decode to a `tile_size` square.
	pub async fn fetch_tile(&self, address: HealpixAddress) -> Result<SourceTile> {
		let location = self.locator.tile_location(&address);
		let blob = self.fetcher.fetch(&location).await?;
		let described = self.fetcher.describe(&location);

		let (format, tile_size, fill, keep_jpeg) = (self.format(), self.tile_size, self.fill, self.keep_jpeg);
		tokio::task::spawn_blocking(move || {
			let image = decode_tile(&blob, format, tile_size, &fill, &described)?;
			let jpeg = if keep_jpeg { copyable_jpeg(blob, tile_size) } else { None };
			Ok(SourceTile { image, jpeg })
		})
		.await?
	}
}

/// The stream of a JPEG tile if it is a `tile_size` square TIFF can hold as a block.
fn copyable_jpeg(blob: Blob, tile_size: u32) -> Option<JpegBlock> {
	let frame = jpeg::read_frame(&blob).ok()?;
	if (frame.width, frame.height) != (tile_size, tile_size) {
		return None;
	}
	let subsampling = frame.tiff_subsampling()?;
	Some(JpegBlock { data: blob, subsampling })
}

fn decode_tile(blob: &Blob, format: HipsTileFormat, tile_size: u32, fill: &TileFill, location: &str) -> Result<DynamicImage> {
	let image = format::decode(blob, format).map_err(|e| HipsError::corrupt(location, format!("{e:#}")))?;
	if image.dimensions() != (tile_size, tile_size) {
		return Err(HipsError::corrupt(
			location,
			format!(
				"expected {tile_size}×{tile_size} px, got {}×{}",
				image.width(),
				image.height()
			),
		)
		.into());
	}
	image.into_layout(fill)
}

/// Reads the width of the first available tile among the first tiles of the twelve base faces.
async fn detect_tile_size(fetcher: &TileFetcher, locator: HipsLocator, order: u8) -> Result<u32> {
	let face_size = HealpixAddress::nside(order) * HealpixAddress::nside(order);
	for face in 0..12 {
		let address = HealpixAddress::new(order, face * face_size)?;
		let location = locator.tile_location(&address);
		let Some(blob) = fetcher.fetch_optional(&location).await? else {
			continue;
		};
		let described = fetcher.describe(&location);
		let format = locator.format();
		let (width, height) = tokio::task::spawn_blocking(move || {
			format::decode(&blob, format)
				.map(|image| image.dimensions())
				.map_err(|e| HipsError::corrupt(&described, format!("{e:#}")))
		})
		.await??;
		if width != height {
			bail!("tile '{location}' is not square ({width}×{height})");
		}
		log::debug!("detected tile size {width} from '{location}'");
		return Ok(width);
	}
	bail!(
		"cannot determine the tile size: no properties file and no tile found at order {order}, set the tile size explicitly"
	)
}
