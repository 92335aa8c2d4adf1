//! Assembles the finest level from the tiles of a HiPS tree.
//!
//! All `12·4^order` tiles are fetched and decoded concurrently, bounded by the fetch limit. Each
//! tile lands in its own grid slot, so the workers share nothing. Tiles that are unavailable or
//! corrupt either leave their slot to the placeholder and are reported, or abort the build,
//! depending on the [`MissingTilePolicy`].

use super::ResolutionLevel;
use crate::{MissingTile, MissingTilePolicy, container::TileSource};
use anyhow::{Context, Result, bail};
use futures::{StreamExt, stream};
use hips2cog_core::{ConcurrencyLimits, HealpixAddress, HipsError, progress::get_progress_bar};
use tokio_util::sync::CancellationToken;

pub struct MosaicBuilder<'a> {
	source: &'a TileSource,
	policy: MissingTilePolicy,
	limits: ConcurrencyLimits,
	silent: bool,
}

impl<'a> MosaicBuilder<'a> {
	pub fn new(source: &'a TileSource, policy: MissingTilePolicy, limits: ConcurrencyLimits) -> MosaicBuilder<'a> {
		MosaicBuilder {
			source,
			policy,
			limits,
			silent: false,
		}
	}

	pub fn with_silent(mut self, silent: bool) -> Self {
		self.silent = silent;
		self
	}

	/// Builds the level of `order` and lists the tiles that had to be replaced by the placeholder.
	pub async fn build_level(&self, order: u8, cancel: &CancellationToken) -> Result<(ResolutionLevel, Vec<MissingTile>)> {
		let mut level = ResolutionLevel::new_empty(order, self.source.tile_size(), self.source.fill())?;
		let mut missing = Vec::new();

		let progress = get_progress_bar(
			&format!("fetching order {order}"),
			HealpixAddress::pixel_count(order),
			self.silent,
		);

		let mut tiles = stream::iter(HealpixAddress::iter_order(order)?)
			.map(|address| async move { (address, self.source.fetch_tile(address).await) })
			.buffer_unordered(self.limits.fetch);

		loop {
			let next = tokio::select! {
				biased;
				() = cancel.cancelled() => bail!(HipsError::Cancelled),
				next = tiles.next() => next,
			};
			let Some((address, result)) = next else {
				break;
			};
			progress.inc(1);

			match result {
				Ok(tile) => {
					let position = address.grid_position();
					level.set_tile(position, tile.image)?;
					if let Some(block) = tile.jpeg {
						level.set_jpeg(position, block)?;
					}
				}
				Err(error) => match (MissingTile::from_error(address, &error), self.policy) {
					(Some(tile), MissingTilePolicy::Fill) => {
						log::debug!("filling {tile}");
						missing.push(tile);
					}
					_ => return Err(error).with_context(|| format!("building order {order}")),
				},
			}
		}
		progress.finish();

		if !missing.is_empty() {
			log::warn!(
				"order {order}: {} of {} tiles were missing or corrupt and filled with {}",
				missing.len(),
				HealpixAddress::pixel_count(order),
				self.source.fill()
			);
		}
		missing.sort_by_key(|m| m.address);
		Ok((level, missing))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{MissingKind, testing::*};
	use assert_fs::TempDir;
	use hips2cog_core::{HipsTileFormat, io::TileFetcherFile};
	use hips2cog_image::TileFill;
	use image::{GenericImageView, Rgb};
	use std::fs;

	fn source(dir: &TempDir, fill: TileFill) -> TileSource {
		TileSource::new(
			Box::new(TileFetcherFile::new(dir.path()).unwrap()),
			HipsTileFormat::Png,
			4,
			fill,
		)
	}

	fn limits() -> ConcurrencyLimits {
		ConcurrencyLimits::new(4, 2)
	}

	#[tokio::test]
	async fn every_pixel_has_exactly_one_marker() -> Result<()> {
		let dir = TempDir::new()?;
		write_order(dir.path(), 1, 4, marker_color)?;
		let source = source(&dir, TileFill::black());

		let builder = MosaicBuilder::new(&source, MissingTilePolicy::Fill, limits()).with_silent(true);
		let (level, missing) = builder.build_level(1, &CancellationToken::new()).await?;
		assert!(missing.is_empty());
		assert_eq!(level.tile_count(), 48);

		let image = level.to_image()?;
		assert_eq!(image.dimensions(), (32, 24));
		let mut seen = vec![0u32; 48];
		for (x, y, pixel) in image.pixels() {
			let index = u64::from(pixel.0[0]) | (u64::from(pixel.0[1]) << 8);
			assert_eq!(pixel.0[2], 7, "unmarked pixel at ({x}, {y})");
			let address = HealpixAddress::new(1, index)?;
			let position = address.grid_position();
			assert_eq!((x / 4, y / 4), (position.col, position.row), "tile {address} misplaced");
			seen[index as usize] += 1;
		}
		assert!(seen.iter().all(|count| *count == 16));
		Ok(())
	}

	#[tokio::test]
	async fn missing_tile_is_filled() -> Result<()> {
		let dir = TempDir::new()?;
		write_order(dir.path(), 1, 4, |_| Rgb([200, 100, 50]))?;
		let (complete, _) = MosaicBuilder::new(&source(&dir, TileFill::Transparent), MissingTilePolicy::Fill, limits())
			.with_silent(true)
			.build_level(1, &CancellationToken::new())
			.await?;
		let complete = complete.to_image()?;

		fs::remove_file(dir.path().join("Norder1/Dir0/Npix9.png"))?;
		fs::write(dir.path().join("Norder1/Dir0/Npix20.png"), b"garbage")?;
		let (level, missing) = MosaicBuilder::new(&source(&dir, TileFill::Transparent), MissingTilePolicy::Fill, limits())
			.with_silent(true)
			.build_level(1, &CancellationToken::new())
			.await?;
		assert_eq!(
			missing.iter().map(|m| (m.address.pixel_index, m.kind)).collect::<Vec<_>>(),
			vec![(9, MissingKind::Unavailable), (20, MissingKind::Corrupt)]
		);
		assert!(missing[0].location.ends_with("Norder1/Dir0/Npix9.png"));

		let holes = [
			HealpixAddress::new(1, 9)?.grid_position(),
			HealpixAddress::new(1, 20)?.grid_position(),
		];
		let image = level.to_image()?;
		for (x, y, pixel) in image.pixels() {
			if holes.iter().any(|h| (h.col, h.row) == (x / 4, y / 4)) {
				assert_eq!(pixel.0, [0, 0, 0, 0]);
			} else {
				assert_eq!(pixel, complete.get_pixel(x, y));
			}
		}
		Ok(())
	}

	#[tokio::test]
	async fn keeps_jpeg_streams() -> Result<()> {
		let dir = TempDir::new()?;
		for address in HealpixAddress::iter_order(0)? {
			write_tile(dir.path(), &address, HipsTileFormat::Jpeg, &solid_tile(16, palette(address.pixel_index)))?;
		}
		fs::remove_file(dir.path().join("Norder0/Dir0/Npix3.jpg"))?;
		let source = TileSource::new(
			Box::new(TileFetcherFile::new(dir.path()).unwrap()),
			HipsTileFormat::Jpeg,
			16,
			TileFill::black(),
		)
		.with_jpeg_passthrough(true);

		let (level, missing) = MosaicBuilder::new(&source, MissingTilePolicy::Fill, limits())
			.with_silent(true)
			.build_level(0, &CancellationToken::new())
			.await?;
		assert_eq!(missing.len(), 1);
		assert_eq!((level.tile_count(), level.jpeg_count()), (11, 11));
		let position = HealpixAddress::new(0, 7)?.grid_position();
		let original = fs::read(dir.path().join("Norder0/Dir0/Npix7.jpg"))?;
		assert_eq!(level.jpeg(position).map(|j| j.data.as_slice()), Some(original.as_slice()));
		Ok(())
	}

	#[tokio::test]
	async fn strict_policy_aborts() -> Result<()> {
		let dir = TempDir::new()?;
		write_order(dir.path(), 0, 4, |_| Rgb([1, 1, 1]))?;
		fs::remove_file(dir.path().join("Norder0/Dir0/Npix11.png"))?;

		let source = source(&dir, TileFill::black());
		let error = MosaicBuilder::new(&source, MissingTilePolicy::Fail, limits())
			.with_silent(true)
			.build_level(0, &CancellationToken::new())
			.await
			.unwrap_err();
		assert!(matches!(HipsError::find(&error), Some(HipsError::TileUnavailable { .. })));
		assert_eq!(error.to_string(), "building order 0");
		Ok(())
	}

	#[tokio::test]
	async fn cancelled_build() -> Result<()> {
		let dir = TempDir::new()?;
		write_order(dir.path(), 0, 4, |_| Rgb([1, 1, 1]))?;
		let source = source(&dir, TileFill::black());

		let cancel = CancellationToken::new();
		cancel.cancel();
		let error = MosaicBuilder::new(&source, MissingTilePolicy::Fill, limits())
			.with_silent(true)
			.build_level(0, &cancel)
			.await
			.unwrap_err();
		assert!(matches!(HipsError::find(&error), Some(HipsError::Cancelled)));
		Ok(())
	}
}
