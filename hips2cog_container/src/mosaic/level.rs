//! The full-sky raster of one order, kept as its tiles.
//!
//! The raster is `4·2^order × 3·2^order` tiles. Each tile covers the rectangle given by its
//! grid position; slots without a tile read as the placeholder of the level's fill. Nothing is
//! stitched until a region is requested, so a level costs no more memory than its tiles.
//!
//! Besides its pixels, a slot may keep the original JPEG stream of its tile when the writer can
//! store that stream as a block unchanged.

use anyhow::{Result, ensure};
use hips2cog_core::{Blob, GridPosition, HealpixAddress};
use hips2cog_image::{DynamicImageTraitInfo, DynamicImageTraitOperation, TileFill};
use image::DynamicImage;

/// A source JPEG stream that fits a TIFF block as it is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JpegBlock {
	pub data: Blob,
	/// Luma sampling relative to chroma, as declared by `YCbCrSubsampling`.
	pub subsampling: [u16; 2],
}

#[derive(Debug)]
pub struct ResolutionLevel {
	order: u8,
	tile_size: u32,
	fill: TileFill,
	cols: u32,
	rows: u32,
	/// Row-major by grid position.
	tiles: Vec<Option<DynamicImage>>,
	/// Same indexing as `tiles`.
	jpeg: Vec<Option<JpegBlock>>,
}

impl ResolutionLevel {
	/// A level holding only placeholders.
	pub fn new_empty(order: u8, tile_size: u32, fill: TileFill) -> Result<ResolutionLevel> {
		let (cols, rows) = HealpixAddress::grid_size(order);
		ensure!(tile_size > 0, "tile size must not be zero");
		ensure!(
			cols.checked_mul(tile_size).is_some(),
			"order {order} with {tile_size} px tiles exceeds the maximum raster width"
		);
		Ok(ResolutionLevel {
			order,
			tile_size,
			fill,
			cols,
			rows,
			tiles: (0..cols as usize * rows as usize).map(|_| None).collect(),
			jpeg: (0..cols as usize * rows as usize).map(|_| None).collect(),
		})
	}

	pub fn order(&self) -> u8 {
		self.order
	}

	pub fn tile_size(&self) -> u32 {
		self.tile_size
	}

	pub fn fill(&self) -> TileFill {
		self.fill
	}

	/// `(columns, rows)` in tiles.
	pub fn grid_size(&self) -> (u32, u32) {
		(self.cols, self.rows)
	}

	pub fn width(&self) -> u32 {
		self.cols * self.tile_size
	}

	pub fn height(&self) -> u32 {
		self.rows * self.tile_size
	}

	/// Number of slots holding a real tile.
	pub fn tile_count(&self) -> usize {
		self.tiles.iter().filter(|t| t.is_some()).count()
	}

	fn slot(&self, position: GridPosition) -> Result<usize> {
		ensure!(
			position.col < self.cols && position.row < self.rows,
			"grid position {position:?} is outside the {}×{} grid of order {}",
			self.cols,
			self.rows,
			self.order
		);
		Ok(position.row as usize * self.cols as usize + position.col as usize)
	}

	/// Stores the tile of `position`. Each slot is written at most once.
	pub fn set_tile(&mut self, position: GridPosition, tile: DynamicImage) -> Result<()> {
		ensure!(
			tile.width() == self.tile_size && tile.height() == self.tile_size,
			"tile is {}×{} px, expected {}",
			tile.width(),
			tile.height(),
			self.tile_size
		);
		ensure!(
			tile.channel_count() == self.fill.channel_count(),
			"tile has {} channels, the level stores {}",
			tile.channel_count(),
			self.fill.channel_count()
		);
		let slot = self.slot(position)?;
		ensure!(self.tiles[slot].is_none(), "grid position {position:?} is already filled");
		self.tiles[slot] = Some(tile);
		Ok(())
	}

	/// Keeps the original stream of the tile at `position`, which must already be set.
	pub fn set_jpeg(&mut self, position: GridPosition, block: JpegBlock) -> Result<()> {
		let slot = self.slot(position)?;
		ensure!(self.tiles[slot].is_some(), "grid position {position:?} has no tile");
		self.jpeg[slot] = Some(block);
		Ok(())
	}

	pub fn jpeg(&self, position: GridPosition) -> Option<&JpegBlock> {
		self.slot(position).ok().and_then(|slot| self.jpeg[slot].as_ref())
	}

	/// Number of slots keeping their original JPEG stream.
	pub fn jpeg_count(&self) -> usize {
		self.jpeg.iter().filter(|j| j.is_some()).count()
	}

	pub fn tile(&self, position: GridPosition) -> Option<&DynamicImage> {
		self.slot(position).ok().and_then(|slot| self.tiles[slot].as_ref())
	}

	/// Moves the tile of `position` out, leaving a placeholder.
	pub fn take_tile(&mut self, position: GridPosition) -> Option<DynamicImage> {
		let slot = self.slot(position).ok()?;
		self.jpeg[slot] = None;
		self.tiles[slot].take()
	}

	/// Copies a window of the stitched raster. Parts outside the raster and slots without a tile
	/// hold the placeholder.
	pub fn get_region(&self, x: u32, y: u32, width: u32, height: u32) -> Result<DynamicImage> {
		ensure!(width > 0 && height > 0, "region must not be empty");
		let size = self.tile_size;

		// window inside a single tile
		if x / size == (x + width - 1) / size && y / size == (y + height - 1) / size {
			let position = GridPosition {
				col: x / size,
				row: y / size,
			};
			if let Some(tile) = self.tile(position) {
				return tile.get_region(x % size, y % size, width, height, &self.fill);
			}
		}

		let mut region = self.fill.new_image(width, height);
		let col_end = ((x + width).div_ceil(size)).min(self.cols);
		let row_end = ((y + height).div_ceil(size)).min(self.rows);
		for row in y / size..row_end {
			for col in x / size..col_end {
				let Some(tile) = self.tile(GridPosition { col, row }) else {
					continue;
				};
				// intersection of the window with this tile, in raster coordinates
				let left = x.max(col * size);
				let top = y.max(row * size);
				let right = (x + width).min((col + 1) * size);
				let bottom = (y + height).min((row + 1) * size);
				let part = tile.get_region(left - col * size, top - row * size, right - left, bottom - top, &self.fill)?;
				region.paste(&part, left - x, top - y)?;
			}
		}
		Ok(region)
	}

	/// The whole stitched raster. Only sensible for small orders.
	pub fn to_image(&self) -> Result<DynamicImage> {
		self.get_region(0, 0, self.width(), self.height())
	}

	/// Hands all slots over, row-major, emptying the level.
	pub fn into_tiles(self) -> Vec<Option<DynamicImage>> {
		self.tiles
	}
}
