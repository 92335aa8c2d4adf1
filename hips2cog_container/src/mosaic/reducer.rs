//! Derives each coarser level from the one below it.
//!
//! Every tile of order `k` covers exactly the 2×2 tiles of order `k + 1` below it in the grid, so
//! a level is reduced tile by tile: the four children are pasted into a `2T × 2T` canvas and
//! halved with the coverage-weighted 2×2 mean. Parents without any child stay placeholders.
//! The finer level is consumed, its tiles move into the jobs and are dropped as soon as their
//! parent exists.

use super::ResolutionLevel;
use anyhow::{Result, bail, ensure};
use futures::{StreamExt, stream};
use hips2cog_core::{ConcurrencyLimits, GridPosition, HipsError, progress::get_progress_bar};
use hips2cog_image::{DynamicImageTraitOperation, TileFill};
use image::DynamicImage;
use tokio_util::sync::CancellationToken;

pub struct PyramidReducer {
	limits: ConcurrencyLimits,
	silent: bool,
}

impl PyramidReducer {
	pub fn new(limits: ConcurrencyLimits) -> PyramidReducer {
		PyramidReducer { limits, silent: false }
	}

	pub fn with_silent(mut self, silent: bool) -> Self {
		self.silent = silent;
		self
	}

	/// Turns level `k + 1` into level `k`.
	pub async fn reduce(&self, level: ResolutionLevel, cancel: &CancellationToken) -> Result<ResolutionLevel> {
		ensure!(level.order() > 0, "order 0 is the coarsest level and cannot be reduced");

		let order = level.order() - 1;
		let (tile_size, fill) = (level.tile_size(), level.fill());
		let mut reduced = ResolutionLevel::new_empty(order, tile_size, fill)?;
		let (cols, rows) = reduced.grid_size();

		let mut jobs = Vec::new();
		let child_cols = cols as usize * 2;
		let mut grid = level.into_tiles();
		for row in 0..rows {
			for col in 0..cols {
				let slot = |dx: u32, dy: u32| (row * 2 + dy) as usize * child_cols + (col * 2 + dx) as usize;
				let quad = [
					grid[slot(0, 0)].take(),
					grid[slot(1, 0)].take(),
					grid[slot(0, 1)].take(),
					grid[slot(1, 1)].take(),
				];
				if quad.iter().any(Option::is_some) {
					jobs.push((GridPosition { col, row }, quad));
				}
			}
		}
		drop(grid);

		let progress = get_progress_bar(&format!("reducing to order {order}"), jobs.len() as u64, self.silent);
		let mut parents = stream::iter(jobs)
			.map(|(position, quad)| tokio::task::spawn_blocking(move || reduce_quad(quad, tile_size, &fill).map(|tile| (position, tile))))
			.buffer_unordered(self.limits.compute);

		loop {
			let next = tokio::select! {
				biased;
				() = cancel.cancelled() => bail!(HipsError::Cancelled),
				next = parents.next() => next,
			};
			let Some(result) = next else {
				break;
			};
			let (position, tile) = result??;
			reduced.set_tile(position, tile)?;
			progress.inc(1);
		}
		progress.finish();

		Ok(reduced)
	}
}

/// Halves the four children `[top-left, top-right, bottom-left, bottom-right]` into one tile.
fn reduce_quad(quad: [Option<DynamicImage>; 4], tile_size: u32, fill: &TileFill) -> Result<DynamicImage> {
	let mut canvas = fill.new_image(tile_size * 2, tile_size * 2);
	for (i, child) in quad.into_iter().enumerate() {
		if let Some(child) = child {
			let (dx, dy) = ((i % 2) as u32, (i / 2) as u32);
			canvas.paste(&child, dx * tile_size, dy * tile_size)?;
		}
	}
	canvas.get_reduced(fill)
}
