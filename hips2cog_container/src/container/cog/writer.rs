//! Writes the level stack as one Cloud-Optimized TIFF.
//!
//! Levels arrive finest first, straight out of the mosaic builder and the reducer. Each one is
//! cut into `block_size` squares, compressed block by block and spooled to an anonymous
//! temporary file, after which the caller may drop the level. Once order 0 is in, every block
//! size is known and the file is laid out in one pass:
//!
//! ```text
//! header │ IFD order 0 │ IFD order 1 │ … │ IFD order K │ data order 0 │ data order 1 │ … │ data order K
//! ```
//!
//! The directory chain starts at the full-resolution image and walks towards order 0, as readers
//! expect overviews to follow the main image. Physically the directories sit coarsest first
//! (or in chain order, see [`IfdPlacement`]), and all of them precede the block data, which is
//! stored coarsest level first and row-major within a level. A client that reads the first few
//! kilobytes gets every directory and usually the whole order 0 overview.
//!
//! JPEG levels whose tiles are exactly one block large may carry the original streams of their
//! tiles (see [`JpegBlock`]). Those are copied as blocks byte for byte. All blocks of a level must
//! share the sampling declared in its directory, and new blocks are always encoded at 1×1, so
//! subsampled streams are only copied when every block of the level is such a stream.

use super::types::{IFD_ALIGNMENT, Ifd, TagValue, TiffHeader, tag::*};
use crate::{CogConfig, IfdPlacement, JpegBlock, LevelSummary, mosaic::ResolutionLevel};
use anyhow::{Result, bail, ensure};
use flate2::{Compression, write::ZlibEncoder};
use futures::{StreamExt, stream};
use hips2cog_core::{
	Blob, ConcurrencyLimits, GridPosition, HipsError, TiffCompression,
	io::{DataWriterFile, DataWriterTrait},
	progress::get_progress_bar,
};
use hips2cog_image::{DynamicImageTraitInfo, TileFill, format::jpeg};
use image::DynamicImage;
use std::{
	fs::File,
	io::{BufWriter, Seek, SeekFrom, Write},
	collections::HashSet,
	path::{Path, PathBuf},
};
use tokio_util::sync::CancellationToken;

const DATA_ALIGNMENT: u64 = 16;

/// Sampling of every block the encoder writes.
const ENCODED_SUBSAMPLING: [u16; 2] = [1, 1];

/// One level whose blocks wait in a spool file.
struct SpooledLevel {
	summary: LevelSummary,
	spool: File,
	byte_counts: Vec<u64>,
	/// Only meaningful for JPEG.
	subsampling: [u16; 2],
}

/// What a block is made of.
enum BlockInput {
	/// A source stream, stored unchanged.
	Copy(Blob),
	Pixels(Result<DynamicImage>),
}

/// Where everything goes, computed before the first byte is written.
#[derive(Debug)]
struct Layout {
	/// Indexed like the chain: finest first.
	ifd_offsets: Vec<u64>,
	ifd_lens: Vec<u64>,
	data_offsets: Vec<u64>,
	data_start: u64,
	file_size: u64,
}

pub struct CogWriter {
	config: CogConfig,
	fill: TileFill,
	spool_dir: PathBuf,
	limits: ConcurrencyLimits,
	silent: bool,
	/// Finest first.
	levels: Vec<SpooledLevel>,
}

impl CogWriter {
	/// Spool files are created in `spool_dir`, usually the directory of the output.
	pub fn new(config: CogConfig, fill: TileFill, spool_dir: &Path) -> Result<CogWriter> {
		config.validate()?;
		ensure!(
			config.compression.supports_alpha() || !fill.has_alpha(),
			"{} blocks cannot carry the alpha channel of a transparent fill",
			config.compression
		);
		Ok(CogWriter {
			config,
			fill,
			spool_dir: spool_dir.to_path_buf(),
			limits: ConcurrencyLimits::default(),
			silent: false,
			levels: Vec::new(),
		})
	}

	pub fn with_limits(mut self, limits: ConcurrencyLimits) -> Self {
		self.limits = limits;
		self
	}

	pub fn with_silent(mut self, silent: bool) -> Self {
		self.silent = silent;
		self
	}

	/// Summaries of the levels added so far, coarsest first.
	pub fn summaries(&self) -> Vec<LevelSummary> {
		self.levels.iter().rev().map(|l| l.summary.clone()).collect()
	}

	/// Encodes all blocks of `level`. Levels must be added from the finest order down to order 0.
	pub async fn add_level(&mut self, level: &ResolutionLevel, cancel: &CancellationToken) -> Result<LevelSummary> {
		if let Some(previous) = self.levels.last() {
			ensure!(
				level.order() + 1 == previous.summary.order,
				"expected order {} after order {}, got {}",
				previous.summary.order.saturating_sub(1),
				previous.summary.order,
				level.order()
			);
		}
		ensure!(
			level.fill() == self.fill,
			"level uses fill {}, the writer {}",
			level.fill(),
			self.fill
		);

		let block_size = self.config.block_size;
		let (width, height) = (level.width(), level.height());
		let blocks_across = width.div_ceil(block_size);
		let blocks_down = height.div_ceil(block_size);
		let block_count = u64::from(blocks_across) * u64::from(blocks_down);

		let spool = tempfile::tempfile_in(&self.spool_dir).map_err(|e| HipsError::write_failed(&self.spool_dir, e))?;
		let mut writer = BufWriter::new(spool);
		let mut byte_counts = Vec::with_capacity(block_count as usize);

		let (copies, subsampling) = plan_copies(level, &self.config);
		let copied = copies.len();
		if copied > 0 {
			log::info!(
				"order {}: copying {copied} of {block_count} JPEG tiles unchanged, sampling {}×{}",
				level.order(),
				subsampling[0],
				subsampling[1]
			);
		}

		let progress = get_progress_bar(&format!("encoding order {}", level.order()), block_count, self.silent);
		let (compression, quality) = (self.config.compression, self.config.quality);
		let mut blocks = stream::iter(0..block_count)
			.map(|index| {
				let col = (index % u64::from(blocks_across)) as u32;
				let row = (index / u64::from(blocks_across)) as u32;
				let position = GridPosition { col, row };
				let input = match level.jpeg(position).filter(|_| copies.contains(&position)) {
					Some(block) => BlockInput::Copy(block.data.clone()),
					None => BlockInput::Pixels(level.get_region(col * block_size, row * block_size, block_size, block_size)),
				};
				tokio::task::spawn_blocking(move || match input {
					BlockInput::Copy(blob) => Ok(blob),
					BlockInput::Pixels(block) => encode_block(&block?, compression, quality),
				})
			})
			.buffered(self.limits.compute);

		loop {
			let next = tokio::select! {
				biased;
				() = cancel.cancelled() => bail!(HipsError::Cancelled),
				next = blocks.next() => next,
			};
			let Some(result) = next else {
				break;
			};
			let blob = result??;
			writer
				.write_all(blob.as_slice())
				.map_err(|e| HipsError::write_failed(&self.spool_dir, e))?;
			byte_counts.push(blob.len());
			progress.inc(1);
		}
		progress.finish();

		let spool = writer
			.into_inner()
			.map_err(|e| HipsError::write_failed(&self.spool_dir, e.into_error()))?;
		let summary = LevelSummary {
			order: level.order(),
			width,
			height,
			blocks_across,
			blocks_down,
			payload_bytes: byte_counts.iter().sum(),
		};
		log::debug!("spooled {summary}");
		self.levels.push(SpooledLevel {
			summary: summary.clone(),
			spool,
			byte_counts,
			subsampling,
		});
		Ok(summary)
	}

	fn plan(&self) -> Result<Layout> {
		ensure!(!self.levels.is_empty(), "no level was added");
		let variant = self.config.variant;
		let count = self.levels.len();

		let mut ifd_lens = Vec::with_capacity(count);
		for index in 0..count {
			let zeros = vec![0; self.levels[index].byte_counts.len()];
			ifd_lens.push(self.build_ifd(index, &zeros)?.byte_len(variant));
		}

		let mut ifd_offsets = vec![0; count];
		let mut cursor = variant.header_len();
		for index in self.physical_order() {
			cursor = cursor.div_ceil(IFD_ALIGNMENT) * IFD_ALIGNMENT;
			ifd_offsets[index] = cursor;
			cursor += ifd_lens[index];
		}

		let data_start = cursor.div_ceil(DATA_ALIGNMENT) * DATA_ALIGNMENT;
		let mut data_offsets = vec![0; count];
		cursor = data_start;
		for index in (0..count).rev() {
			data_offsets[index] = cursor;
			cursor += self.levels[index].summary.payload_bytes;
		}

		ensure!(
			cursor <= variant.max_file_size(),
			"a classic TIFF is limited to 4 GiB but this pyramid needs {cursor} bytes, use BigTIFF"
		);

		Ok(Layout {
			ifd_offsets,
			ifd_lens,
			data_offsets,
			data_start,
			file_size: cursor,
		})
	}

	/// Chain indices in the order the directories are written.
	fn physical_order(&self) -> Vec<usize> {
		let count = self.levels.len();
		match self.config.placement {
			IfdPlacement::CoarsestFirst => (0..count).rev().collect(),
			IfdPlacement::ChainOrder => (0..count).collect(),
		}
	}

	fn build_ifd(&self, index: usize, tile_offsets: &[u64]) -> Result<Ifd> {
		let level = &self.levels[index];
		let variant = self.config.variant;
		let samples = u16::from(self.fill.channel_count());
		let compression = self.config.compression;

		let mut ifd = Ifd::new();
		ifd.set(NEW_SUBFILE_TYPE, TagValue::Long(vec![u32::from(index > 0)]));
		ifd.set(IMAGE_WIDTH, TagValue::Long(vec![level.summary.width]));
		ifd.set(IMAGE_LENGTH, TagValue::Long(vec![level.summary.height]));
		ifd.set(BITS_PER_SAMPLE, TagValue::Short(vec![8; samples as usize]));
		ifd.set(COMPRESSION, TagValue::Short(vec![compression.tag_value()]));
		if compression == TiffCompression::Jpeg {
			ifd.set(PHOTOMETRIC_INTERPRETATION, TagValue::Short(vec![PHOTOMETRIC_YCBCR]));
			ifd.set(YCBCR_SUBSAMPLING, TagValue::Short(level.subsampling.to_vec()));
		} else {
			ifd.set(PHOTOMETRIC_INTERPRETATION, TagValue::Short(vec![PHOTOMETRIC_RGB]));
		}
		ifd.set(SAMPLES_PER_PIXEL, TagValue::Short(vec![samples]));
		ifd.set(PLANAR_CONFIGURATION, TagValue::Short(vec![1]));
		ifd.set(
			SOFTWARE,
			TagValue::Ascii(format!("hips2cog {}", env!("CARGO_PKG_VERSION"))),
		);
		ifd.set(TILE_WIDTH, TagValue::Short(vec![self.config.block_size as u16]));
		ifd.set(TILE_LENGTH, TagValue::Short(vec![self.config.block_size as u16]));
		ifd.set(TILE_OFFSETS, TagValue::offsets(tile_offsets, variant)?);
		ifd.set(TILE_BYTE_COUNTS, TagValue::offsets(&level.byte_counts, variant)?);
		if samples == 4 {
			ifd.set(EXTRA_SAMPLES, TagValue::Short(vec![EXTRA_SAMPLE_UNASSOCIATED_ALPHA]));
		}
		ifd.set(SAMPLE_FORMAT, TagValue::Short(vec![1; samples as usize]));
		Ok(ifd)
	}

	/// Writes header, directories and block data to `writer`.
	pub fn assemble(self, writer: &mut dyn DataWriterTrait) -> Result<()> {
		let layout = self.plan()?;
		let variant = self.config.variant;
		ensure!(writer.get_position()? == 0, "the output must be empty");

		let chain_start = layout.ifd_offsets[0];
		writer.append(
			&TiffHeader {
				variant,
				big_endian: false,
				first_ifd: chain_start,
			}
			.serialize()?,
		)?;

		for index in self.physical_order() {
			let level = &self.levels[index];
			let mut tile_offsets = Vec::with_capacity(level.byte_counts.len());
			let mut offset = layout.data_offsets[index];
			for count in &level.byte_counts {
				tile_offsets.push(offset);
				offset += count;
			}
			let next = layout.ifd_offsets.get(index + 1).copied().unwrap_or(0);

			pad_to(writer, layout.ifd_offsets[index])?;
			let blob = self
				.build_ifd(index, &tile_offsets)?
				.serialize(variant, layout.ifd_offsets[index], next)?;
			ensure!(blob.len() == layout.ifd_lens[index], "directory size changed");
			writer.append(&blob)?;
		}

		pad_to(writer, layout.data_start)?;
		for (index, mut level) in self.levels.into_iter().enumerate().rev() {
			ensure!(writer.get_position()? == layout.data_offsets[index], "data of order {} misplaced", level.summary.order);
			level.spool.seek(SeekFrom::Start(0))?;
			let range = writer.append_reader(&mut level.spool)?;
			ensure!(
				range.length == level.summary.payload_bytes,
				"spool of order {} holds {} bytes, expected {}",
				level.summary.order,
				range.length,
				level.summary.payload_bytes
			);
		}

		ensure!(writer.get_position()? == layout.file_size, "unexpected file size");
		Ok(())
	}

	/// Assembles the file next to `path` and moves it into place only when complete.
	pub async fn finish_to_path(self, path: &Path) -> Result<()> {
		let path = path.to_path_buf();
		let file_size = self
			.plan()
			.map_err(|e| HipsError::write_failed(&path, format!("{e:#}")))?
			.file_size;
		log::info!("writing {file_size} bytes to {path:?}");

		tokio::task::spawn_blocking(move || {
			let mut writer = DataWriterFile::from_path(&path)?;
			self.assemble(&mut writer)?;
			writer.finish()
		})
		.await?
	}
}

/// Grid positions whose source streams become blocks as they are, and the sampling the level
/// declares.
fn plan_copies(level: &ResolutionLevel, config: &CogConfig) -> (HashSet<GridPosition>, [u16; 2]) {
	let mut copies = HashSet::new();
	if config.compression != TiffCompression::Jpeg || level.tile_size() != config.block_size || level.jpeg_count() == 0 {
		return (copies, ENCODED_SUBSAMPLING);
	}

	let (cols, rows) = level.grid_size();
	let positions = (0..rows).flat_map(|row| (0..cols).map(move |col| GridPosition { col, row }));
	let streams: Vec<(GridPosition, &JpegBlock)> = positions.filter_map(|p| level.jpeg(p).map(|j| (p, j))).collect();

	let first = streams[0].1.subsampling;
	let complete = streams.len() == cols as usize * rows as usize;
	let subsampling = if complete && streams.iter().all(|(_, j)| j.subsampling == first) {
		first
	} else {
		ENCODED_SUBSAMPLING
	};
	copies.extend(
		streams
			.iter()
			.filter(|(_, j)| j.subsampling == subsampling)
			.map(|(p, _)| *p),
	);
	(copies, subsampling)
}

fn pad_to(writer: &mut dyn DataWriterTrait, position: u64) -> Result<()> {
	let current = writer.get_position()?;
	ensure!(current <= position, "cannot pad backwards from {current} to {position}");
	if current < position {
		writer.append(&Blob::new_sized((position - current) as usize))?;
	}
	Ok(())
}

/// Compresses one block. Every block is self-contained, no state is shared between blocks.
pub fn encode_block(block: &DynamicImage, compression: TiffCompression, quality: u8) -> Result<Blob> {
	ensure!(block.bits_per_value() == 8, "blocks must have 8-bit samples");
	Ok(match compression {
		TiffCompression::None => Blob::from(block.as_bytes()),
		TiffCompression::Deflate => {
			let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
			encoder.write_all(block.as_bytes())?;
			Blob::from(encoder.finish()?)
		}
		TiffCompression::Jpeg => jpeg::encode(block, Some(quality))?,
	})
}
