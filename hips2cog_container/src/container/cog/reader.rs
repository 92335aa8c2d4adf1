//! Reads tiled RGB(A) TIFFs through range requests.
//!
//! `CogReader` parses the header, follows the directory chain and keeps the geometry and block
//! byte ranges of every image. Pixel data is only fetched on demand, one block at a time, so
//! the same code inspects a local file or a COG behind an HTTP server.
//!
//! ```no_run
//! use hips2cog_container::CogReader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = CogReader::open_location("3.tif").await?;
//!     for level in reader.levels() {
//!         println!("{}×{} px in {} blocks", level.width, level.height, level.tile_offsets.len());
//!     }
//!     let overview = reader.read_level(reader.levels().len() - 1).await?;
//!     overview.save("overview.png")?;
//!     Ok(())
//! }
//! ```

use super::types::{Ifd, TiffHeader, tag::*};
use crate::TiffVariant;
use anyhow::{Context, Result, anyhow, bail, ensure};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use flate2::read::ZlibDecoder;
use hips2cog_core::{
	ByteRange, TiffCompression,
	io::{DataReader, open_data_reader},
};
use hips2cog_image::{DynamicImageTraitConvert, DynamicImageTraitOperation, TileFill, format::jpeg};
use image::DynamicImage;
use std::{collections::HashSet, io::Read};

const MAX_LEVELS: usize = 64;

/// Geometry and block table of one image in the chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CogLevel {
	pub ifd_offset: u64,
	pub subfile_type: u64,
	pub width: u32,
	pub height: u32,
	pub block_width: u32,
	pub block_height: u32,
	pub samples_per_pixel: u16,
	pub compression: TiffCompression,
	pub photometric: u16,
	/// `YCbCrSubsampling` of YCbCr images, `None` for RGB.
	pub ycbcr_subsampling: Option<[u16; 2]>,
	pub tile_offsets: Vec<u64>,
	pub tile_byte_counts: Vec<u64>,
}

impl CogLevel {
	fn from_ifd(ifd: &Ifd, ifd_offset: u64) -> Result<CogLevel> {
		let required = |tag: u16, name: &str| ifd.get_u64(tag).ok_or_else(|| anyhow!("directory at {ifd_offset} lacks {name}"));

		let bits = ifd.get_u64s(BITS_PER_SAMPLE).unwrap_or_else(|| vec![1]);
		ensure!(bits.iter().all(|b| *b == 8), "only 8-bit samples are supported, found {bits:?}");
		ensure!(
			ifd.get_u64(PLANAR_CONFIGURATION).unwrap_or(1) == 1,
			"only chunky planar configuration is supported"
		);

		let photometric = u16::try_from(required(PHOTOMETRIC_INTERPRETATION, "PhotometricInterpretation")?)?;
		let ycbcr_subsampling = if photometric == PHOTOMETRIC_YCBCR {
			match ifd.get_u64s(YCBCR_SUBSAMPLING).as_deref() {
				Some([h, v]) => Some([u16::try_from(*h)?, u16::try_from(*v)?]),
				// the TIFF default
				_ => Some([2, 2]),
			}
		} else {
			None
		};

		let level = CogLevel {
			ifd_offset,
			subfile_type: ifd.get_u64(NEW_SUBFILE_TYPE).unwrap_or(0),
			width: u32::try_from(required(IMAGE_WIDTH, "ImageWidth")?)?,
			height: u32::try_from(required(IMAGE_LENGTH, "ImageLength")?)?,
			block_width: u32::try_from(required(TILE_WIDTH, "TileWidth (striped TIFFs are not supported)")?)?,
			block_height: u32::try_from(required(TILE_LENGTH, "TileLength")?)?,
			samples_per_pixel: u16::try_from(ifd.get_u64(SAMPLES_PER_PIXEL).unwrap_or(1))?,
			compression: TiffCompression::from_tag_value(u16::try_from(ifd.get_u64(COMPRESSION).unwrap_or(1))?)?,
			photometric,
			ycbcr_subsampling,
			tile_offsets: ifd.get_u64s(TILE_OFFSETS).unwrap_or_default(),
			tile_byte_counts: ifd.get_u64s(TILE_BYTE_COUNTS).unwrap_or_default(),
		};

		ensure!(level.block_width > 0 && level.block_height > 0, "block size must not be zero");
		ensure!(
			matches!(level.samples_per_pixel, 3 | 4),
			"only RGB and RGBA images are supported, found {} samples",
			level.samples_per_pixel
		);
		let blocks = u64::from(level.blocks_across()) * u64::from(level.blocks_down());
		ensure!(
			level.tile_offsets.len() as u64 == blocks && level.tile_byte_counts.len() as u64 == blocks,
			"directory at {ifd_offset} lists {} offsets and {} byte counts for {blocks} blocks",
			level.tile_offsets.len(),
			level.tile_byte_counts.len()
		);
		Ok(level)
	}

	pub fn blocks_across(&self) -> u32 {
		self.width.div_ceil(self.block_width)
	}

	pub fn blocks_down(&self) -> u32 {
		self.height.div_ceil(self.block_height)
	}

	/// Byte range of the block in column `col` and row `row`.
	pub fn block_range(&self, col: u32, row: u32) -> Result<ByteRange> {
		ensure!(
			col < self.blocks_across() && row < self.blocks_down(),
			"block ({col}, {row}) is outside the {}×{} block grid",
			self.blocks_across(),
			self.blocks_down()
		);
		let index = row as usize * self.blocks_across() as usize + col as usize;
		Ok(ByteRange::new(self.tile_offsets[index], self.tile_byte_counts[index]))
	}

	/// The smallest range covering all blocks of this level.
	pub fn data_range(&self) -> ByteRange {
		let start = self.tile_offsets.iter().min().copied().unwrap_or(0);
		let end = self
			.tile_offsets
			.iter()
			.zip(&self.tile_byte_counts)
			.map(|(offset, count)| offset.saturating_add(*count))
			.max()
			.unwrap_or(start);
		ByteRange::new(start, end - start)
	}
}

#[derive(Debug)]
pub struct CogReader {
	reader: DataReader,
	header: TiffHeader,
	/// In chain order, the full-resolution image first.
	levels: Vec<CogLevel>,
}

impl CogReader {
	pub async fn open(reader: DataReader) -> Result<CogReader> {
		let head = reader.read_range(&ByteRange::new(0, 8)).await?;
		let big_endian = TiffHeader::is_big_endian(head.as_slice())?;
		let magic = &head.as_slice()[2..4];
		let bigtiff = if big_endian {
			BigEndian::read_u16(magic) == 43
		} else {
			LittleEndian::read_u16(magic) == 43
		};
		let head = if bigtiff {
			reader.read_range(&ByteRange::new(0, 16)).await?
		} else {
			head
		};

		let (header, levels) = if big_endian {
			read_chain::<BigEndian>(&reader, head.as_slice()).await
		} else {
			read_chain::<LittleEndian>(&reader, head.as_slice()).await
		}
		.with_context(|| format!("reading TIFF '{}'", reader.get_name()))?;

		Ok(CogReader { reader, header, levels })
	}

	/// Opens a local path or an `http(s)://` URL.
	pub async fn open_location(location: &str) -> Result<CogReader> {
		CogReader::open(open_data_reader(location)?).await
	}

	pub fn get_name(&self) -> &str {
		self.reader.get_name()
	}

	pub fn header(&self) -> &TiffHeader {
		&self.header
	}

	pub fn variant(&self) -> TiffVariant {
		self.header.variant
	}

	pub fn levels(&self) -> &[CogLevel] {
		&self.levels
	}

	fn level(&self, index: usize) -> Result<&CogLevel> {
		self
			.levels
			.get(index)
			.ok_or_else(|| anyhow!("level {index} does not exist, the file has {}", self.levels.len()))
	}

	/// Fetches and decodes one block. The result always has the full block size.
	pub async fn read_block(&self, index: usize, col: u32, row: u32) -> Result<DynamicImage> {
		let level = self.level(index)?;
		let range = level.block_range(col, row)?;
		let blob = self.reader.read_range(&range).await?;
		let (width, height) = (level.block_width, level.block_height);
		let expected = width as usize * height as usize * level.samples_per_pixel as usize;

		let image = match level.compression {
			TiffCompression::None => DynamicImage::from_raw(width, height, blob.into_vec())?,
			TiffCompression::Deflate => {
				let mut data = Vec::with_capacity(expected);
				ZlibDecoder::new(blob.as_slice()).read_to_end(&mut data)?;
				DynamicImage::from_raw(width, height, data)?
			}
			TiffCompression::Jpeg => {
				let image = jpeg::blob2image(&blob)?;
				ensure!(
					image.width() == width && image.height() == height,
					"JPEG block is {}×{} px, expected {width}×{height}",
					image.width(),
					image.height()
				);
				DynamicImage::ImageRgb8(image.into_rgb8())
			}
		};
		ensure!(
			image.as_bytes().len() == expected,
			"block ({col}, {row}) of level {index} decoded to {} bytes, expected {expected}",
			image.as_bytes().len()
		);
		Ok(image)
	}

	/// Stitches all blocks of a level into one image. Only sensible for overviews.
	pub async fn read_level(&self, index: usize) -> Result<DynamicImage> {
		let level = self.level(index)?;
		let fill = if level.samples_per_pixel == 4 {
			TileFill::Transparent
		} else {
			TileFill::black()
		};
		let mut canvas = fill.new_image(
			level.blocks_across() * level.block_width,
			level.blocks_down() * level.block_height,
		);
		for row in 0..level.blocks_down() {
			for col in 0..level.blocks_across() {
				let block = self.read_block(index, col, row).await?;
				canvas.paste(&block, col * level.block_width, row * level.block_height)?;
			}
		}
		Ok(canvas.crop_imm(0, 0, level.width, level.height))
	}
}

async fn read_chain<E: ByteOrder>(reader: &DataReader, head: &[u8]) -> Result<(TiffHeader, Vec<CogLevel>)> {
	let header = TiffHeader::deserialize::<E>(head)?;
	let mut levels = Vec::new();
	let mut visited = HashSet::new();
	let mut offset = header.first_ifd;
	while offset != 0 {
		if !visited.insert(offset) {
			bail!("directory chain loops back to offset {offset}");
		}
		ensure!(levels.len() < MAX_LEVELS, "more than {MAX_LEVELS} directories");
		let (ifd, next) = Ifd::read::<E>(reader, header.variant, offset).await?;
		levels.push(CogLevel::from_ifd(&ifd, offset).with_context(|| format!("directory {}", levels.len()))?);
		offset = next;
	}
	ensure!(!levels.is_empty(), "the file contains no image");
	log::debug!("read {} directories of {}", levels.len(), reader.get_name());
	Ok((header, levels))
}
