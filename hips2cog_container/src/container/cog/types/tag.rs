//! TIFF tags and field values used by tiled RGB(A) images.

use crate::TiffVariant;
use anyhow::{Result, bail};
use byteorder::ByteOrder;
use hips2cog_core::io::{ValueReader, ValueReaderSlice, ValueWriter, ValueWriterBlob};

pub const NEW_SUBFILE_TYPE: u16 = 254;
pub const IMAGE_WIDTH: u16 = 256;
pub const IMAGE_LENGTH: u16 = 257;
pub const BITS_PER_SAMPLE: u16 = 258;
pub const COMPRESSION: u16 = 259;
pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;
pub const SAMPLES_PER_PIXEL: u16 = 277;
pub const PLANAR_CONFIGURATION: u16 = 284;
pub const SOFTWARE: u16 = 305;
pub const TILE_WIDTH: u16 = 322;
pub const TILE_LENGTH: u16 = 323;
pub const TILE_OFFSETS: u16 = 324;
pub const TILE_BYTE_COUNTS: u16 = 325;
pub const EXTRA_SAMPLES: u16 = 338;
pub const SAMPLE_FORMAT: u16 = 339;
pub const YCBCR_SUBSAMPLING: u16 = 530;

pub const PHOTOMETRIC_RGB: u16 = 2;
pub const PHOTOMETRIC_YCBCR: u16 = 6;
pub const EXTRA_SAMPLE_UNASSOCIATED_ALPHA: u16 = 2;

const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_LONG8: u16 = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagValue {
	Ascii(String),
	Short(Vec<u16>),
	Long(Vec<u32>),
	Long8(Vec<u64>),
}

impl TagValue {
	/// Offsets or byte counts in the width of `variant`.
	pub fn offsets(values: &[u64], variant: TiffVariant) -> Result<TagValue> {
		Ok(match variant {
			TiffVariant::BigTiff => TagValue::Long8(values.to_vec()),
			TiffVariant::Classic => TagValue::Long(
				values
					.iter()
					.map(|v| u32::try_from(*v))
					.collect::<Result<_, _>>()
					.map_err(|_| anyhow::anyhow!("offset does not fit into a classic TIFF"))?,
			),
		})
	}

	pub fn field_type(&self) -> u16 {
		match self {
			TagValue::Ascii(_) => TYPE_ASCII,
			TagValue::Short(_) => TYPE_SHORT,
			TagValue::Long(_) => TYPE_LONG,
			TagValue::Long8(_) => TYPE_LONG8,
		}
	}

	/// Number of values; ASCII counts the terminating NUL.
	pub fn count(&self) -> u64 {
		(match self {
			TagValue::Ascii(s) => s.len() + 1,
			TagValue::Short(v) => v.len(),
			TagValue::Long(v) => v.len(),
			TagValue::Long8(v) => v.len(),
		}) as u64
	}

	pub fn byte_len(&self) -> u64 {
		self.count() * value_size(self.field_type()).unwrap_or(1)
	}

	/// All values widened to `u64`; `None` for ASCII.
	pub fn as_u64s(&self) -> Option<Vec<u64>> {
		match self {
			TagValue::Ascii(_) => None,
			TagValue::Short(v) => Some(v.iter().map(|x| u64::from(*x)).collect()),
			TagValue::Long(v) => Some(v.iter().map(|x| u64::from(*x)).collect()),
			TagValue::Long8(v) => Some(v.clone()),
		}
	}

	pub fn write<E: ByteOrder>(&self, writer: &mut ValueWriterBlob<E>) -> Result<()> {
		match self {
			TagValue::Ascii(s) => {
				writer.write_slice(s.as_bytes())?;
				writer.write_u8(0)?;
			}
			TagValue::Short(v) => v.iter().try_for_each(|x| writer.write_u16(*x))?,
			TagValue::Long(v) => v.iter().try_for_each(|x| writer.write_u32(*x))?,
			TagValue::Long8(v) => v.iter().try_for_each(|x| writer.write_u64(*x))?,
		}
		Ok(())
	}

	/// Parses `count` values of `field_type`. Returns `None` for types this reader ignores.
	pub fn read<E: ByteOrder>(field_type: u16, count: u64, data: &[u8]) -> Result<Option<TagValue>> {
		let Some(size) = value_size(field_type) else {
			return Ok(None);
		};
		let Some(needed) = count.checked_mul(size) else {
			bail!("field of type {field_type} with {count} values is too large");
		};
		if (data.len() as u64) < needed {
			bail!("field of type {field_type} needs {needed} bytes, got {}", data.len());
		}
		let mut reader = ValueReaderSlice::<E>::new(data);
		Ok(Some(match field_type {
			TYPE_BYTE => TagValue::Short(reader.read_vec(count)?.into_iter().map(u16::from).collect()),
			TYPE_ASCII => {
				let bytes = reader.read_vec(count)?;
				let text = bytes.split(|b| *b == 0).next().unwrap_or_default();
				TagValue::Ascii(String::from_utf8_lossy(text).into_owned())
			}
			TYPE_SHORT => TagValue::Short((0..count).map(|_| reader.read_u16()).collect::<Result<_>>()?),
			TYPE_LONG => TagValue::Long((0..count).map(|_| reader.read_u32()).collect::<Result<_>>()?),
			_ => TagValue::Long8((0..count).map(|_| reader.read_u64()).collect::<Result<_>>()?),
		}))
	}
}

/// Bytes per value of a field type, `None` for types not used here.
pub fn value_size(field_type: u16) -> Option<u64> {
	match field_type {
		TYPE_BYTE | TYPE_ASCII => Some(1),
		TYPE_SHORT => Some(2),
		TYPE_LONG => Some(4),
		TYPE_LONG8 => Some(8),
		_ => None,
	}
}
