//! Image file directories.
//!
//! A directory is a sorted table of fixed-size entries followed by the values that do not fit
//! into an entry's value field. Serialized directories start on an 8-byte boundary and keep their
//! out-of-line values word aligned, so their length only depends on the entry counts. That lets
//! the writer place all directories before any offset inside them is known.

use super::tag::{TagValue, value_size};
use crate::TiffVariant;
use anyhow::{Result, anyhow, bail, ensure};
use byteorder::{ByteOrder, LittleEndian};
use hips2cog_core::{
	Blob, ByteRange,
	io::{DataReader, ValueReader, ValueReaderSlice, ValueWriter, ValueWriterBlob},
};
use std::collections::BTreeMap;

pub const IFD_ALIGNMENT: u64 = 8;

impl TiffVariant {
	/// Bytes of the file header.
	pub fn header_len(&self) -> u64 {
		match self {
			TiffVariant::Classic => 8,
			TiffVariant::BigTiff => 16,
		}
	}

	/// Bytes of the value field inside an entry.
	fn field_len(&self) -> u64 {
		match self {
			TiffVariant::Classic => 4,
			TiffVariant::BigTiff => 8,
		}
	}

	fn entry_len(&self) -> u64 {
		match self {
			TiffVariant::Classic => 12,
			TiffVariant::BigTiff => 20,
		}
	}

	/// Bytes of the entry count.
	fn count_len(&self) -> u64 {
		match self {
			TiffVariant::Classic => 2,
			TiffVariant::BigTiff => 8,
		}
	}

	/// Largest file a variant can address.
	pub fn max_file_size(&self) -> u64 {
		match self {
			TiffVariant::Classic => u64::from(u32::MAX),
			TiffVariant::BigTiff => u64::MAX,
		}
	}
}

fn align_up(value: u64, alignment: u64) -> u64 {
	value.div_ceil(alignment) * alignment
}

fn read_word<E: ByteOrder>(reader: &mut ValueReaderSlice<'_, E>, variant: TiffVariant) -> Result<u64> {
	Ok(match variant {
		TiffVariant::Classic => u64::from(reader.read_u32()?),
		TiffVariant::BigTiff => reader.read_u64()?,
	})
}

fn write_word<E: ByteOrder>(writer: &mut ValueWriterBlob<E>, variant: TiffVariant, value: u64) -> Result<()> {
	match variant {
		TiffVariant::Classic => writer.write_u32(u32::try_from(value)?),
		TiffVariant::BigTiff => writer.write_u64(value),
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ifd {
	entries: BTreeMap<u16, TagValue>,
}

impl Ifd {
	pub fn new() -> Ifd {
		Ifd::default()
	}

	pub fn set(&mut self, tag: u16, value: TagValue) {
		self.entries.insert(tag, value);
	}

	pub fn get(&self, tag: u16) -> Option<&TagValue> {
		self.entries.get(&tag)
	}

	pub fn get_u64s(&self, tag: u16) -> Option<Vec<u64>> {
		self.get(tag).and_then(TagValue::as_u64s)
	}

	/// First value of a numeric tag.
	pub fn get_u64(&self, tag: u16) -> Option<u64> {
		self.get_u64s(tag).and_then(|v| v.first().copied())
	}

	/// Bytes of count, entries and next pointer.
	fn table_len(&self, variant: TiffVariant) -> u64 {
		variant.count_len() + self.entries.len() as u64 * variant.entry_len() + variant.field_len()
	}

	/// Offsets (relative to the directory start) of the values stored out of line.
	fn overflow_positions(&self, variant: TiffVariant) -> (Vec<Option<u64>>, u64) {
		let mut cursor = self.table_len(variant);
		let positions = self
			.entries
			.values()
			.map(|value| {
				if value.byte_len() <= variant.field_len() {
					return None;
				}
				cursor = align_up(cursor, 2);
				let position = cursor;
				cursor += value.byte_len();
				Some(position)
			})
			.collect();
		(positions, cursor)
	}

	/// Serialized length, independent of the values of offsets.
	pub fn byte_len(&self, variant: TiffVariant) -> u64 {
		self.overflow_positions(variant).1
	}

	/// Serializes the directory (little endian) as it will sit at `offset`, pointing to `next`.
	pub fn serialize(&self, variant: TiffVariant, offset: u64, next: u64) -> Result<Blob> {
		ensure!(offset % IFD_ALIGNMENT == 0, "directory offset {offset} is not aligned");
		let (positions, total) = self.overflow_positions(variant);

		let mut writer = ValueWriterBlob::new_le();
		match variant {
			TiffVariant::Classic => writer.write_u16(u16::try_from(self.entries.len())?)?,
			TiffVariant::BigTiff => writer.write_u64(self.entries.len() as u64)?,
		}
		for ((tag, value), position) in self.entries.iter().zip(&positions) {
			if variant == TiffVariant::Classic && matches!(value, TagValue::Long8(_)) {
				bail!("tag {tag} uses LONG8, which classic TIFF does not support");
			}
			writer.write_u16(*tag)?;
			writer.write_u16(value.field_type())?;
			write_word(&mut writer, variant, value.count())?;
			match position {
				Some(position) => write_word(&mut writer, variant, offset + position)?,
				None => {
					let mut field = ValueWriterBlob::<LittleEndian>::new();
					value.write(&mut field)?;
					let mut field = field.into_blob().into_vec();
					field.resize(variant.field_len() as usize, 0);
					writer.write_slice(&field)?;
				}
			}
		}
		write_word(&mut writer, variant, next)?;

		for (value, position) in self.entries.values().zip(&positions) {
			if let Some(position) = position {
				while writer.position()? < *position {
					writer.write_u8(0)?;
				}
				value.write(&mut writer)?;
			}
		}

		let blob = writer.into_blob();
		ensure!(blob.len() == total, "directory serialized to {} bytes, expected {total}", blob.len());
		Ok(blob)
	}

	/// Reads the directory at `offset` and returns it with the offset of the next one.
	pub async fn read<E: ByteOrder>(reader: &DataReader, variant: TiffVariant, offset: u64) -> Result<(Ifd, u64)> {
		let count_len = variant.count_len();
		let head = reader.read_range(&ByteRange::new(offset, count_len)).await?;
		let mut head = ValueReaderSlice::<E>::new(head.as_slice());
		let count = match variant {
			TiffVariant::Classic => u64::from(head.read_u16()?),
			TiffVariant::BigTiff => head.read_u64()?,
		};
		ensure!(count > 0 && count < 4096, "directory at {offset} has {count} entries");

		let table_len = count * variant.entry_len() + variant.field_len();
		let table_offset = offset
			.checked_add(count_len)
			.ok_or_else(|| anyhow!("directory offset {offset} is out of range"))?;
		let table = reader.read_range(&ByteRange::new(table_offset, table_len)).await?;
		let mut table = ValueReaderSlice::<E>::new(table.as_slice());

		let mut ifd = Ifd::new();
		for _ in 0..count {
			let tag = table.read_u16()?;
			let field_type = table.read_u16()?;
			let value_count = read_word(&mut table, variant)?;
			let field = table.read_vec(variant.field_len())?;
			let Some(size) = value_size(field_type) else {
				log::trace!("skipping tag {tag} of type {field_type}");
				continue;
			};
			let byte_len = size
				.checked_mul(value_count)
				.ok_or_else(|| anyhow!("tag {tag} declares {value_count} values"))?;
			let value = if byte_len <= variant.field_len() {
				TagValue::read::<E>(field_type, value_count, &field)?
			} else {
				let position = read_word(&mut ValueReaderSlice::<E>::new(&field), variant)?;
				let range = ByteRange::new(position, byte_len);
				let size = reader.get_size();
				ensure!(
					size == 0 || range.end() <= size,
					"tag {tag} points to {range}, beyond the end of the file at {size}"
				);
				let data = reader.read_range(&range).await?;
				TagValue::read::<E>(field_type, value_count, data.as_slice())?
			};
			if let Some(value) = value {
				ifd.set(tag, value);
			}
		}
		let next = read_word(&mut table, variant)?;
		Ok((ifd, next))
	}
}

#[cfg(test)]
mod tests {
	use super::super::tag::*;
	use super::*;
	use hips2cog_core::io::DataReaderBlob;
	use rstest::rstest;

	fn sample() -> Ifd {
		let mut ifd = Ifd::new();
		ifd.set(IMAGE_LENGTH, TagValue::Long(vec![12]));
		ifd.set(IMAGE_WIDTH, TagValue::Long(vec![16]));
		ifd.set(BITS_PER_SAMPLE, TagValue::Short(vec![8, 8, 8, 8]));
		ifd.set(SOFTWARE, TagValue::Ascii(String::from("hips2cog")));
		ifd
	}

	#[test]
	fn entries_are_sorted() {
		let tags: Vec<u16> = sample().entries.keys().copied().collect();
		assert_eq!(tags, vec![IMAGE_WIDTH, IMAGE_LENGTH, BITS_PER_SAMPLE, SOFTWARE]);
	}

	#[rstest]
	// 2 + 4·12 + 4 = 54, then 8 bytes of bits per sample and 9 of software
	#[case(TiffVariant::Classic, 54 + 8 + 9)]
	// 8 + 4·20 + 8 = 96, bits per sample fits inline, 9 bytes of software
	#[case(TiffVariant::BigTiff, 96 + 9)]
	fn byte_len(#[case] variant: TiffVariant, #[case] expected: u64) -> Result<()> {
		let ifd = sample();
		assert_eq!(ifd.byte_len(variant), expected);
		assert_eq!(ifd.serialize(variant, 64, 0)?.len(), expected);
		Ok(())
	}

	#[test]
	fn classic_layout() -> Result<()> {
		let mut ifd = Ifd::new();
		ifd.set(COMPRESSION, TagValue::Short(vec![8]));
		ifd.set(TILE_OFFSETS, TagValue::Long(vec![100, 200]));
		let blob = ifd.serialize(TiffVariant::Classic, 8, 0)?;
		#[rustfmt::skip]
		let expected = [
			2, 0, // entry count
			3, 1, 3, 0, 1, 0, 0, 0, 8, 0, 0, 0, // compression, inline short
			68, 1, 4, 0, 2, 0, 0, 0, 38, 0, 0, 0, // tile offsets, at 8 + 30
			0, 0, 0, 0, // next
			100, 0, 0, 0, 200, 0, 0, 0,
		];
		assert_eq!(blob.as_slice(), &expected);
		Ok(())
	}

	#[test]
	fn classic_rejects_long8() {
		let mut ifd = Ifd::new();
		ifd.set(TILE_OFFSETS, TagValue::Long8(vec![1]));
		assert!(ifd.serialize(TiffVariant::Classic, 8, 0).is_err());
		assert!(ifd.serialize(TiffVariant::Classic, 10, 0).is_err());
	}

	#[rstest]
	#[case(TiffVariant::Classic)]
	#[case(TiffVariant::BigTiff)]
	#[tokio::test]
	async fn read_back(#[case] variant: TiffVariant) -> Result<()> {
		let mut ifd = sample();
		ifd.set(TILE_OFFSETS, TagValue::offsets(&[1000, 2000, 3000], variant)?);
		let offset = 16;
		let mut data = vec![0u8; offset as usize];
		data.extend_from_slice(ifd.serialize(variant, offset, 4242)?.as_slice());
		let reader: DataReader = Box::new(DataReaderBlob::from(Blob::from(data)));

		let (read, next) = Ifd::read::<LittleEndian>(&reader, variant, offset).await?;
		assert_eq!(next, 4242);
		assert_eq!(read, ifd);
		assert_eq!(read.get_u64s(TILE_OFFSETS), Some(vec![1000, 2000, 3000]));
		assert_eq!(read.get_u64(IMAGE_WIDTH), Some(16));
		Ok(())
	}
}
