use crate::TiffVariant;
use anyhow::{Result, bail, ensure};
use byteorder::ByteOrder;
use hips2cog_core::{
	Blob,
	io::{ValueReader, ValueReaderSlice, ValueWriter, ValueWriterBlob},
};

/// The first bytes of a TIFF: byte order, magic number and the offset of the first directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TiffHeader {
	pub variant: TiffVariant,
	pub big_endian: bool,
	pub first_ifd: u64,
}

impl TiffHeader {
	/// Byte order of `head`, which needs at least two bytes.
	pub fn is_big_endian(head: &[u8]) -> Result<bool> {
		Ok(match head.get(0..2) {
			Some(b"II") => false,
			Some(b"MM") => true,
			_ => bail!("not a TIFF file: unknown byte order mark"),
		})
	}

	/// Writes a little-endian header.
	pub fn serialize(&self) -> Result<Blob> {
		ensure!(!self.big_endian, "only little-endian output is supported");
		let mut writer = ValueWriterBlob::new_le();
		writer.write_slice(b"II")?;
		match self.variant {
			TiffVariant::Classic => {
				writer.write_u16(42)?;
				writer.write_u32(u32::try_from(self.first_ifd)?)?;
			}
			TiffVariant::BigTiff => {
				writer.write_u16(43)?;
				writer.write_u16(8)?; // bytes per offset
				writer.write_u16(0)?;
				writer.write_u64(self.first_ifd)?;
			}
		}
		Ok(writer.into_blob())
	}

	/// Parses the first 8 (classic) or 16 (BigTIFF) bytes of a file in byte order `E`.
	pub fn deserialize<E: ByteOrder>(head: &[u8]) -> Result<TiffHeader> {
		let big_endian = Self::is_big_endian(head)?;
		let mut reader = ValueReaderSlice::<E>::new(head);
		reader.set_position(2)?;
		let (variant, first_ifd) = match reader.read_u16()? {
			42 => (TiffVariant::Classic, u64::from(reader.read_u32()?)),
			43 => {
				ensure!(reader.read_u16()? == 8, "BigTIFF offsets must be 8 bytes wide");
				ensure!(reader.read_u16()? == 0, "invalid BigTIFF header");
				(TiffVariant::BigTiff, reader.read_u64()?)
			}
			magic => bail!("not a TIFF file: magic number {magic}"),
		};
		Ok(TiffHeader {
			variant,
			big_endian,
			first_ifd,
		})
	}
}
