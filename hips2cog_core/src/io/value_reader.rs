//! Fixed-width integers read from a byte slice in a chosen byte order.
//!
//! ```rust
//! use hips2cog_core::io::{ValueReader, ValueReaderSlice};
//!
//! let data = &[0x01, 0x02, 0x03, 0x04];
//! assert_eq!(ValueReaderSlice::new_le(data).read_u16().unwrap(), 0x0201);
//! assert_eq!(ValueReaderSlice::new_be(data).read_u16().unwrap(), 0x0102);
//! ```

use anyhow::{Result, bail};
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use std::{
	io::{Cursor, Read},
	marker::PhantomData,
};

pub trait ValueReader<E: ByteOrder> {
	fn get_reader(&mut self) -> &mut dyn Read;

	fn len(&self) -> u64;

	fn position(&self) -> u64;

	fn set_position(&mut self, position: u64) -> Result<()>;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn remaining(&self) -> u64 {
		self.len().saturating_sub(self.position())
	}

	fn read_u8(&mut self) -> Result<u8> {
		Ok(self.get_reader().read_u8()?)
	}

	fn read_u16(&mut self) -> Result<u16> {
		Ok(self.get_reader().read_u16::<E>()?)
	}

	fn read_u32(&mut self) -> Result<u32> {
		Ok(self.get_reader().read_u32::<E>()?)
	}

	fn read_u64(&mut self) -> Result<u64> {
		Ok(self.get_reader().read_u64::<E>()?)
	}

	fn read_vec(&mut self, length: u64) -> Result<Vec<u8>> {
		if length > self.remaining() {
			bail!("cannot read {length} bytes, only {} remaining", self.remaining());
		}
		let mut buffer = vec![0u8; length as usize];
		self.get_reader().read_exact(&mut buffer)?;
		Ok(buffer)
	}
}

pub struct ValueReaderSlice<'a, E: ByteOrder> {
	_phantom: PhantomData<E>,
	cursor: Cursor<&'a [u8]>,
	len: u64,
}

impl<'a, E: ByteOrder> ValueReaderSlice<'a, E> {
	pub fn new(slice: &'a [u8]) -> ValueReaderSlice<'a, E> {
		ValueReaderSlice {
			_phantom: PhantomData,
			len: slice.len() as u64,
			cursor: Cursor::new(slice),
		}
	}
}

impl<'a> ValueReaderSlice<'a, LittleEndian> {
	pub fn new_le(slice: &'a [u8]) -> ValueReaderSlice<'a, LittleEndian> {
		ValueReaderSlice::new(slice)
	}
}

impl<'a> ValueReaderSlice<'a, BigEndian> {
	pub fn new_be(slice: &'a [u8]) -> ValueReaderSlice<'a, BigEndian> {
		ValueReaderSlice::new(slice)
	}
}

impl<E: ByteOrder> ValueReader<E> for ValueReaderSlice<'_, E> {
	fn get_reader(&mut self) -> &mut dyn Read {
		&mut self.cursor
	}

	fn len(&self) -> u64 {
		self.len
	}

	fn position(&self) -> u64 {
		self.cursor.position()
	}

	fn set_position(&mut self, position: u64) -> Result<()> {
		if position > self.len {
			bail!("position {position} is outside of {} bytes", self.len)
		}
		self.cursor.set_position(position);
		Ok(())
	}
}
